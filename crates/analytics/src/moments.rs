//! Numeric kernels over a slice of percentage returns.
//!
//! Undefined results (too few observations) come back as `f64::NAN` instead of
//! an error. Callers decide how to display them.

/// Sums whose magnitude falls below this are treated as floating point noise.
const FP_NOISE: f64 = 1e-14;

fn zero_out_noise(x: f64) -> f64 {
    if x.abs() < FP_NOISE { 0.0 } else { x }
}

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; the average of the two middle values when the length is even.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
}

/// Sum of `(v - mean)^power` over the slice.
fn central_sum(values: &[f64], mean: f64, power: i32) -> f64 {
    values.iter().map(|v| (v - mean).powi(power)).sum()
}

/// Population standard deviation (divisor `n`, not `n - 1`).
pub fn population_std(values: &[f64]) -> f64 {
    let m = mean(values);
    (central_sum(values, m, 2) / values.len() as f64).sqrt()
}

/// Sample standard deviation (divisor `n - 1`). NaN below two observations.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    (central_sum(values, m, 2) / (values.len() - 1) as f64).sqrt()
}

/// Bias-corrected sample skewness (adjusted Fisher-Pearson coefficient).
///
/// `G1 = n * sqrt(n - 1) / (n - 2) * M3 / M2^1.5` with `M2`, `M3` the sums of
/// squared and cubed deviations. NaN below three observations, 0 for a flat
/// series.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return f64::NAN;
    }
    let m = mean(values);
    let m2 = zero_out_noise(central_sum(values, m, 2));
    let m3 = zero_out_noise(central_sum(values, m, 3));
    if m2 == 0.0 {
        return 0.0;
    }
    (n * (n - 1.0).sqrt() / (n - 2.0)) * (m3 / m2.powf(1.5))
}

/// Bias-corrected excess kurtosis (Fisher definition, normal = 0).
///
/// NaN below four observations, 0 for a flat series.
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 4 {
        return f64::NAN;
    }
    let m = mean(values);
    let m2 = central_sum(values, m, 2);
    let m4 = central_sum(values, m, 4);

    let adj = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    let numerator = zero_out_noise(n * (n + 1.0) * (n - 1.0) * m4);
    let denominator = zero_out_noise((n - 2.0) * (n - 3.0) * m2.powi(2));
    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator - adj
}

/// The running compounded return after each period, in percent.
///
/// `c_i = ((1 + c_{i-1}/100) * (1 + v_i/100) - 1) * 100`, starting from `c_0 = 0`.
pub fn cumulative_path(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0_f64, |cumulative, v| {
            *cumulative = ((1.0 + *cumulative / 100.0) * (1.0 + v / 100.0) - 1.0) * 100.0;
            Some(*cumulative)
        })
        .collect()
}

/// Total compounded return over the whole slice, in percent. 0 when empty.
pub fn cumulative_return(values: &[f64]) -> f64 {
    cumulative_path(values).last().copied().unwrap_or(0.0)
}

/// Largest fall, in percentage points, from a running peak of `path` to any
/// later point. Never negative.
pub fn max_drawdown(path: &[f64]) -> f64 {
    let mut max_drawdown = 0.0_f64;
    let Some(&first) = path.first() else {
        return max_drawdown;
    };

    let mut peak = first;
    for &point in path {
        if point > peak {
            peak = point;
        }
        max_drawdown = max_drawdown.max(peak - point);
    }
    max_drawdown
}

/// Annualised Sharpe ratio of periodic percentage returns.
///
/// `(mean * periods - risk_free_rate) / (sample_std * sqrt(periods))`. A series
/// without dispersion (or with a single observation) scores 0.
pub fn sharpe_ratio(values: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let deviation = sample_std(values);
    if deviation.is_nan() || deviation <= 0.0 {
        return 0.0;
    }
    (mean(values) * periods_per_year - risk_free_rate) / (deviation * periods_per_year.sqrt())
}

/// Pearson correlation of paired observations. 0 when either side is flat
/// or there are no pairs.
pub fn pearson_correlation(pairs: &[(f64, f64)]) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut numerator, mut denom_x, mut denom_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        numerator += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }

    let denominator = (denom_x * denom_y).sqrt();
    if denominator == 0.0 { 0.0 } else { numerator / denominator }
}
