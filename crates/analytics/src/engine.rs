use crate::error::AnalyticsError;
use crate::moments;
use crate::report::{CorrelationMatrix, InstrumentReport, ProcessingResult, StatisticsSummary};
use chrono::{DateTime, Utc};
use core_types::{CoreError, DateRange, PortfolioRequest, ReturnRecord, parse_series};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Annual risk-free rate used for the Sharpe ratio unless configured otherwise.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Return series are monthly.
const PERIODS_PER_YEAR: f64 = 12.0;

/// One instrument's chronological `(date, value)` points after windowing.
type Points = Vec<(DateTime<Utc>, f64)>;

/// A stateless calculator that turns per-ISIN return series into statistics.
///
/// Two knobs: whether a malformed instrument fails the whole request
/// (the default) or is reported under `failures` while the rest succeed, and
/// the annual risk-free rate the Sharpe ratio is measured against.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsEngine {
    isolate_failures: bool,
    risk_free_rate: f64,
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self {
            isolate_failures: false,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

impl StatisticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_isolation(mut self, isolate_failures: bool) -> Self {
        self.isolate_failures = isolate_failures;
        self
    }

    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    /// The main entry point: computes every instrument of a validated request.
    ///
    /// # Returns
    ///
    /// A `ProcessingResult` listing every ISIN in request order, a report for
    /// each ISIN that had data, the pairwise correlations of those ISINs, and
    /// the weights passed through unchanged. Any malformed instrument aborts
    /// the call with an `AnalyticsError` unless failure isolation is enabled.
    pub fn process(&self, request: &PortfolioRequest) -> Result<ProcessingResult, AnalyticsError> {
        let isins: Vec<String> = request.records_by_isin.keys().cloned().collect();
        let mut results = IndexMap::with_capacity(isins.len());
        let mut series: IndexMap<&str, Points> = IndexMap::with_capacity(isins.len());
        let mut failures = IndexMap::new();

        for (isin, raw) in &request.records_by_isin {
            let computed = parse_series(isin, raw)
                .map_err(AnalyticsError::from)
                .and_then(|records| self.compute(isin, records, request.date_range.as_ref()));

            match computed {
                Ok(Some((report, points))) => {
                    results.insert(isin.clone(), report);
                    series.insert(isin.as_str(), points);
                }
                Ok(None) => {
                    tracing::debug!(isin = %isin, "Skipping instrument without records.");
                }
                Err(e) if self.isolate_failures => {
                    tracing::warn!(isin = %isin, error = %e, "Instrument failed; continuing with the rest.");
                    failures.insert(isin.clone(), e.to_string());
                }
                Err(e) => {
                    tracing::error!(isin = %isin, error = %e, "Instrument failed; aborting request.");
                    return Err(e);
                }
            }
        }

        let correlations = correlation_matrix(&series);

        tracing::info!(
            instruments = isins.len(),
            computed = results.len(),
            failed = failures.len(),
            "Processed portfolio request."
        );

        Ok(ProcessingResult {
            isins,
            results,
            correlations,
            weights: request.weights.clone(),
            failures,
        })
    }

    /// Sorts one instrument's records chronologically and computes its statistics.
    ///
    /// Returns `Ok(None)` when there is nothing to compute, either because the
    /// series is empty or because no record falls inside `window`. Every record
    /// must carry a parseable date and a numeric value, including the ones the
    /// window later drops.
    pub fn summarize(
        &self,
        isin: &str,
        records: Vec<ReturnRecord>,
        window: Option<&DateRange>,
    ) -> Result<Option<InstrumentReport>, AnalyticsError> {
        Ok(self.compute(isin, records, window)?.map(|(report, _)| report))
    }

    fn compute(
        &self,
        isin: &str,
        records: Vec<ReturnRecord>,
        window: Option<&DateRange>,
    ) -> Result<Option<(InstrumentReport, Points)>, AnalyticsError> {
        if records.is_empty() {
            return Ok(None);
        }

        let mut dated = records
            .into_iter()
            .map(|record| {
                let ts = record.timestamp(isin)?;
                let value = record.value(isin)?;
                Ok((ts, value, record))
            })
            .collect::<Result<Vec<(DateTime<Utc>, f64, ReturnRecord)>, CoreError>>()?;

        // `sort_by_key` is stable: records sharing a date keep their input order.
        dated.sort_by_key(|(ts, _, _)| *ts);

        if let Some(range) = window {
            dated.retain(|(ts, _, _)| range.contains(ts));
            if dated.is_empty() {
                tracing::debug!(isin = %isin, "No records inside the requested date range.");
                return Ok(None);
            }
        }

        let points: Points = dated.iter().map(|(ts, value, _)| (*ts, *value)).collect();
        let values: Vec<f64> = points.iter().map(|(_, value)| *value).collect();
        let stats = self.calculate_statistics(&values);
        let data = dated.into_iter().map(|(_, _, record)| record).collect();

        Ok(Some((InstrumentReport { stats, data }, points)))
    }

    /// Computes the summary of a chronologically ordered, non-empty series.
    pub fn calculate_statistics(&self, values: &[f64]) -> StatisticsSummary {
        let path = moments::cumulative_path(values);

        StatisticsSummary {
            cumulative_return: moments::cumulative_return(values),
            volatility: moments::population_std(values),
            mean: moments::mean(values),
            median: moments::median(values),
            min: moments::min(values),
            max: moments::max(values),
            skewness: moments::skewness(values),
            kurtosis: moments::excess_kurtosis(values),
            max_drawdown: moments::max_drawdown(&path),
            sharpe_ratio: moments::sharpe_ratio(values, self.risk_free_rate, PERIODS_PER_YEAR),
        }
    }
}

/// Pairwise Pearson correlation of every computed instrument, diagonal included.
fn correlation_matrix(series: &IndexMap<&str, Points>) -> CorrelationMatrix {
    series
        .iter()
        .map(|(isin, points)| {
            let row = series
                .iter()
                .map(|(other, other_points)| (other.to_string(), correlate(points, other_points)))
                .collect();
            (isin.to_string(), row)
        })
        .collect()
}

/// Pairs the two series on identical timestamps and correlates the pairs.
///
/// When `left` repeats a timestamp its last value is used. Fewer than two
/// shared observations correlate as 0.
fn correlate(left: &[(DateTime<Utc>, f64)], right: &[(DateTime<Utc>, f64)]) -> f64 {
    let by_date: HashMap<DateTime<Utc>, f64> = left.iter().copied().collect();
    let pairs: Vec<(f64, f64)> = right
        .iter()
        .filter_map(|(ts, y)| by_date.get(ts).map(|x| (*x, *y)))
        .collect();

    if pairs.len() < 2 { 0.0 } else { moments::pearson_correlation(&pairs) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::{Value, json};

    fn request(body: Value) -> PortfolioRequest {
        PortfolioRequest::from_value(body).unwrap()
    }

    fn rec(date: &str, value: f64) -> Value {
        json!({"date": date, "valueNumerico": value, "value": format!("{value:.2}%")})
    }

    #[test]
    fn sorts_records_and_compounds_in_date_order() {
        let req = request(json!({"registrosPorISIN": {
            "ES01": [rec("2024-03-31", 3.0), rec("2024-01-31", 2.0), rec("2024-02-29", -1.5)]
        }}));
        let result = StatisticsEngine::new().process(&req).unwrap();
        let report = &result.results["ES01"];

        let dates: Vec<&str> = report
            .data
            .iter()
            .map(|r| r.fields()["date"].as_str().unwrap())
            .collect();
        assert_eq!(dates, ["2024-01-31", "2024-02-29", "2024-03-31"]);
        assert_relative_eq!(report.stats.cumulative_return, 3.4841, epsilon = 1e-12);
        assert_relative_eq!(report.stats.max_drawdown, 1.53, epsilon = 1e-12);
    }

    #[test]
    fn permutations_give_identical_output() {
        let records = [
            rec("2024-01-31", 1.2),
            rec("2024-02-29", -0.4),
            rec("2024-03-31", 2.5),
            rec("2024-04-30", -3.1),
            rec("2024-05-31", 0.9),
        ];
        let forward = request(json!({"registrosPorISIN": {"X": records.to_vec()}}));
        let mut reversed_records = records.to_vec();
        reversed_records.reverse();
        let reversed = request(json!({"registrosPorISIN": {"X": reversed_records}}));

        let engine = StatisticsEngine::new();
        let a = serde_json::to_string(&engine.process(&forward).unwrap()).unwrap();
        let b = serde_json::to_string(&engine.process(&reversed).unwrap()).unwrap();
        let again = serde_json::to_string(&engine.process(&forward).unwrap()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, again);
    }

    #[test]
    fn equal_dates_keep_input_order() {
        let req = request(json!({"registrosPorISIN": {"X": [
            {"date": "2024-02-01", "valueNumerico": 1.0, "tag": "late"},
            {"date": "2024-01-01", "valueNumerico": 2.0, "tag": "first"},
            {"date": "2024-01-01T00:00:00Z", "valueNumerico": 3.0, "tag": "second"}
        ]}}));
        let result = StatisticsEngine::new().process(&req).unwrap();
        let report = &result.results["X"];
        let tags: Vec<&str> = report.data.iter().map(|r| r.fields()["tag"].as_str().unwrap()).collect();
        assert_eq!(tags, ["first", "second", "late"]);
    }

    #[test]
    fn population_volatility_and_descriptives() {
        let req = request(json!({"registrosPorISIN": {"X": [
            rec("2024-01-01", 1.0), rec("2024-01-02", 2.0), rec("2024-01-03", 3.0), rec("2024-01-04", 4.0)
        ]}}));
        let stats = StatisticsEngine::new().process(&req).unwrap().results["X"].stats;
        assert_relative_eq!(stats.volatility, 1.118033988749895, epsilon = 1e-12);
        assert_relative_eq!(stats.mean, 2.5);
        assert_relative_eq!(stats.median, 2.5);
        assert_relative_eq!(stats.min, 1.0);
        assert_relative_eq!(stats.max, 4.0);
        assert_relative_eq!(stats.kurtosis, -1.2, epsilon = 1e-9);
        assert_relative_eq!(stats.sharpe_ratio, 6.70373179654437, epsilon = 1e-9);
    }

    #[test]
    fn risk_free_rate_is_configurable() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let zero = StatisticsEngine::new().with_risk_free_rate(0.0).calculate_statistics(&values);
        let custom = StatisticsEngine::new().with_risk_free_rate(6.0).calculate_statistics(&values);

        let scale = (5.0_f64 / 3.0).sqrt() * 12.0_f64.sqrt();
        assert_relative_eq!(zero.sharpe_ratio, 30.0 / scale, epsilon = 1e-12);
        assert_relative_eq!(custom.sharpe_ratio, 24.0 / scale, epsilon = 1e-12);
    }

    #[test]
    fn flat_and_single_point_series_have_zero_sharpe() {
        let engine = StatisticsEngine::new();
        assert_eq!(engine.calculate_statistics(&[0.5; 4]).sharpe_ratio, 0.0);
        assert_eq!(engine.calculate_statistics(&[2.0]).sharpe_ratio, 0.0);
    }

    #[test]
    fn correlations_pair_series_on_shared_dates() {
        let req = request(json!({"registrosPorISIN": {
            "A": [rec("2024-01-31", 1.0), rec("2024-02-29", 2.0), rec("2024-03-31", 3.0), rec("2024-04-30", 9.0)],
            "B": [rec("2024-03-31", 1.0), rec("2024-01-31", 3.0), rec("2024-02-29", 2.0)],
            "FLAT": [rec("2024-01-31", 1.0), rec("2024-02-29", 1.0)],
            "LONE": [rec("2020-01-31", 4.0)],
            "EMPTY": []
        }}));
        let result = StatisticsEngine::new().process(&req).unwrap();
        let corr = &result.correlations;

        assert_eq!(corr.keys().collect::<Vec<_>>(), ["A", "B", "FLAT", "LONE"]);
        assert_relative_eq!(corr["A"]["A"], 1.0, epsilon = 1e-12);
        assert_relative_eq!(corr["A"]["B"], -1.0, epsilon = 1e-12);
        assert_relative_eq!(corr["B"]["A"], -1.0, epsilon = 1e-12);
        assert_eq!(corr["A"]["FLAT"], 0.0);
        assert_eq!(corr["FLAT"]["FLAT"], 0.0);
        assert_eq!(corr["A"]["LONE"], 0.0);
        assert_eq!(corr["LONE"]["LONE"], 0.0);
    }

    #[test]
    fn correlations_respect_the_date_range() {
        let req = request(json!({
            "registrosPorISIN": {
                "A": [rec("2024-01-31", 1.0), rec("2024-02-29", 2.0), rec("2024-03-31", 3.0), rec("2024-04-30", 4.0)],
                "B": [rec("2024-01-31", 50.0), rec("2024-02-29", 2.0), rec("2024-03-31", 4.0), rec("2024-04-30", 6.0)]
            },
            "dateRange": {"start": "2024-02-01"}
        }));
        let result = StatisticsEngine::new().process(&req).unwrap();
        assert_relative_eq!(result.correlations["A"]["B"], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_series_are_listed_but_not_computed() {
        let req = request(json!({"registrosPorISIN": {
            "EMPTY": [],
            "FULL": [rec("2024-01-01", 1.0)],
            "NULL": null
        }}));
        let result = StatisticsEngine::new().process(&req).unwrap();
        assert_eq!(result.isins, ["EMPTY", "FULL", "NULL"]);
        assert_eq!(result.results.keys().collect::<Vec<_>>(), ["FULL"]);
    }

    #[test]
    fn weights_pass_through_untouched() {
        let req = request(json!({
            "registrosPorISIN": {"A": [rec("2024-01-01", 1.0)]},
            "pesosCartera": {"A": 0.6, "NOT_IN_DATA": 0.4}
        }));
        let result = StatisticsEngine::new().process(&req).unwrap();
        assert_eq!(result.weights, json!({"A": 0.6, "NOT_IN_DATA": 0.4}));

        let listed = request(json!({"registrosPorISIN": {"A": []}, "pesosCartera": [0.6, 0.4]}));
        let result = StatisticsEngine::new().process(&listed).unwrap();
        assert_eq!(serde_json::to_value(&result).unwrap()["weights"], json!([0.6, 0.4]));
    }

    #[test]
    fn short_series_yield_nan_moments_not_errors() {
        let two = request(json!({"registrosPorISIN": {"X": [rec("2024-01-01", 1.0), rec("2024-01-02", 2.0)]}}));
        let stats = StatisticsEngine::new().process(&two).unwrap().results["X"].stats;
        assert!(stats.skewness.is_nan());
        assert!(stats.kurtosis.is_nan());

        let three = request(json!({"registrosPorISIN": {"X": [
            rec("2024-01-01", 1.0), rec("2024-01-02", 2.0), rec("2024-01-03", 10.0)
        ]}}));
        let result = StatisticsEngine::new().process(&three).unwrap();
        let stats = result.results["X"].stats;
        assert!(!stats.skewness.is_nan());
        assert!(stats.kurtosis.is_nan());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["results"]["X"]["stats"]["kurtosis"], Value::Null);
    }

    #[test]
    fn malformed_date_fails_the_whole_request() {
        let req = request(json!({"registrosPorISIN": {
            "GOOD": [rec("2024-01-01", 1.0)],
            "BAD": [rec("someday", 1.0)]
        }}));
        let err = StatisticsEngine::new().process(&req).unwrap_err();
        assert!(matches!(err, AnalyticsError::MalformedRecord(CoreError::MalformedRecord { ref isin, .. }) if isin == "BAD"));
    }

    #[test]
    fn non_numeric_value_is_a_failure() {
        let req = request(json!({"registrosPorISIN": {"X": [{"date": "2024-01-01", "valueNumerico": "1.5"}]}}));
        assert!(StatisticsEngine::new().process(&req).is_err());

        let req = request(json!({"registrosPorISIN": {"X": "not a series"}}));
        assert!(StatisticsEngine::new().process(&req).is_err());
    }

    #[test]
    fn isolation_reports_failures_and_keeps_the_rest() {
        let req = request(json!({"registrosPorISIN": {
            "GOOD": [rec("2024-01-01", 1.0)],
            "BAD": [rec("someday", 1.0)]
        }}));
        let result = StatisticsEngine::new()
            .with_failure_isolation(true)
            .process(&req)
            .unwrap();
        assert!(result.results.contains_key("GOOD"));
        assert!(!result.results.contains_key("BAD"));
        assert!(result.failures["BAD"].contains("someday"));
    }

    #[test]
    fn failures_and_correlations_are_omitted_when_empty() {
        let req = request(json!({"registrosPorISIN": {}}));
        let json = serde_json::to_value(StatisticsEngine::new().process(&req).unwrap()).unwrap();
        assert_eq!(json, json!({"isins": [], "results": {}, "weights": {}}));
    }

    #[test]
    fn date_range_limits_data_and_stats() {
        let req = request(json!({
            "registrosPorISIN": {
                "X": [rec("2024-01-31", 10.0), rec("2024-02-29", 1.0), rec("2024-03-31", -1.0), rec("2024-04-30", 10.0)],
                "OUTSIDE": [rec("2023-01-31", 1.0)]
            },
            "dateRange": {"start": "2024-02-01", "end": "2024-03-31"}
        }));
        let result = StatisticsEngine::new().process(&req).unwrap();
        let report = &result.results["X"];
        assert_eq!(report.data.len(), 2);
        assert_relative_eq!(report.stats.cumulative_return, -0.01, epsilon = 1e-12);
        assert!(!result.results.contains_key("OUTSIDE"));
        assert_eq!(result.isins, ["X", "OUTSIDE"]);
    }
}
