use core_types::ReturnRecord;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Descriptive statistics for one instrument's return series.
///
/// Every field is a percentage figure in the same units as `valueNumerico`.
/// Moments that are undefined for short series are `NaN`, which serializes
/// to JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    /// Geometrically compounded return over the whole series.
    pub cumulative_return: f64,
    /// Population standard deviation.
    pub volatility: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub skewness: f64,
    /// Excess kurtosis (normal = 0).
    pub kurtosis: f64,
    /// Deepest peak-to-trough fall of the cumulative return path.
    pub max_drawdown: f64,
    /// Annualised excess return per unit of annualised sample deviation.
    pub sharpe_ratio: f64,
}

/// ISIN -> ISIN -> Pearson correlation over the dates both series share.
pub type CorrelationMatrix = IndexMap<String, IndexMap<String, f64>>;

/// The statistics of one instrument together with the records they were
/// computed from, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentReport {
    pub stats: StatisticsSummary,
    pub data: Vec<ReturnRecord>,
}

/// The response envelope for one processing request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingResult {
    /// Every ISIN of the request, in request order, including empty ones.
    pub isins: Vec<String>,
    /// Reports for the ISINs that had data.
    pub results: IndexMap<String, InstrumentReport>,
    /// Pairwise correlations of the ISINs in `results`, in the same order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub correlations: CorrelationMatrix,
    /// The portfolio weights exactly as supplied, `{}` when absent.
    pub weights: Value,
    /// Per-ISIN failure messages. Only populated when failures are isolated.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub failures: IndexMap<String, String>,
}
