use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// A record or series could not be interpreted (bad date, non-numeric value, ...).
    #[error("{0}")]
    MalformedRecord(#[from] CoreError),
}
