use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// The request body does not have the expected top-level shape.
    #[error("Invalid data format")]
    InvalidFormat,

    #[error("Invalid date '{0}': {1}")]
    InvalidDate(String, String),

    #[error("Malformed record for {isin}: {reason}")]
    MalformedRecord { isin: String, reason: String },
}

impl CoreError {
    pub fn malformed(isin: &str, reason: impl Into<String>) -> Self {
        CoreError::MalformedRecord {
            isin: isin.to_string(),
            reason: reason.into(),
        }
    }
}
