pub mod date;
pub mod error;
pub mod record;
pub mod request;

// Re-export the core types to provide a clean public API.
pub use date::parse_timestamp;
pub use error::CoreError;
pub use record::{ReturnRecord, parse_series};
pub use request::{DateRange, PortfolioRequest};
