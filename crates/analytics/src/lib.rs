//! # Portfolio Lens Statistics Engine
//!
//! This crate turns per-ISIN series of periodic percentage returns into
//! descriptive statistics.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of HTTP or
//!   configuration files. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `StatisticsEngine` holds no state between calls.
//!   It takes a validated `PortfolioRequest` and produces a `ProcessingResult`,
//!   allocating everything it needs per call. This makes it safe to run one
//!   invocation per request on any thread.
//!
//! ## Public API
//!
//! - `StatisticsEngine`: sorts each series, computes its `StatisticsSummary` and
//!   correlates the instruments with each other.
//! - `ProcessingResult` / `InstrumentReport` / `StatisticsSummary`: the response structs.
//! - `moments`: the numeric kernels (mean, median, shape moments, compounding,
//!   Sharpe ratio, Pearson correlation).
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod moments;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{DEFAULT_RISK_FREE_RATE, StatisticsEngine};
pub use error::AnalyticsError;
pub use report::{CorrelationMatrix, InstrumentReport, ProcessingResult, StatisticsSummary};
