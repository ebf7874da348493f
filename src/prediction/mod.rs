//! Prediction Module
//!
//! The injected prediction and fetch seams, plus built-in implementations.

mod frequency;
mod http_fetcher;
mod oracle;

pub use frequency::FrequencyOracle;
pub use http_fetcher::HttpFetcher;
pub use oracle::{DataFetcher, PredictionOracle, PredictionRequest};
