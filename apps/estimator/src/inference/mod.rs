//! Online prediction: the single-record path from raw posting text to a
//! dollar salary range.

pub mod handlers;
pub mod predictor;
pub mod scoring;

pub use predictor::{PredictError, Predictor, SalaryRange};
pub use scoring::{to_dollars, HttpSalaryModel, SalaryModel, ScoringError};
