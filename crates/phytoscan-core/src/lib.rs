//! Phytoscan Core
//!
//! Core types and error handling shared across Phytoscan components.
//!
//! This crate provides:
//! - The prediction result value types returned by the predictor
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    ClassScore, PredictionResult, DEFAULT_CONFIDENCE_THRESHOLD, TOP_K, UNKNOWN_LABEL,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{ClassScore, PredictionResult};
}
