//! Prediction metrics
//!
//! Emitted through the `metrics` facade; nothing is recorded unless the
//! embedding application installs a recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use phytoscan_core::PredictionResult;
use std::time::Duration;

pub const PREDICTIONS_TOTAL: &str = "phytoscan_predictions_total";
pub const PREDICTIONS_UNKNOWN_TOTAL: &str = "phytoscan_predictions_unknown_total";
pub const DECODE_ERRORS_TOTAL: &str = "phytoscan_decode_errors_total";
pub const INFERENCE_LATENCY_US: &str = "phytoscan_inference_latency_us";

/// Register descriptions with the installed recorder
pub fn describe_metrics() {
    describe_counter!(PREDICTIONS_TOTAL, "Completed predictions");
    describe_counter!(
        PREDICTIONS_UNKNOWN_TOTAL,
        "Predictions whose top confidence fell below the threshold"
    );
    describe_counter!(DECODE_ERRORS_TOTAL, "Inputs that could not be decoded as images");
    describe_histogram!(
        INFERENCE_LATENCY_US,
        Unit::Microseconds,
        "Preprocessing plus forward pass latency"
    );
}

pub(crate) fn record_prediction(result: &PredictionResult, latency: Duration) {
    counter!(PREDICTIONS_TOTAL).increment(1);
    if result.is_unknown() {
        counter!(PREDICTIONS_UNKNOWN_TOTAL).increment(1);
    }
    histogram!(INFERENCE_LATENCY_US).record(latency.as_micros() as f64);
}

pub(crate) fn record_decode_error() {
    counter!(DECODE_ERRORS_TOTAL).increment(1);
}
