//! Prediction post-processing
//!
//! Raw model outputs are checked for finiteness and rounded to two decimal
//! places before they are wrapped into the fixed-key response body.

use crate::error::PredictionError;
use crate::models::PredictionResponse;

/// Number of decimal places kept in responses
pub const RESPONSE_DECIMALS: i32 = 2;

/// Round to two decimals: scale by 100, round half to even, scale back.
///
/// Matches the float64 rounding of the numeric library the models were
/// trained with, so 0.125 becomes 0.12 and 0.135 becomes 0.14 (subject to
/// the binary representation of the scaled value).
pub fn round_prediction(value: f64) -> f64 {
    let factor = 10f64.powi(RESPONSE_DECIMALS);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / factor
}

/// Turn a raw model output into the response body for `key`
pub fn format_prediction(key: &'static str, raw: f64) -> Result<PredictionResponse, PredictionError> {
    if !raw.is_finite() {
        return Err(PredictionError::NonFiniteOutput(raw));
    }
    Ok(PredictionResponse {
        key,
        value: round_prediction(raw),
    })
}
