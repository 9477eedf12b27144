//! Threshold validation and sampling utilities.

use crate::error::{Result, VocEvalError};

/// Generate a range of threshold values.
///
/// Values are computed as `start + (end - start) * i / (steps - 1)` so that
/// decimal grids such as `0.0, 0.1, ..., 1.0` land on their exact `f64`
/// representations.
///
/// # Arguments
///
/// * `start` - Starting threshold value (inclusive)
/// * `end` - Ending threshold value (inclusive)
/// * `steps` - Number of threshold values to generate
///
/// # Example
///
/// ```
/// use voc_eval::threshold::generate_threshold_range;
///
/// let thresholds = generate_threshold_range(0.0, 1.0, 11).unwrap();
/// assert_eq!(thresholds.len(), 11);
/// assert_eq!(thresholds[3], 0.3);
/// assert_eq!(thresholds[10], 1.0);
/// ```
pub fn generate_threshold_range(start: f64, end: f64, steps: usize) -> Result<Vec<f64>> {
    if steps == 0 {
        return Err(VocEvalError::InvalidThreshold(
            "Number of steps must be greater than 0".to_string()
        ));
    }

    validate_threshold(start)?;
    validate_threshold(end)?;

    if start > end {
        return Err(VocEvalError::InvalidThreshold(
            format!("Start threshold ({}) must be <= end threshold ({})", start, end)
        ));
    }

    Ok(linear_grid(start, end, steps))
}

/// Evenly spaced values from `start` to `end`, both inclusive.
///
/// A single step yields `[start]`, zero steps an empty grid.
pub fn linear_grid(start: f64, end: f64, steps: usize) -> Vec<f64> {
    if steps <= 1 {
        return vec![start; steps];
    }

    let span = end - start;
    let last = (steps - 1) as f64;
    (0..steps)
        .map(|i| start + span * i as f64 / last)
        .collect()
}

/// Validate that a threshold is in the valid range [0.0, 1.0].
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(VocEvalError::InvalidThreshold(
            format!("Threshold must be between 0.0 and 1.0, got {}", threshold)
        ));
    }
    Ok(())
}
