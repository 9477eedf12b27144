//! Average Precision (AP) and mean Average Precision (mAP) calculation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VocEvalError;
use crate::threshold::linear_grid;

/// Number of recall levels sampled by the VOC 2007 metric.
pub const VOC07_RECALL_LEVELS: usize = 11;

/// Strategy used to integrate a precision-recall curve into a single AP value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApMethod {
    /// Area under the monotone precision envelope (VOC 2010 and later).
    #[default]
    Continuous,
    /// Mean of the interpolated precision at 11 recall levels (VOC 2007).
    Voc07,
}

impl ApMethod {
    /// Integrate a precision-recall curve with this strategy.
    ///
    /// # Example
    ///
    /// ```
    /// use voc_eval::metrics::ap::ApMethod;
    ///
    /// let ap = ApMethod::Voc07.average_precision(&[1.0], &[1.0]);
    /// assert!((ap - 1.0).abs() < 1e-10);
    /// ```
    pub fn average_precision(&self, recall: &[f64], precision: &[f64]) -> f64 {
        match self {
            ApMethod::Continuous => continuous_ap(recall, precision),
            ApMethod::Voc07 => eleven_point_ap(recall, precision),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApMethod::Continuous => "continuous",
            ApMethod::Voc07 => "voc07",
        }
    }
}

impl fmt::Display for ApMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApMethod {
    type Err = VocEvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" | "voc2010" | "area" => Ok(ApMethod::Continuous),
            "voc07" | "voc2007" | "11point" | "11-point" => Ok(ApMethod::Voc07),
            other => Err(VocEvalError::InvalidConfig(format!(
                "Unknown AP method '{}', expected 'continuous' or 'voc07'",
                other
            ))),
        }
    }
}

/// Calculate AP as the area under the precision envelope.
///
/// The curve is padded with a `(0, 0)` point in front and a `(1, 0)` point at
/// the end, precision is made non-increasing from the right, and the area is
/// summed over every step where recall changes.
///
/// # Arguments
///
/// * `recall` - Non-decreasing recall values
/// * `precision` - Precision values, one per recall value
///
/// # Example
///
/// ```
/// use voc_eval::metrics::ap::continuous_ap;
///
/// let recall = vec![0.5, 0.5, 0.5, 1.0];
/// let precision = vec![1.0, 0.5, 1.0 / 3.0, 0.5];
/// assert!((continuous_ap(&recall, &precision) - 0.75).abs() < 1e-10);
/// ```
pub fn continuous_ap(recall: &[f64], precision: &[f64]) -> f64 {
    if recall.is_empty() || precision.is_empty() {
        return 0.0;
    }

    let mut mrec = Vec::with_capacity(recall.len() + 2);
    mrec.push(0.0);
    mrec.extend_from_slice(recall);
    mrec.push(1.0);

    let mut mpre = Vec::with_capacity(precision.len() + 2);
    mpre.push(0.0);
    mpre.extend_from_slice(precision);
    mpre.push(0.0);

    // Precision envelope
    for i in (1..mpre.len()).rev() {
        mpre[i - 1] = mpre[i - 1].max(mpre[i]);
    }

    mrec.windows(2)
        .zip(mpre.iter().skip(1))
        .filter(|(r, _)| r[1] != r[0])
        .map(|(r, &p)| (r[1] - r[0]) * p)
        .sum()
}

/// Calculate AP with the 11-point interpolation of PASCAL VOC 2007.
///
/// For each recall level `t` in `0.0, 0.1, ..., 1.0` the maximum precision
/// among points with `recall >= t` is taken (0.0 if there is none), and the
/// 11 values are averaged.
///
/// # Example
///
/// ```
/// use voc_eval::metrics::ap::eleven_point_ap;
///
/// let recall = vec![0.5, 0.5, 0.5, 1.0];
/// let precision = vec![1.0, 0.5, 1.0 / 3.0, 0.5];
/// assert!((eleven_point_ap(&recall, &precision) - 17.0 / 22.0).abs() < 1e-10);
/// ```
pub fn eleven_point_ap(recall: &[f64], precision: &[f64]) -> f64 {
    if recall.is_empty() || precision.is_empty() {
        return 0.0;
    }

    let total: f64 = linear_grid(0.0, 1.0, VOC07_RECALL_LEVELS)
        .into_iter()
        .map(|recall_level| {
            precision
                .iter()
                .zip(recall.iter())
                .filter(|(_, &r)| r >= recall_level)
                .map(|(&p, _)| p)
                .fold(0.0f64, |a, b| a.max(b))
        })
        .sum();

    total / VOC07_RECALL_LEVELS as f64
}

/// Calculate mean Average Precision (mAP) across multiple classes.
///
/// `NaN` entries (classes without ground truth) are left out of the mean.
/// Returns `NaN` when no class has a defined AP.
///
/// # Example
///
/// ```
/// use voc_eval::metrics::ap::calculate_map;
///
/// let class_aps = vec![0.8, 0.9, f64::NAN, 0.75, 0.85];
/// let map = calculate_map(&class_aps);
/// assert!((map - 0.825).abs() < 1e-10);
/// assert!(calculate_map(&[]).is_nan());
/// ```
pub fn calculate_map(class_aps: &[f64]) -> f64 {
    let defined: Vec<f64> = class_aps.iter().copied().filter(|ap| !ap.is_nan()).collect();
    if defined.is_empty() {
        return f64::NAN;
    }

    defined.iter().sum::<f64>() / defined.len() as f64
}
