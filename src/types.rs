//! Core data types for ground truths, detections and scored records.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VocEvalError};

/// Number of columns in a ground-truth row without the difficult flag.
pub const GROUND_TRUTH_COLUMNS: usize = 5;

/// Number of columns in a ground-truth row carrying the difficult flag.
pub const GROUND_TRUTH_COLUMNS_WITH_DIFFICULT: usize = 6;

/// Number of columns in a detection row.
pub const DETECTION_COLUMNS: usize = 6;

/// Represents an axis-aligned bounding box in corner format.
///
/// Coordinates are in XYXY format where:
/// - xmin: Left coordinate
/// - ymin: Top coordinate
/// - xmax: Right coordinate
/// - ymax: Bottom coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    /// Width of the box, zero for inverted boxes.
    pub fn width(&self) -> f64 {
        (self.xmax - self.xmin).max(0.0)
    }

    /// Height of the box, zero for inverted boxes.
    pub fn height(&self) -> f64 {
        (self.ymax - self.ymin).max(0.0)
    }

    /// Get the area of the bounding box.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Check if the bounding box is valid (positive dimensions).
    pub fn is_valid(&self) -> bool {
        self.xmax > self.xmin && self.ymax > self.ymin
    }

    fn from_slice(values: &[f64]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    fn ensure_finite(&self, kind: &str) -> Result<()> {
        let coords = [self.xmin, self.ymin, self.xmax, self.ymax];
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(VocEvalError::InvalidInput(format!(
                "Non-finite coordinate in {} box {:?}",
                kind, coords
            )));
        }
        Ok(())
    }
}

/// A ground-truth instance annotated on one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    /// Class id; negative values mark padding rows.
    pub class_id: i64,
    pub bbox: BoundingBox,
    /// Hard-to-detect instance, excluded from scoring unless `use_difficult` is set.
    #[serde(default)]
    pub difficult: bool,
}

impl GroundTruth {
    /// Create a new, non-difficult ground truth.
    pub fn new(class_id: i64, bbox: BoundingBox) -> Self {
        Self { class_id, bbox, difficult: false }
    }

    /// Mark this ground truth as difficult.
    pub fn difficult(mut self) -> Self {
        self.difficult = true;
        self
    }

    /// Parse a `[class_id, xmin, ymin, xmax, ymax, (difficult)]` row.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the row does not have 5 or 6 columns,
    /// contains a non-finite value, or its class id is not an integer.
    ///
    /// # Example
    ///
    /// ```
    /// use voc_eval::types::GroundTruth;
    ///
    /// let gt = GroundTruth::from_row(&[1.0, 0.0, 0.0, 10.0, 10.0, 1.0]).unwrap();
    /// assert_eq!(gt.class_id, 1);
    /// assert!(gt.difficult);
    /// ```
    pub fn from_row(row: &[f64]) -> Result<Self> {
        if row.len() != GROUND_TRUTH_COLUMNS && row.len() != GROUND_TRUTH_COLUMNS_WITH_DIFFICULT {
            return Err(VocEvalError::InvalidInput(format!(
                "Ground-truth row must have {} or {} columns, got {}",
                GROUND_TRUTH_COLUMNS,
                GROUND_TRUTH_COLUMNS_WITH_DIFFICULT,
                row.len()
            )));
        }
        ensure_finite(row, "ground-truth")?;

        Ok(Self {
            class_id: parse_class_id(row[0], "ground-truth")?,
            bbox: BoundingBox::from_slice(&row[1..5]),
            difficult: row.len() == GROUND_TRUTH_COLUMNS_WITH_DIFFICULT && row[5] > 0.0,
        })
    }

    /// Check that the box coordinates are finite.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` on a NaN or infinite coordinate.
    pub fn validate(&self) -> Result<()> {
        self.bbox.ensure_finite("ground-truth")
    }

    /// Whether this row is padding that must be ignored.
    pub fn is_padding(&self) -> bool {
        self.class_id < 0
    }
}

/// A scored detection produced by a model for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class id; negative values mean "no detection".
    pub class_id: i64,
    pub score: f64,
    pub bbox: BoundingBox,
}

impl Detection {
    /// Create a new detection.
    pub fn new(class_id: i64, score: f64, bbox: BoundingBox) -> Self {
        Self { class_id, score, bbox }
    }

    /// Parse a `[class_id, score, xmin, ymin, xmax, ymax]` row.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the row does not have 6 columns, contains a
    /// non-finite value, or its class id is not an integer.
    pub fn from_row(row: &[f64]) -> Result<Self> {
        if row.len() != DETECTION_COLUMNS {
            return Err(VocEvalError::InvalidInput(format!(
                "Detection row must have {} columns, got {}",
                DETECTION_COLUMNS,
                row.len()
            )));
        }
        ensure_finite(row, "detection")?;

        Ok(Self {
            class_id: parse_class_id(row[0], "detection")?,
            score: row[1],
            bbox: BoundingBox::from_slice(&row[2..6]),
        })
    }

    /// Check that the score and box coordinates are finite.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` on a NaN or infinite value.
    pub fn validate(&self) -> Result<()> {
        if !self.score.is_finite() {
            return Err(VocEvalError::InvalidInput(format!(
                "Non-finite detection score {}",
                self.score
            )));
        }
        self.bbox.ensure_finite("detection")
    }

    /// Whether this row is padding that must be ignored.
    pub fn is_padding(&self) -> bool {
        self.class_id < 0
    }
}

/// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
fn parse_class_id(value: f64, kind: &str) -> Result<i64> {
    if value.fract() != 0.0 || value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return Err(VocEvalError::InvalidInput(format!(
            "Class id {} in {} row is not an integer in range",
            value, kind
        )));
    }
    Ok(value as i64)
}

fn ensure_finite(row: &[f64], kind: &str) -> Result<()> {
    if let Some(pos) = row.iter().position(|v| !v.is_finite()) {
        return Err(VocEvalError::InvalidInput(format!(
            "Non-finite value {} in {} row at column {}",
            row[pos], kind, pos
        )));
    }
    Ok(())
}

/// Outcome of matching one detection against the ground truths of its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Not classified; such records never reach a class buffer.
    Unset,
    TruePositive,
    FalsePositive,
}

/// A classified detection kept in a class buffer until scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub score: f64,
    pub status: MatchStatus,
}

impl Record {
    pub fn new(score: f64, status: MatchStatus) -> Self {
        Self { score, status }
    }

    pub fn is_true_positive(&self) -> bool {
        self.status == MatchStatus::TruePositive
    }

    pub fn is_false_positive(&self) -> bool {
        self.status == MatchStatus::FalsePositive
    }
}

/// Precision-Recall curve point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionRecallPoint {
    pub precision: f64,
    pub recall: f64,
    /// Score of the detection that produced this point.
    pub threshold: f64,
}

/// Result of reading the accumulated metric.
///
/// `NaN` values mean "undefined" (no ground truth observed), never zero.
///
/// The derived `PartialEq` compares `f64` values, so an output holding a
/// `NaN` slot is never equal to itself. Use [`MetricOutput::same_values`]
/// to compare outputs that may contain undefined slots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MetricOutput {
    /// Class-agnostic mode: a single aggregate value.
    Single { name: String, value: f64 },
    /// One value per configured class name, followed by the `mAP` aggregate.
    PerClass { names: Vec<String>, values: Vec<f64> },
}

impl MetricOutput {
    /// The aggregate mAP value, which is always the last reported slot.
    pub fn map(&self) -> f64 {
        match self {
            MetricOutput::Single { value, .. } => *value,
            MetricOutput::PerClass { values, .. } => values.last().copied().unwrap_or(f64::NAN),
        }
    }

    /// Look up a reported value by name.
    pub fn value_of(&self, name: &str) -> Option<f64> {
        match self {
            MetricOutput::Single { name: n, value } => (n == name).then_some(*value),
            MetricOutput::PerClass { names, values } => names
                .iter()
                .position(|n| n == name)
                .and_then(|idx| values.get(idx).copied()),
        }
    }

    /// Compare two outputs slot by slot, treating `NaN` as equal to `NaN`.
    pub fn same_values(&self, other: &MetricOutput) -> bool {
        let lhs = self.pairs();
        let rhs = other.pairs();
        lhs.len() == rhs.len()
            && lhs.iter().zip(rhs.iter()).all(|((ln, lv), (rn, rv))| {
                ln == rn && (lv == rv || (lv.is_nan() && rv.is_nan()))
            })
    }

    /// Iterate over `(name, value)` pairs in reporting order.
    pub fn pairs(&self) -> Vec<(&str, f64)> {
        match self {
            MetricOutput::Single { name, value } => vec![(name.as_str(), *value)],
            MetricOutput::PerClass { names, values } => names
                .iter()
                .map(String::as_str)
                .zip(values.iter().copied())
                .collect(),
        }
    }
}
