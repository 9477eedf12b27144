//! JSON loading utilities for evaluation batches and metric configs.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::MApConfig;
use crate::error::{Result, VocEvalError};
use crate::types::{
    DETECTION_COLUMNS, GROUND_TRUTH_COLUMNS, GROUND_TRUTH_COLUMNS_WITH_DIFFICULT,
};

/// Ground-truth and detection rows of one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRows {
    /// Rows of `[class_id, xmin, ymin, xmax, ymax, (difficult)]`.
    #[serde(default)]
    pub ground_truths: Vec<Vec<f64>>,
    /// Rows of `[class_id, score, xmin, ymin, xmax, ymax]`.
    #[serde(default)]
    pub detections: Vec<Vec<f64>>,
}

/// A batch of images ready to be fed to the accumulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalBatch {
    pub images: Vec<ImageRows>,
}

impl EvalBatch {
    /// Ground-truth rows per image, in the shape `MApMetric::update` expects.
    pub fn labels(&self) -> Vec<&[Vec<f64>]> {
        self.images.iter().map(|img| img.ground_truths.as_slice()).collect()
    }

    /// Detection rows per image, in the shape `MApMetric::update` expects.
    pub fn preds(&self) -> Vec<&[Vec<f64>]> {
        self.images.iter().map(|img| img.detections.as_slice()).collect()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Load an evaluation batch from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if a row has the
/// wrong number of columns.
///
/// # Example
///
/// ```no_run
/// use voc_eval::loader::load_from_file;
///
/// let batch = load_from_file("detections.json").unwrap();
/// println!("Loaded {} images", batch.len());
/// ```
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<EvalBatch> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let batch: EvalBatch = serde_json::from_reader(reader)?;

    validate_batch(&batch)?;

    Ok(batch)
}

/// Load an evaluation batch from a JSON string.
///
/// # Example
///
/// ```
/// use voc_eval::loader::load_from_string;
///
/// let json = r#"{
///     "images": [
///         {
///             "ground_truths": [[0, 10.0, 10.0, 50.0, 50.0]],
///             "detections": [[0, 0.9, 12.0, 10.0, 50.0, 52.0]]
///         }
///     ]
/// }"#;
/// let batch = load_from_string(json).unwrap();
/// assert_eq!(batch.len(), 1);
/// ```
pub fn load_from_string(json_str: &str) -> Result<EvalBatch> {
    let batch: EvalBatch = serde_json::from_str(json_str)?;
    validate_batch(&batch)?;
    Ok(batch)
}

/// Load a metric config from a JSON file.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<MApConfig> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config: MApConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}

/// Load a metric config from a JSON string.
///
/// # Example
///
/// ```
/// use voc_eval::loader::load_config_from_string;
/// use voc_eval::metrics::ap::ApMethod;
///
/// let config = load_config_from_string(r#"{"ovp_thresh": 0.7, "method": "voc07"}"#).unwrap();
/// assert_eq!(config.method, ApMethod::Voc07);
/// ```
pub fn load_config_from_string(json_str: &str) -> Result<MApConfig> {
    let config: MApConfig = serde_json::from_str(json_str)?;
    config.validate()?;
    Ok(config)
}

/// Validate the column counts of every row in a batch.
fn validate_batch(batch: &EvalBatch) -> Result<()> {
    for (image_idx, image) in batch.images.iter().enumerate() {
        for row in &image.ground_truths {
            if row.len() != GROUND_TRUTH_COLUMNS && row.len() != GROUND_TRUTH_COLUMNS_WITH_DIFFICULT {
                return Err(VocEvalError::InvalidInput(format!(
                    "Image {} has a ground-truth row with {} columns",
                    image_idx,
                    row.len()
                )));
            }
        }

        for row in &image.detections {
            if row.len() != DETECTION_COLUMNS {
                return Err(VocEvalError::InvalidInput(format!(
                    "Image {} has a detection row with {} columns",
                    image_idx,
                    row.len()
                )));
            }
        }
    }

    Ok(())
}
