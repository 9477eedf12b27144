//! # voc-eval
//!
//! A Rust library for PASCAL VOC style mean Average Precision (mAP) of object
//! detection models, accumulated batch by batch over an evaluation pass.
//!
//! The library provides:
//! - **IoU** (Intersection over Union) between corner-format boxes
//! - **Greedy matching** of detections to ground truths, per image and class
//! - **AP** with continuous (VOC 2010+) or 11-point (VOC 2007) interpolation
//! - **mAP** across classes, with per-class breakdown by name
//!
//! ## Features
//!
//! - Accumulate raw `[class_id, ...]` rows or typed boxes, image by image
//! - Difficult ground truths excluded from scoring unless requested
//! - Undefined values (classes never annotated) reported as `NaN`, not 0
//! - Load batches and configs from JSON
//!
//! ## Quick Start
//!
//! ```rust
//! use voc_eval::{MApConfig, MApMetric};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut metric = MApMetric::new(MApConfig::new().with_class_names(["person", "car"]))?;
//!
//! // One image: ground truths are [class_id, xmin, ymin, xmax, ymax],
//! // detections are [class_id, score, xmin, ymin, xmax, ymax].
//! let labels = vec![vec![vec![0.0, 10.0, 10.0, 50.0, 50.0]]];
//! let preds = vec![vec![vec![0.0, 0.9, 10.0, 10.0, 50.0, 50.0]]];
//! metric.update(&labels, &preds)?;
//!
//! for (name, value) in metric.get().pairs() {
//!     println!("{}: {:.4}", name, value);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Batch Format
//!
//! Batches loaded from JSON hold one entry per image:
//!
//! ```json
//! {
//!   "images": [
//!     {
//!       "ground_truths": [[0, 10.0, 10.0, 50.0, 50.0, 0]],
//!       "detections": [[0, 0.9, 12.0, 10.0, 50.0, 52.0]]
//!     }
//!   ]
//! }
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod loader;
pub mod threshold;
pub mod metrics;
pub mod matching;
pub mod stats;
pub mod accumulator;

// Re-export commonly used types and functions
pub use error::{VocEvalError, Result};
pub use types::{
    BoundingBox, GroundTruth, Detection, MatchStatus, Record,
    MetricOutput, PrecisionRecallPoint,
};
pub use config::MApConfig;
pub use accumulator::MApMetric;
pub use metrics::ap::ApMethod;
pub use loader::{load_from_file, load_from_string};
pub use stats::UpdateStats;
