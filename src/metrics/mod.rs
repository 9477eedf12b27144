//! Metric calculation modules for VOC-style evaluation.

pub mod iou;
pub mod ap;
pub mod precision_recall;

pub use iou::{best_overlap, calculate_iou};
pub use ap::{calculate_map, continuous_ap, eleven_point_ap, ApMethod};
pub use precision_recall::{calculate_precision, calculate_precision_recall_curve};
