//! Statistics tracking for accumulator updates
//!
//! Counters describing what the accumulator has seen since the last reset,
//! useful for sanity-checking an evaluation pass.

use serde::{Deserialize, Serialize};

use crate::types::{MatchStatus, Record};

/// Statistics collected while processing images
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStats {
    /// Number of images processed
    pub images: usize,

    /// Number of detection rows received, padding included
    pub detections: usize,

    /// Number of detections ignored because of a negative class id
    pub ignored_detections: usize,

    /// Number of detections skipped because they matched a difficult ground truth
    pub skipped_difficult: usize,

    /// Number of detections classified as true positives
    pub true_positives: usize,

    /// Number of detections classified as false positives
    pub false_positives: usize,

    /// Number of ground truths counted towards recall
    pub ground_truths: usize,

    /// Number of difficult ground truths left out of recall
    pub difficult_ground_truths: usize,
}

impl UpdateStats {
    /// Create a new `UpdateStats` with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a classified record
    pub fn record(&mut self, record: &Record) {
        match record.status {
            MatchStatus::TruePositive => self.true_positives += 1,
            MatchStatus::FalsePositive => self.false_positives += 1,
            MatchStatus::Unset => {}
        }
    }

    /// Fold the counters of another batch into this one
    pub fn merge(&mut self, other: &UpdateStats) {
        self.images += other.images;
        self.detections += other.detections;
        self.ignored_detections += other.ignored_detections;
        self.skipped_difficult += other.skipped_difficult;
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.ground_truths += other.ground_truths;
        self.difficult_ground_truths += other.difficult_ground_truths;
    }

    /// Number of detections that ended up in a class buffer
    pub fn scored_detections(&self) -> usize {
        self.true_positives + self.false_positives
    }

    /// Overall precision across all classes, 0.0 before any detection is scored
    pub fn overall_precision(&self) -> f64 {
        crate::metrics::precision_recall::calculate_precision(
            self.true_positives,
            self.false_positives,
        )
    }

    /// Log a summary of the statistics at info level
    pub fn log_summary(&self) {
        log::info!("{}", self.summary_string());
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "UpdateStats {{ images: {}, detections: {}, scored: {}, tp: {}, fp: {}, ignored: {}, skipped_difficult: {}, ground_truths: {} }}",
            self.images,
            self.detections,
            self.scored_detections(),
            self.true_positives,
            self.false_positives,
            self.ignored_detections,
            self.skipped_difficult,
            self.ground_truths
        )
    }
}
