//! Precision and Recall calculation.

use crate::types::{PrecisionRecallPoint, Record};

/// Calculate precision from TP and FP counts.
///
/// Precision is defined as 0.0 when there are no positives at all.
///
/// # Example
///
/// ```
/// use voc_eval::metrics::precision_recall::calculate_precision;
///
/// assert_eq!(calculate_precision(8, 2), 0.8);
/// assert_eq!(calculate_precision(0, 0), 0.0);
/// ```
pub fn calculate_precision(true_positives: usize, false_positives: usize) -> f64 {
    if true_positives + false_positives > 0 {
        true_positives as f64 / (true_positives + false_positives) as f64
    } else {
        0.0
    }
}

/// Sort records by score, highest first.
///
/// The sort is stable, so equal scores keep their insertion order.
pub fn sort_by_score(records: &[Record]) -> Vec<Record> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    sorted
}

/// Calculate the cumulative precision-recall curve of a class buffer.
///
/// Records are sorted by score (descending) before accumulation. Recall is
/// taken against `num_ground_truth`, the number of ground-truth instances of
/// the class seen over the whole pass, not the number of retrieved records.
///
/// # Arguments
///
/// * `records` - Classified records of one class, in any order
/// * `num_ground_truth` - Total number of countable ground truths of that class
///
/// # Returns
///
/// Returns one point per record. Recall is 0.0 everywhere if `num_ground_truth` is 0.
pub fn calculate_precision_recall_curve(
    records: &[Record],
    num_ground_truth: usize,
) -> Vec<PrecisionRecallPoint> {
    let mut curve = Vec::with_capacity(records.len());
    let mut tp = 0;
    let mut fp = 0;

    for record in sort_by_score(records) {
        if record.is_true_positive() {
            tp += 1;
        } else if record.is_false_positive() {
            fp += 1;
        }

        let recall = if num_ground_truth > 0 {
            tp as f64 / num_ground_truth as f64
        } else {
            0.0
        };

        curve.push(PrecisionRecallPoint {
            precision: calculate_precision(tp, fp),
            recall,
            threshold: record.score,
        });
    }

    curve
}

/// Split a curve into parallel `(recall, precision)` vectors.
pub fn split_curve(curve: &[PrecisionRecallPoint]) -> (Vec<f64>, Vec<f64>) {
    curve.iter().map(|p| (p.recall, p.precision)).unzip()
}
