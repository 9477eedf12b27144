//! Greedy per-image matching of detections against ground truths.

use std::collections::BTreeMap;

use log::{trace, warn};

use crate::metrics::iou::best_overlap;
use crate::stats::UpdateStats;
use crate::types::{Detection, GroundTruth, MatchStatus, Record};

/// Classified detections and ground-truth counts of a single image.
#[derive(Debug, Clone, Default)]
pub struct ImageMatch {
    /// Scored records per class id, in descending score order.
    pub records: BTreeMap<i64, Vec<Record>>,
    /// Ground truths per class id that count towards recall.
    pub ground_truth_counts: BTreeMap<i64, usize>,
    pub stats: UpdateStats,
}

/// Group items by class id, dropping padding rows (negative ids).
///
/// Items keep their input order within each group.
pub fn group_by_class<T, F>(items: &[T], class_of: F) -> BTreeMap<i64, Vec<&T>>
where
    F: Fn(&T) -> i64,
{
    let mut groups: BTreeMap<i64, Vec<&T>> = BTreeMap::new();

    for item in items {
        let class_id = class_of(item);
        if class_id < 0 {
            continue;
        }
        groups.entry(class_id).or_default().push(item);
    }

    groups
}

/// Match the detections of one image to its ground truths.
///
/// Detections of each class are visited in descending score order. Each one is
/// compared against every ground truth of its class and takes the one with the
/// highest IoU (first on ties):
///
/// - IoU below `ovp_thresh`, or no ground truth of the class: false positive.
/// - Matched ground truth is difficult and `use_difficult` is false: skipped,
///   the detection produces no record.
/// - Matched ground truth still unclaimed: true positive, and the ground truth
///   is claimed.
/// - Matched ground truth already claimed by a higher-scoring detection:
///   false positive.
///
/// # Arguments
///
/// * `ground_truths` - Ground truths of the image
/// * `detections` - Detections of the image, in any order
/// * `ovp_thresh` - Minimum IoU to consider a match
/// * `use_difficult` - Treat difficult ground truths like regular ones
///
/// # Example
///
/// ```
/// use voc_eval::matching::match_image;
/// use voc_eval::types::{BoundingBox, Detection, GroundTruth};
///
/// let gts = vec![GroundTruth::new(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0))];
/// let dets = vec![Detection::new(1, 0.9, BoundingBox::new(0.0, 0.0, 10.0, 10.0))];
///
/// let matched = match_image(&gts, &dets, 0.5, false);
/// assert!(matched.records[&1][0].is_true_positive());
/// assert_eq!(matched.ground_truth_counts[&1], 1);
/// ```
pub fn match_image(
    ground_truths: &[GroundTruth],
    detections: &[Detection],
    ovp_thresh: f64,
    use_difficult: bool,
) -> ImageMatch {
    let mut result = ImageMatch::default();
    result.stats.images = 1;
    result.stats.detections = detections.len();

    let degenerate = ground_truths
        .iter()
        .filter(|gt| !gt.is_padding() && !gt.bbox.is_valid())
        .count()
        + detections
            .iter()
            .filter(|det| !det.is_padding() && !det.bbox.is_valid())
            .count();
    if degenerate > 0 {
        warn!("{} degenerate boxes in image, their IoU is 0", degenerate);
    }

    let gt_groups = group_by_class(ground_truths, |gt| gt.class_id);
    let det_groups = group_by_class(detections, |det| det.class_id);
    result.stats.ignored_detections =
        detections.len() - det_groups.values().map(Vec::len).sum::<usize>();

    for (&class_id, gts) in &gt_groups {
        let countable = gts.iter().filter(|gt| use_difficult || !gt.difficult).count();
        result.stats.ground_truths += countable;
        result.stats.difficult_ground_truths += gts.len() - countable;
        result.ground_truth_counts.insert(class_id, countable);
    }

    for (class_id, mut dets) in det_groups {
        dets.sort_by(|a, b| b.score.total_cmp(&a.score));

        let gts = gt_groups.get(&class_id).map(Vec::as_slice).unwrap_or(&[]);
        let mut claimed = vec![false; gts.len()];
        let mut records = Vec::with_capacity(dets.len());

        for det in dets {
            let status = match best_overlap(&det.bbox, gts.iter().copied().map(|gt| &gt.bbox)) {
                Some((gt_idx, iou)) if iou >= ovp_thresh => {
                    if gts[gt_idx].difficult && !use_difficult {
                        MatchStatus::Unset
                    } else if !claimed[gt_idx] {
                        claimed[gt_idx] = true;
                        MatchStatus::TruePositive
                    } else {
                        MatchStatus::FalsePositive
                    }
                }
                Some((gt_idx, iou)) => {
                    trace!(
                        "class {} score {:.4}: best IoU {:.4} with gt #{} below {:.2}",
                        class_id, det.score, iou, gt_idx, ovp_thresh
                    );
                    MatchStatus::FalsePositive
                }
                None => MatchStatus::FalsePositive,
            };

            trace!("class {} score {:.4} -> {:?}", class_id, det.score, status);

            if status == MatchStatus::Unset {
                result.stats.skipped_difficult += 1;
                continue;
            }

            let record = Record::new(det.score, status);
            result.stats.record(&record);
            records.push(record);
        }

        if !records.is_empty() {
            result.records.insert(class_id, records);
        }
    }

    result
}
