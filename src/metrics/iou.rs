//! Intersection over Union (IoU) calculation.

use crate::types::BoundingBox;

/// Union areas below this value are treated as degenerate.
pub const UNION_EPSILON: f64 = 1e-12;

/// Calculate the Intersection over Union (IoU) between two bounding boxes.
///
/// IoU is defined as the area of intersection divided by the area of union.
/// Degenerate pairs whose union area is below [`UNION_EPSILON`] yield 0.0.
///
/// # Arguments
///
/// * `bbox1` - First bounding box
/// * `bbox2` - Second bounding box
///
/// # Returns
///
/// Returns a value between 0.0 (no overlap) and 1.0 (perfect overlap).
///
/// # Example
///
/// ```
/// use voc_eval::metrics::iou::calculate_iou;
/// use voc_eval::types::BoundingBox;
///
/// let bbox1 = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
/// let bbox2 = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
/// let iou = calculate_iou(&bbox1, &bbox2);
/// assert!(iou > 0.0 && iou < 1.0);
/// ```
pub fn calculate_iou(bbox1: &BoundingBox, bbox2: &BoundingBox) -> f64 {
    let x_left = bbox1.xmin.max(bbox2.xmin);
    let y_top = bbox1.ymin.max(bbox2.ymin);
    let x_right = bbox1.xmax.min(bbox2.xmax);
    let y_bottom = bbox1.ymax.min(bbox2.ymax);

    let intersection_area = (x_right - x_left).max(0.0) * (y_bottom - y_top).max(0.0);
    let union_area = bbox1.area() + bbox2.area() - intersection_area;

    if union_area < UNION_EPSILON {
        return 0.0;
    }

    intersection_area / union_area
}

/// Find the candidate box with the highest IoU against `bbox`.
///
/// Ties resolve to the lowest index. Returns `None` when `candidates` is empty.
///
/// # Example
///
/// ```
/// use voc_eval::metrics::iou::best_overlap;
/// use voc_eval::types::BoundingBox;
///
/// let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
/// let candidates = vec![
///     BoundingBox::new(50.0, 50.0, 60.0, 60.0),
///     BoundingBox::new(0.0, 0.0, 10.0, 10.0),
/// ];
/// let (idx, iou) = best_overlap(&bbox, candidates.iter()).unwrap();
/// assert_eq!(idx, 1);
/// assert!((iou - 1.0).abs() < 1e-10);
/// ```
pub fn best_overlap<'a, I>(bbox: &BoundingBox, candidates: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'a BoundingBox>,
{
    let mut best: Option<(usize, f64)> = None;

    for (idx, candidate) in candidates.into_iter().enumerate() {
        let iou = calculate_iou(bbox, candidate);
        match best {
            Some((_, best_iou)) if iou <= best_iou => {}
            _ => best = Some((idx, iou)),
        }
    }

    best
}
