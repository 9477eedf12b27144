//! Mean Average Precision accumulator for object detection evaluation.
//!
//! [`MApMetric`] follows the usual metric lifecycle: [`reset`](MApMetric::reset)
//! at the start of a pass, [`update`](MApMetric::update) once per batch, and
//! [`get`](MApMetric::get) whenever a result is needed. `get` only reads the
//! buffers, so it can be called any number of times.
//!
//! The accumulator is not synchronized. Use one instance per evaluation
//! context, or wrap it in a lock if several callers must share it.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::config::{MApConfig, MAP_NAME};
use crate::error::{Result, VocEvalError};
use crate::matching::match_image;
use crate::metrics::ap::calculate_map;
use crate::metrics::precision_recall::{calculate_precision_recall_curve, split_curve};
use crate::stats::UpdateStats;
use crate::types::{Detection, GroundTruth, MetricOutput, Record};

/// Accumulates classified detections per class and scores them as mAP.
#[derive(Debug, Clone, Default)]
pub struct MApMetric {
    config: MApConfig,
    records: BTreeMap<i64, Vec<Record>>,
    ground_truth_counts: BTreeMap<i64, usize>,
    stats: UpdateStats,
}

impl MApMetric {
    /// Create an accumulator from a config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config fails [`MApConfig::validate`].
    ///
    /// # Example
    ///
    /// ```
    /// use voc_eval::{MApConfig, MApMetric};
    ///
    /// let metric = MApMetric::new(MApConfig::voc07().with_class_names(["cat", "dog"])).unwrap();
    /// assert_eq!(metric.num_outputs(), 3);
    /// ```
    pub fn new(config: MApConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &MApConfig {
        &self.config
    }

    /// Counters accumulated since the last reset.
    pub fn stats(&self) -> &UpdateStats {
        &self.stats
    }

    /// Names of the reported slots, `mAP` last.
    pub fn names(&self) -> Vec<String> {
        self.config.output_names()
    }

    /// Number of reported slots.
    pub fn num_outputs(&self) -> usize {
        self.config.class_names.as_ref().map_or(1, |names| names.len() + 1)
    }

    /// Clear all buffered records, ground-truth counts and statistics.
    pub fn reset(&mut self) {
        info!(
            "Resetting mAP metric ({} classes buffered, {} images seen)",
            self.records.len(),
            self.stats.images
        );
        self.records.clear();
        self.ground_truth_counts.clear();
        self.stats = UpdateStats::default();
    }

    /// Accumulate a batch given as raw rows.
    ///
    /// `labels[i]` holds the ground-truth rows of image `i`, each
    /// `[class_id, xmin, ymin, xmax, ymax]` with an optional sixth difficult
    /// column. `preds[i]` holds its detection rows, each
    /// `[class_id, score, xmin, ymin, xmax, ymax]`. Rows with a negative class
    /// id are padding and are ignored.
    ///
    /// The whole batch is validated before any state changes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the image counts differ or a row is malformed.
    ///
    /// # Example
    ///
    /// ```
    /// use voc_eval::MApMetric;
    ///
    /// let mut metric = MApMetric::default();
    /// let labels = vec![vec![vec![1.0, 0.0, 0.0, 10.0, 10.0]]];
    /// let preds = vec![vec![vec![1.0, 0.9, 0.0, 0.0, 10.0, 10.0]]];
    /// metric.update(&labels, &preds).unwrap();
    /// assert!((metric.get().map() - 1.0).abs() < 1e-10);
    /// ```
    pub fn update<L, P>(&mut self, labels: &[L], preds: &[P]) -> Result<()>
    where
        L: AsRef<[Vec<f64>]>,
        P: AsRef<[Vec<f64>]>,
    {
        if labels.len() != preds.len() {
            return Err(VocEvalError::InvalidInput(format!(
                "Batch has {} ground-truth images but {} detection images",
                labels.len(),
                preds.len()
            )));
        }

        let images = labels
            .iter()
            .zip(preds.iter())
            .enumerate()
            .map(|(image_idx, (label, pred))| parse_image(image_idx, label.as_ref(), pred.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        for (ground_truths, detections) in &images {
            self.accumulate(ground_truths, detections);
        }

        Ok(())
    }

    /// Accumulate one image given as typed ground truths and detections.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a score or box coordinate is not finite. The
    /// accumulator is left unchanged in that case.
    pub fn update_image(
        &mut self,
        ground_truths: &[GroundTruth],
        detections: &[Detection],
    ) -> Result<()> {
        ground_truths.iter().try_for_each(GroundTruth::validate)?;
        detections.iter().try_for_each(Detection::validate)?;

        self.accumulate(ground_truths, detections);
        Ok(())
    }

    fn accumulate(&mut self, ground_truths: &[GroundTruth], detections: &[Detection]) {
        let matched = match_image(
            ground_truths,
            detections,
            self.config.ovp_thresh,
            self.config.use_difficult,
        );

        debug!(
            "image {}: {} gts, {} detections -> {} tp, {} fp, {} skipped",
            self.stats.images,
            matched.stats.ground_truths,
            matched.stats.detections,
            matched.stats.true_positives,
            matched.stats.false_positives,
            matched.stats.skipped_difficult
        );

        for (class_id, count) in matched.ground_truth_counts {
            *self.ground_truth_counts.entry(class_id).or_insert(0) += count;
        }
        for (class_id, records) in matched.records {
            self.records.entry(class_id).or_default().extend(records);
        }
        self.stats.merge(&matched.stats);
    }

    /// Average precision of one class.
    ///
    /// Returns `NaN` when no countable ground truth of the class has been seen,
    /// and 0.0 when ground truths exist but no detection was recorded.
    pub fn class_ap(&self, class_id: i64) -> f64 {
        let num_ground_truth = self.ground_truth_counts.get(&class_id).copied().unwrap_or(0);
        if num_ground_truth == 0 {
            return f64::NAN;
        }

        let records = self.records.get(&class_id).map(Vec::as_slice).unwrap_or(&[]);
        if records.is_empty() {
            return 0.0;
        }

        let curve = calculate_precision_recall_curve(records, num_ground_truth);
        let (recall, precision) = split_curve(&curve);
        self.config.method.average_precision(&recall, &precision)
    }

    /// AP of every class seen so far, by class id.
    ///
    /// Classes that only ever received detections report `NaN`.
    pub fn class_aps(&self) -> BTreeMap<i64, f64> {
        self.ground_truth_counts
            .keys()
            .chain(self.records.keys())
            .map(|&class_id| (class_id, self.class_ap(class_id)))
            .collect()
    }

    /// Mean of the defined per-class APs, `NaN` if no class has ground truth.
    pub fn map(&self) -> f64 {
        let aps: Vec<f64> = self.class_aps().into_values().collect();
        calculate_map(&aps)
    }

    /// Read the current result.
    ///
    /// Without class names a single `mAP` value is returned. With class names,
    /// slot `k` reports the AP of class id `k`, followed by the `mAP` slot.
    /// `NaN` marks undefined values. Calling `get` repeatedly without an
    /// intervening `update` always returns the same output.
    pub fn get(&self) -> MetricOutput {
        let class_aps = self.class_aps();

        for (class_id, ap) in &class_aps {
            if ap.is_nan() && self.records.contains_key(class_id) {
                warn!(
                    "class {} has detections but no ground truth, left out of mAP",
                    class_id
                );
            }
        }

        let aps: Vec<f64> = class_aps.values().copied().collect();
        let map = calculate_map(&aps);

        match &self.config.class_names {
            None => MetricOutput::Single {
                name: MAP_NAME.to_string(),
                value: map,
            },
            Some(names) => {
                let mut values: Vec<f64> = (0..names.len())
                    .map(|class_id| {
                        class_aps
                            .get(&(class_id as i64))
                            .copied()
                            .unwrap_or(f64::NAN)
                    })
                    .collect();
                values.push(map);

                MetricOutput::PerClass {
                    names: self.names(),
                    values,
                }
            }
        }
    }
}

fn parse_image(
    image_idx: usize,
    label: &[Vec<f64>],
    pred: &[Vec<f64>],
) -> Result<(Vec<GroundTruth>, Vec<Detection>)> {
    let with_context = |e: VocEvalError| match e {
        VocEvalError::InvalidInput(msg) => {
            VocEvalError::InvalidInput(format!("image {}: {}", image_idx, msg))
        }
        other => other,
    };

    let ground_truths = label
        .iter()
        .map(|row| GroundTruth::from_row(row))
        .collect::<Result<Vec<_>>>()
        .map_err(with_context)?;

    let detections = pred
        .iter()
        .map(|row| Detection::from_row(row))
        .collect::<Result<Vec<_>>>()
        .map_err(with_context)?;

    Ok((ground_truths, detections))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ap::ApMethod;
    use crate::types::BoundingBox;

    fn gt_row(class_id: f64, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Vec<f64> {
        vec![class_id, xmin, ymin, xmax, ymax]
    }

    fn det_row(class_id: f64, score: f64, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Vec<f64> {
        vec![class_id, score, xmin, ymin, xmax, ymax]
    }

    #[test]
    fn test_single_perfect_detection() {
        for method in [ApMethod::Continuous, ApMethod::Voc07] {
            let mut metric = MApMetric::new(MApConfig::new().with_method(method)).unwrap();
            metric
                .update(
                    &[vec![gt_row(1.0, 0.0, 0.0, 10.0, 10.0)]],
                    &[vec![det_row(1.0, 0.9, 0.0, 0.0, 10.0, 10.0)]],
                )
                .unwrap();

            let output = metric.get();
            assert_eq!(output.pairs()[0].0, "mAP");
            assert!((output.map() - 1.0).abs() < 1e-10, "{} gave {}", method, output.map());
        }
    }

    #[test]
    fn test_empty_metric_is_nan() {
        let metric = MApMetric::default();
        assert!(metric.get().map().is_nan());
        assert!(metric.class_aps().is_empty());
    }

    #[test]
    fn test_get_is_idempotent() {
        let mut metric = MApMetric::default();
        metric
            .update(
                &[vec![gt_row(0.0, 0.0, 0.0, 10.0, 10.0), gt_row(0.0, 20.0, 20.0, 30.0, 30.0)]],
                &[vec![
                    det_row(0.0, 0.9, 0.0, 0.0, 10.0, 10.0),
                    det_row(0.0, 0.8, 50.0, 50.0, 60.0, 60.0),
                ]],
            )
            .unwrap();

        let first = metric.get();
        let second = metric.get();
        let third = metric.get();
        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(metric.map(), first.map());
    }

    #[test]
    fn test_get_is_idempotent_with_undefined_slots() {
        let mut metric = MApMetric::new(MApConfig::new().with_class_names(["cat", "dog"])).unwrap();
        assert!(metric.get().same_values(&metric.get()));

        metric
            .update(
                &[vec![gt_row(0.0, 0.0, 0.0, 10.0, 10.0)]],
                &[vec![det_row(0.0, 0.9, 0.0, 0.0, 10.0, 10.0)]],
            )
            .unwrap();
        let first = metric.get();
        assert!(first.value_of("dog").unwrap().is_nan());
        assert!(first.same_values(&metric.get()));
    }

    #[test]
    fn test_typed_update_rejects_non_finite_values() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let mut metric = MApMetric::default();

        let result = metric.update_image(
            &[GroundTruth::new(0, bbox)],
            &[Detection::new(0, 0.5, bbox), Detection::new(0, f64::NAN, bbox)],
        );
        assert!(matches!(result, Err(VocEvalError::InvalidInput(_))));
        assert_eq!(metric.stats(), &UpdateStats::default());
        assert!(metric.class_aps().is_empty());
    }

    #[test]
    fn test_recall_denominator_spans_images() {
        let mut metric = MApMetric::default();
        // Image 0: found. Image 1: missed entirely.
        metric
            .update(
                &[
                    vec![gt_row(0.0, 0.0, 0.0, 10.0, 10.0)],
                    vec![gt_row(0.0, 0.0, 0.0, 10.0, 10.0)],
                ],
                &[vec![det_row(0.0, 0.9, 0.0, 0.0, 10.0, 10.0)], vec![]],
            )
            .unwrap();

        assert!((metric.class_ap(0) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut metric = MApMetric::default();
        metric
            .update(
                &[vec![gt_row(0.0, 0.0, 0.0, 10.0, 10.0)]],
                &[vec![det_row(0.0, 0.9, 0.0, 0.0, 10.0, 10.0)]],
            )
            .unwrap();
        assert_eq!(metric.stats().images, 1);

        metric.reset();
        assert!(metric.get().map().is_nan());
        assert_eq!(metric.stats(), &UpdateStats::default());
    }

    #[test]
    fn test_mismatched_image_counts() {
        let mut metric = MApMetric::default();
        let result = metric.update(&[vec![gt_row(0.0, 0.0, 0.0, 1.0, 1.0)]], &Vec::<Vec<Vec<f64>>>::new());
        assert!(matches!(result, Err(VocEvalError::InvalidInput(_))));
    }

    #[test]
    fn test_malformed_batch_leaves_state_untouched() {
        let mut metric = MApMetric::default();
        let labels = vec![
            vec![gt_row(0.0, 0.0, 0.0, 10.0, 10.0)],
            vec![vec![0.0, 0.0, 0.0]],
        ];
        let preds = vec![vec![det_row(0.0, 0.9, 0.0, 0.0, 10.0, 10.0)], vec![]];

        let err = metric.update(&labels, &preds).unwrap_err();
        assert!(err.to_string().contains("image 1"));
        assert_eq!(metric.stats().images, 0);
        assert!(metric.class_aps().is_empty());
    }

    #[test]
    fn test_per_class_output() {
        let config = MApConfig::new().with_class_names(["cat", "dog", "bird"]);
        let mut metric = MApMetric::new(config).unwrap();
        metric
            .update(
                &[vec![gt_row(0.0, 0.0, 0.0, 10.0, 10.0), gt_row(1.0, 20.0, 20.0, 30.0, 30.0)]],
                &[vec![det_row(0.0, 0.9, 0.0, 0.0, 10.0, 10.0)]],
            )
            .unwrap();

        match metric.get() {
            MetricOutput::PerClass { names, values } => {
                assert_eq!(names, vec!["cat", "dog", "bird", "mAP"]);
                assert!((values[0] - 1.0).abs() < 1e-10);
                assert_eq!(values[1], 0.0);
                assert!(values[2].is_nan());
                assert!((values[3] - 0.5).abs() < 1e-10);
            }
            other => panic!("expected per-class output, got {:?}", other),
        }
    }
}
