//! Integration tests for the complete accumulate-then-score pipeline.

use voc_eval::metrics::ap::{continuous_ap, eleven_point_ap};
use voc_eval::types::MetricOutput;
use voc_eval::{ApMethod, BoundingBox, Detection, GroundTruth, MApConfig, MApMetric};

fn gt(class_id: i64, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> GroundTruth {
    GroundTruth::new(class_id, BoundingBox::new(xmin, ymin, xmax, ymax))
}

fn det(class_id: i64, score: f64, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Detection {
    Detection::new(class_id, score, BoundingBox::new(xmin, ymin, xmax, ymax))
}

fn metric_with(method: ApMethod) -> MApMetric {
    MApMetric::new(MApConfig::new().with_method(method)).unwrap()
}

#[test]
fn test_perfect_predictions() {
    // Perfect predictions should give mAP = 1.0
    for method in [ApMethod::Continuous, ApMethod::Voc07] {
        let mut metric = metric_with(method);
        metric
            .update_image(
                &[gt(1, 10.0, 10.0, 60.0, 60.0), gt(1, 100.0, 100.0, 150.0, 150.0)],
                &[det(1, 0.95, 10.0, 10.0, 60.0, 60.0), det(1, 0.90, 100.0, 100.0, 150.0, 150.0)],
            )
            .unwrap();
        metric
            .update_image(
                &[gt(2, 0.0, 0.0, 20.0, 20.0)],
                &[det(2, 0.85, 0.0, 0.0, 20.0, 20.0)],
            )
            .unwrap();

        let map = metric.get().map();
        assert!((map - 1.0).abs() < 1e-10, "{}: mAP should be 1.0, got {}", method, map);
        assert!((metric.class_ap(1) - 1.0).abs() < 1e-10);
        assert!((metric.class_ap(2) - 1.0).abs() < 1e-10);
    }
}

#[test]
fn test_no_detections_for_annotated_class() {
    let mut metric = MApMetric::default();
    metric.update_image(&[gt(3, 0.0, 0.0, 10.0, 10.0)], &[]).unwrap();

    assert_eq!(metric.class_ap(3), 0.0);
    assert_eq!(metric.get().map(), 0.0);
}

#[test]
fn test_unseen_class_is_undefined_and_excluded() {
    let config = MApConfig::new().with_class_names(["cat", "dog"]);
    let mut metric = MApMetric::new(config).unwrap();
    metric.update_image(&[gt(0, 0.0, 0.0, 10.0, 10.0)], &[det(0, 0.9, 0.0, 0.0, 10.0, 10.0)]).unwrap();

    let output = metric.get();
    assert!(output.value_of("dog").unwrap().is_nan());
    assert!((output.value_of("cat").unwrap() - 1.0).abs() < 1e-10);
    // The undefined dog slot does not drag the mean down
    assert!((output.map() - 1.0).abs() < 1e-10);
}

#[test]
fn test_duplicate_detection_is_false_positive() {
    let mut metric = MApMetric::default();
    metric
        .update_image(
            &[gt(0, 0.0, 0.0, 10.0, 10.0)],
            &[det(0, 0.6, 0.0, 0.0, 10.0, 10.0), det(0, 0.9, 1.0, 1.0, 10.0, 10.0)],
        )
        .unwrap();

    let stats = metric.stats();
    assert_eq!(stats.true_positives, 1);
    assert_eq!(stats.false_positives, 1);

    // The higher-scoring detection took the ground truth: precision 1.0 at full recall
    assert!((metric.class_ap(0) - 1.0).abs() < 1e-10);
}

#[test]
fn test_difficult_ground_truth_ignored() {
    let mut metric = MApMetric::default();
    metric
        .update_image(
            &[gt(0, 0.0, 0.0, 10.0, 10.0), gt(0, 50.0, 50.0, 60.0, 60.0).difficult()],
            &[det(0, 0.9, 50.0, 50.0, 60.0, 60.0), det(0, 0.8, 0.0, 0.0, 10.0, 10.0)],
        )
        .unwrap();

    // The detection on the difficult box counts nowhere; the other one is a
    // perfect hit on the only countable ground truth.
    assert!((metric.class_ap(0) - 1.0).abs() < 1e-10);
    assert_eq!(metric.stats().skipped_difficult, 1);
    assert_eq!(metric.stats().ground_truths, 1);
}

#[test]
fn test_difficult_ground_truth_used() {
    let config = MApConfig::new().with_use_difficult(true);
    let mut metric = MApMetric::new(config).unwrap();
    metric
        .update_image(
            &[gt(0, 0.0, 0.0, 10.0, 10.0), gt(0, 50.0, 50.0, 60.0, 60.0).difficult()],
            &[det(0, 0.9, 50.0, 50.0, 60.0, 60.0)],
        )
        .unwrap();

    assert!((metric.class_ap(0) - 0.5).abs() < 1e-10);
    assert_eq!(metric.stats().ground_truths, 2);
}

#[test]
fn test_jagged_curve_regression() {
    // Records sorted by score: TP, FP, FP, TP over two ground truths.
    // recall    = [0.5, 0.5, 0.5, 1.0]
    // precision = [1.0, 0.5, 1/3, 0.5]
    let gts = [gt(0, 0.0, 0.0, 10.0, 10.0), gt(0, 100.0, 100.0, 110.0, 110.0)];
    let dets = [
        det(0, 0.9, 0.0, 0.0, 10.0, 10.0),
        det(0, 0.8, 300.0, 300.0, 310.0, 310.0),
        det(0, 0.7, 400.0, 400.0, 410.0, 410.0),
        det(0, 0.6, 100.0, 100.0, 110.0, 110.0),
    ];

    let mut continuous = metric_with(ApMethod::Continuous);
    let mut voc07 = metric_with(ApMethod::Voc07);
    continuous.update_image(&gts, &dets).unwrap();
    voc07.update_image(&gts, &dets).unwrap();

    assert!((continuous.get().map() - 0.75).abs() < 1e-10);
    assert!((voc07.get().map() - 17.0 / 22.0).abs() < 1e-10);
}

#[test]
fn test_smooth_curve_methods_agree() {
    // precision = 1 - recall / 2, sampled at 1000 recall steps.
    // Closed forms: continuous = 1 - 1001 / 4000, 11-point = 0.75.
    let recall: Vec<f64> = (1..=1000).map(|k| k as f64 / 1000.0).collect();
    let precision: Vec<f64> = recall.iter().map(|r| 1.0 - r / 2.0).collect();

    let ap_c = continuous_ap(&recall, &precision);
    let ap_v = eleven_point_ap(&recall, &precision);
    assert!((ap_c - (1.0 - 1001.0 / 4000.0)).abs() < 1e-9);
    assert!((ap_v - 0.75).abs() < 1e-9);
    assert!((ap_c - ap_v).abs() < 1e-3, "continuous {} vs voc07 {}", ap_c, ap_v);
}

#[test]
fn test_rows_and_typed_updates_agree() {
    let mut from_rows = MApMetric::default();
    from_rows
        .update(
            &[vec![vec![0.0, 0.0, 0.0, 10.0, 10.0], vec![1.0, 20.0, 20.0, 40.0, 40.0, 1.0]]],
            &[vec![vec![0.0, 0.7, 1.0, 1.0, 10.0, 10.0], vec![1.0, 0.4, 20.0, 20.0, 40.0, 40.0]]],
        )
        .unwrap();

    let mut from_types = MApMetric::default();
    from_types
        .update_image(
            &[gt(0, 0.0, 0.0, 10.0, 10.0), gt(1, 20.0, 20.0, 40.0, 40.0).difficult()],
            &[det(0, 0.7, 1.0, 1.0, 10.0, 10.0), det(1, 0.4, 20.0, 20.0, 40.0, 40.0)],
        )
        .unwrap();

    assert_eq!(from_rows.get(), from_types.get());
    assert_eq!(from_rows.stats(), from_types.stats());
}

#[test]
fn test_per_class_output_shape() {
    let config = MApConfig::voc07().with_class_names(["a", "b", "c"]);
    let metric = MApMetric::new(config).unwrap();

    match metric.get() {
        MetricOutput::PerClass { names, values } => {
            assert_eq!(names.len(), 4);
            assert_eq!(values.len(), 4);
            assert_eq!(names.last().map(String::as_str), Some("mAP"));
            assert!(values.iter().all(|v| v.is_nan()));
        }
        other => panic!("expected per-class output, got {:?}", other),
    }
}
