//! VOC evaluation example demonstrating the accumulator lifecycle.

use voc_eval::{
    load_from_string, metrics::iou::calculate_iou, threshold::generate_threshold_range,
    ApMethod, BoundingBox, MApConfig, MApMetric,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    println!("=== VOC mAP Evaluation Example ===\n");

    // Example 1: IoU Calculation
    println!("1. IoU Calculation");
    let bbox1 = BoundingBox::new(10.0, 10.0, 60.0, 60.0);
    let bbox2 = BoundingBox::new(30.0, 30.0, 80.0, 80.0);
    println!("   IoU between overlapping boxes: {:.4}", calculate_iou(&bbox1, &bbox2));
    println!();

    // Example 2: Load a batch
    println!("2. Loading a Batch");
    let batch_json = r#"{
        "images": [
            {
                "ground_truths": [
                    [0, 100.0, 100.0, 300.0, 250.0],
                    [1, 350.0, 200.0, 450.0, 320.0],
                    [1, 20.0, 20.0, 60.0, 50.0, 1]
                ],
                "detections": [
                    [0, 0.95, 105.0, 98.0, 302.0, 255.0],
                    [1, 0.80, 355.0, 205.0, 448.0, 318.0],
                    [1, 0.40, 352.0, 198.0, 452.0, 322.0],
                    [1, 0.30, 22.0, 21.0, 59.0, 50.0],
                    [-1, -1.0, -1.0, -1.0, -1.0, -1.0]
                ]
            },
            {
                "ground_truths": [
                    [0, 50.0, 60.0, 120.0, 200.0]
                ],
                "detections": [
                    [0, 0.60, 400.0, 400.0, 480.0, 470.0],
                    [1, 0.55, 48.0, 62.0, 118.0, 205.0]
                ]
            }
        ]
    }"#;
    let batch = load_from_string(batch_json)?;
    println!("   Loaded {} images", batch.len());
    println!();

    // Example 3: Per-class breakdown under both integration methods
    println!("3. Per-Class AP");
    for method in [ApMethod::Continuous, ApMethod::Voc07] {
        let config = MApConfig::new()
            .with_method(method)
            .with_class_names(["person", "car"]);
        let mut metric = MApMetric::new(config)?;
        metric.update(&batch.labels(), &batch.preds())?;

        println!("   [{}]", method);
        for (name, value) in metric.get().pairs() {
            println!("     {:<8} {:.4}", name, value);
        }
        metric.stats().log_summary();
    }
    println!();

    // Example 4: Sweep the IoU threshold
    println!("4. mAP across IoU thresholds");
    for ovp_thresh in generate_threshold_range(0.5, 0.95, 10)? {
        let mut metric = MApMetric::new(MApConfig::new().with_ovp_thresh(ovp_thresh))?;
        metric.update(&batch.labels(), &batch.preds())?;
        println!("   IoU >= {:.2}: mAP = {:.4}", ovp_thresh, metric.get().map());
    }

    Ok(())
}
