//! Replay recorded detections through the counting engine.
//!
//! Usage: count_replay [frames.json] [config.json]
//!
//! `frames.json` holds one array of detections per frame. Without it a short
//! synthetic scene is replayed: a car and a pedestrian crossing, and a bus
//! that leaves and comes back long after its track expired.

use modalcount::{Bbox, CounterConfig, CountingEngine, Detection, FrameReport, RoadUserClass};
use std::env;

fn synthetic_frames() -> Vec<Vec<Detection>> {
    (0..30)
        .map(|frame| {
            let t = frame as f32;
            let mut detections = vec![
                Detection::new(
                    Bbox::new(20.0 + 6.0 * t, 200.0, 100.0 + 6.0 * t, 250.0),
                    0.92,
                    RoadUserClass::Car,
                ),
                Detection::new(
                    Bbox::new(400.0 - 2.0 * t, 80.0, 425.0 - 2.0 * t, 140.0),
                    0.81,
                    RoadUserClass::Person,
                ),
            ];
            // bus visible for frames 0-7 and again from frame 18
            if !(8..18).contains(&frame) {
                let bus = Bbox::new(500.0, 300.0, 620.0, 380.0);
                detections.push(Detection::new(bus, 0.88, RoadUserClass::Bus));
            }
            // a low-confidence ghost the pre-filter should drop
            if frame % 5 == 0 {
                let ghost = Bbox::new(50.0, 50.0, 70.0, 70.0);
                detections.push(Detection::new(ghost, 0.2, RoadUserClass::Truck));
            }
            detections
        })
        .collect()
}

fn print_report(report: &FrameReport) {
    println!("Frame {}: {} objects", report.frame, report.objects.len());
    for object in &report.objects {
        let label = match (object.class, object.display_id) {
            (Some(class), Some(n)) => format!("{} #{}", class, n),
            _ => "unclassified".to_string(),
        };
        println!(
            "  Track {} ({}): [{:.1}, {:.1}, {:.1}, {:.1}]",
            object.track_id,
            label,
            object.bbox.xmin,
            object.bbox.ymin,
            object.bbox.xmax,
            object.bbox.ymax
        );
    }
    println!("  Counts: {}", report.counts);
}

fn main() -> modalcount::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let frames = match args.get(1) {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            serde_json::from_str::<Vec<Vec<Detection>>>(&json)?
        }
        None => synthetic_frames(),
    };
    let config = match args.get(2) {
        Some(path) => CounterConfig::from_json_file(path)?,
        None => CounterConfig::default(),
    };

    let mut engine = CountingEngine::new(config)?;
    for detections in &frames {
        let report = engine.process_frame(detections);
        print_report(&report);
    }

    engine.log_summary();
    println!("\nTotal road users: {}", engine.counts().total());
    Ok(())
}
