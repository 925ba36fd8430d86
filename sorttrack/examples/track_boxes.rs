use sorttrack::{Bbox, MultiObjectTracker, SortMultiTracker, TrackedBox};

fn print_tracks(frame: usize, tracks: &[TrackedBox]) {
    println!("Frame {}: {} tracks reported", frame, tracks.len());
    for t in tracks {
        println!(
            "  Track ID {}: [{:.1}, {:.1}, {:.1}, {:.1}]",
            t.id, t.bbox.xmin, t.bbox.ymin, t.bbox.xmax, t.bbox.ymax
        );
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut tracker: Box<dyn MultiObjectTracker> = Box::new(SortMultiTracker::default());

    let frames = vec![
        // Frame 1: initial detections
        vec![
            Bbox::new(10.0, 10.0, 50.0, 50.0),
            Bbox::new(100.0, 100.0, 150.0, 150.0),
            Bbox::new(200.0, 200.0, 240.0, 240.0),
        ],
        // Frame 2: objects move slightly
        vec![
            Bbox::new(12.0, 12.0, 52.0, 52.0),
            Bbox::new(102.0, 98.0, 152.0, 148.0),
            Bbox::new(205.0, 195.0, 245.0, 235.0),
        ],
        // Frame 3: second object missed by the detector
        vec![
            Bbox::new(14.0, 14.0, 54.0, 54.0),
            Bbox::new(210.0, 190.0, 250.0, 230.0),
        ],
        // Frame 4: second object is back, a new one appears
        vec![
            Bbox::new(16.0, 16.0, 56.0, 56.0),
            Bbox::new(106.0, 94.0, 156.0, 144.0),
            Bbox::new(215.0, 185.0, 255.0, 225.0),
            Bbox::new(300.0, 300.0, 340.0, 340.0),
        ],
    ];

    for (i, detections) in frames.iter().enumerate() {
        let tracks = tracker.update(detections);
        print_tracks(i + 1, &tracks);
    }

    println!("\nActive tracklets: {}", tracker.num_tracklets());
    println!("Total steps: {}", tracker.get_step_count());
}
