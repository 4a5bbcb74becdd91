//! Demonstration of a complete recording session.
//!
//! This example shows how to:
//! 1. Feed eye-tracker samples from a device thread through a channel
//! 2. Fuse them into a gaze ray and hit-test a simple scene
//! 3. Drive the fixed and render ticks of a session
//! 4. Route quiz answers and ratings to their loggers
//! 5. Read back the CSV files that were written
//!
//! Run with: cargo run --example session_demo

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gaze_session_recorder::{
    config::Config,
    gaze::{GazeSampler, StaticScene},
    session::{FixedStep, SessionContext, SessionManager},
    tracker::{channel_tracker, EyeTracker, SimulatedTracker},
};
use glam::Vec3;

fn main() {
    println!("Gaze Session Recorder - Session Demo");
    println!("====================================");
    println!();

    let log_root = std::env::temp_dir().join("gaze-session-demo");
    let config = Config {
        log_root: log_root.clone(),
        ..Config::default()
    };

    // Device thread: a simulated headset pushing ~100 samples per second
    let (feed, mut tracker) = channel_tracker(8);
    tracker.start();
    let device_running = Arc::new(AtomicBool::new(true));
    let device_flag = device_running.clone();
    let device = thread::spawn(move || {
        let mut headset = SimulatedTracker::default();
        while device_flag.load(Ordering::SeqCst) {
            if let Ok(state) = headset.poll() {
                feed.push(state);
            }
            thread::sleep(Duration::from_millis(10));
        }
    });

    let ctx = SessionContext::with_sentinel(config.gaze.out_of_sight);
    let scene = StaticScene::wall(2.0).with_sphere(Vec3::new(0.3, 0.0, 1.5), 0.2, 1);
    let mut sampler = GazeSampler::new(
        tracker,
        scene,
        config.gaze.clone(),
        ctx.hub.clone(),
        ctx.stats.clone(),
    );
    let mut manager = SessionManager::with_default_loggers(ctx.clone(), &config);

    let starts = match manager.start_session("demo-subject", "demo") {
        Ok(starts) => starts,
        Err(e) => {
            eprintln!("Could not start session: {e}");
            return;
        }
    };
    let mut files = Vec::new();
    for start in starts {
        match start.result {
            Ok(path) => {
                println!("{:<8} -> {}", start.data_type, path.display());
                files.push(path);
            }
            Err(e) => println!("{:<8} failed: {e}", start.data_type),
        }
    }
    println!();

    // Two seconds of frames at the configured render rate
    let frame = config.render_interval;
    let mut fixed = FixedStep::new(config.fixed_timestep);
    let frames = (2.0 / frame.as_secs_f64()) as usize;
    for _ in 0..frames {
        thread::sleep(frame);
        sampler.sample();
        for _ in 0..fixed.advance(frame) {
            manager.fixed_tick();
        }
        manager.update(frame);
    }

    let target = ctx.hub.latest_target();
    println!(
        "Last target: {:?} (hit: {})",
        target.position.to_array(),
        target.hit
    );

    manager.receive_quiz_answer("Which shape was on the right?", "sphere", true);
    manager.receive_quiz_finished();
    manager.update_rating("comfort", 4);
    manager.finished_rating();
    manager.end_session();

    device_running.store(false, Ordering::SeqCst);
    sampler.tracker_mut().stop();
    let _ = device.join();

    println!();
    println!("{}", ctx.stats.summary());
    println!();

    for path in files {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let lines: Vec<&str> = content.lines().collect();
        println!("{} ({} rows)", path.display(), lines.len().saturating_sub(1));
        for line in lines.iter().take(3) {
            println!("  {line}");
        }
        println!();
    }
}
