//! Gaze Session Recorder CLI
//!
//! Runs simulated recording sessions and inspects the configuration.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gaze_session_recorder::{
    config::Config,
    gaze::{create_shared_hub_with_sentinel, GazeSampler, StaticScene},
    session::{create_shared_clock, DataLogger, FixedStep, SessionContext, SessionManager},
    stats::create_shared_stats_with_persistence,
    tracker::{SimulatedTracker, SimulatedTrackerConfig},
    VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gaze-recorder")]
#[command(version = VERSION)]
#[command(about = "Eye-tracking gaze fusion and synchronized session logging", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a session from the simulated tracker
    Record {
        /// Subject identifier written to every row
        subject: String,

        /// Activity name (session sub-directory); defaults to the config value
        #[arg(long)]
        activity: Option<String>,

        /// Session length in seconds
        #[arg(long, default_value = "10")]
        duration: f64,

        /// Root directory for session files; defaults to the config value
        #[arg(long)]
        log_root: Option<PathBuf>,

        /// Distance of the simulated wall in meters
        #[arg(long, default_value = "2.0")]
        wall_distance: f32,

        /// Rating logged before the session ends, as name=value (repeatable)
        #[arg(long = "rating")]
        ratings: Vec<String>,

        /// Quiz answer logged before the session ends, as question=answer=correct (repeatable)
        #[arg(long = "quiz")]
        quiz: Vec<String>,

        /// Inject poll failures, blinks and low-confidence frames
        #[arg(long)]
        faults: bool,
    },

    /// Show configuration
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        save: bool,
    },

    /// Print the CSV header of every logger
    Schema,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gaze_session_recorder=info,gaze_recorder=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Record {
            subject,
            activity,
            duration,
            log_root,
            wall_distance,
            ratings,
            quiz,
            faults,
        } => cmd_record(RecordArgs {
            subject,
            activity,
            duration,
            log_root,
            wall_distance,
            ratings,
            quiz,
            faults,
        }),
        Commands::Config { save } => cmd_config(save),
        Commands::Schema => cmd_schema(),
    }
}

struct RecordArgs {
    subject: String,
    activity: Option<String>,
    duration: f64,
    log_root: Option<PathBuf>,
    wall_distance: f32,
    ratings: Vec<String>,
    quiz: Vec<String>,
    faults: bool,
}

fn cmd_record(args: RecordArgs) -> Result<()> {
    if !args.duration.is_finite() || args.duration <= 0.0 {
        bail!("--duration must be a positive number of seconds");
    }
    let ratings = args
        .ratings
        .iter()
        .map(String::as_str)
        .map(parse_rating)
        .collect::<Result<Vec<_>>>()?;
    let answers = args
        .quiz
        .iter()
        .map(String::as_str)
        .map(parse_quiz)
        .collect::<Result<Vec<_>>>()?;

    let mut config = Config::load().unwrap_or_default();
    if let Some(root) = args.log_root {
        config.log_root = root;
    }
    let activity = args.activity.unwrap_or_else(|| config.activity.clone());
    config.validate().context("invalid configuration")?;
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    println!("Gaze Session Recorder v{VERSION}");
    println!();
    println!("  Subject:   {}", args.subject);
    println!("  Activity:  {activity}");
    println!("  Log root:  {}", config.log_root.display());
    println!("  Duration:  {}s", args.duration);
    println!(
        "  Frame:     {} (confidence >= {})",
        config.gaze.reference_frame.as_str(),
        config.gaze.confidence_threshold
    );
    println!();
    println!("Press Ctrl+C to stop early");
    println!();

    let stats = create_shared_stats_with_persistence(config.data_path.join("stats.json"));
    let ctx = SessionContext::from_parts(
        create_shared_clock(),
        create_shared_hub_with_sentinel(config.gaze.out_of_sight),
        stats.clone(),
    );

    let tracker_config = if args.faults {
        SimulatedTrackerConfig {
            poll_failure_every: Some(17),
            blink_every: Some(45),
            low_confidence_every: Some(7),
            ..SimulatedTrackerConfig::default()
        }
    } else {
        SimulatedTrackerConfig::default()
    };
    let mut sampler = GazeSampler::new(
        SimulatedTracker::new(tracker_config),
        StaticScene::wall(args.wall_distance),
        config.gaze.clone(),
        ctx.hub.clone(),
        stats.clone(),
    );

    let mut manager = SessionManager::with_default_loggers(ctx, &config);
    let starts = manager.start_session(&args.subject, &activity)?;
    for start in &starts {
        match &start.result {
            Ok(path) => println!("  {:<8} -> {}", start.data_type, path.display()),
            Err(e) => eprintln!("  {:<8} failed: {e}", start.data_type),
        }
    }
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")?;

    let session_length = Duration::from_secs_f64(args.duration);
    let mut fixed = FixedStep::new(config.fixed_timestep);
    let started = Instant::now();
    let mut last_frame = started;

    while running.load(Ordering::SeqCst) && started.elapsed() < session_length {
        thread::sleep(config.render_interval);
        let now = Instant::now();
        let dt = now - last_frame;
        last_frame = now;

        sampler.sample();
        for _ in 0..fixed.advance(dt) {
            manager.fixed_tick();
        }
        manager.update(dt);
    }

    for (question, answer, correct) in &answers {
        if manager.receive_quiz_answer(question, answer, *correct) == 0 {
            eprintln!("Warning: quiz answer '{question}' was not recorded");
        }
    }
    if !answers.is_empty() {
        manager.receive_quiz_finished();
    }
    for (name, value) in &ratings {
        if manager.update_rating(name, *value) == 0 {
            eprintln!("Warning: rating '{name}' was not recorded");
        }
    }
    if !ratings.is_empty() {
        manager.finished_rating();
    }

    let failures = manager.end_session();
    for (data_type, e) in &failures {
        eprintln!("Warning: {data_type} logger did not flush cleanly: {e}");
    }

    info!(sync_id = manager.context().sync_id(), "recording finished");
    println!();
    println!("{}", stats.summary());

    if let Err(e) = stats.save() {
        eprintln!("Warning: Could not save statistics: {e}");
    }
    Ok(())
}

fn cmd_config(save: bool) -> Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    if save {
        config.save().context("saving configuration")?;
        println!();
        println!("Saved.");
    }
    Ok(())
}

fn cmd_schema() -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let manager = SessionManager::with_default_loggers(SessionContext::new(), &config);

    for logger in manager.loggers() {
        println!("{}: {}", logger.data_type(), logger.core().header_line());
    }
    Ok(())
}

/// Parse `name=value` into a rating.
fn parse_rating(s: &str) -> Result<(String, i32)> {
    let Some((name, value)) = s.rsplit_once('=') else {
        bail!("rating '{s}' must look like name=value");
    };
    let value = value
        .trim()
        .parse::<i32>()
        .with_context(|| format!("rating '{s}' has a non-integer value"))?;
    Ok((name.trim().to_string(), value))
}

/// Parse `question=answer=correct` into a quiz answer.
fn parse_quiz(s: &str) -> Result<(String, String, bool)> {
    let mut parts = s.rsplitn(3, '=');
    let (Some(correct), Some(answer), Some(question)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("quiz answer '{s}' must look like question=answer=correct");
    };
    let correct = correct
        .trim()
        .parse::<bool>()
        .with_context(|| format!("quiz answer '{s}' must end in true or false"))?;
    Ok((question.to_string(), answer.to_string(), correct))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("comfort=4").unwrap(), ("comfort".to_string(), 4));
        assert!(parse_rating("comfort").is_err());
        assert!(parse_rating("comfort=high").is_err());
    }

    #[test]
    fn test_parse_quiz() {
        assert_eq!(
            parse_quiz("2+2=4=true").unwrap(),
            ("2+2".to_string(), "4".to_string(), true)
        );
        assert!(parse_quiz("2+2=4").is_err());
        assert!(parse_quiz("a=b=maybe").is_err());
    }
}
