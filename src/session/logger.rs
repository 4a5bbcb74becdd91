//! Buffered, interval-flushed CSV logging shared by every logger type.
//!
//! [`LoggerCore`] owns the ordered record, the line buffer, the session
//! file and the timers. Concrete loggers compose a core and implement
//! [`DataLogger`], overriding only the hooks they need.
//!
//! Lifecycle:
//!
//! ```text
//!            start_logging             stop_logging (flushes)
//!   Idle ───────────────────▶ Recording ───────────────────▶ Idle
//!     │                          │
//!     └──────────┬───────────────┘
//!                ▼  missing session / schema violation
//!             Disabled
//! ```

use crate::config::LoggerConfig;
use crate::session::context::SessionContext;
use crate::session::encode::{format_timestamp, monotonic_ticks, sanitize_cell, session_file_path};
use crate::session::timer::Timer;
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Columns every logger writes first, in this order.
pub const COMMON_COLUMNS: [&str; 5] = [
    "subject_id",
    "sync_id",
    "timestamp",
    "sys_ticks",
    "unity_log_time",
];

/// Placeholder for a column without a value yet.
pub const NOT_AVAILABLE: &str = "NA";

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("no active session: subject identity is not initialized")]
    MissingSession,

    #[error("{data_type} logger is disabled: {reason}")]
    Disabled { data_type: String, reason: String },

    #[error("{0} logger is already recording")]
    AlreadyRecording(String),

    #[error("schema violation in {data_type} logger: {detail}")]
    SchemaViolation { data_type: String, detail: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoggerError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// An ordered mapping of column name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogRecord {
    columns: Vec<(String, String)>,
}

impl LogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record with the given columns, all set to `NA`.
    pub fn with_columns<'a>(columns: impl IntoIterator<Item = &'a str>) -> Self {
        let mut record = Self::new();
        for column in columns {
            record.set_or_add(column, NOT_AVAILABLE);
        }
        record
    }

    /// Set a column, appending it if new. Returns whether it already existed.
    pub fn set_or_add(&mut self, key: &str, value: &str) -> bool {
        let value = sanitize_cell(value);
        match self.columns.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => {
                *existing = value;
                true
            }
            None => {
                self.columns.push((key.to_string(), value));
                false
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.columns.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    pub fn header_line(&self) -> String {
        self.column_names().collect::<Vec<_>>().join(",")
    }

    pub fn row_line(&self) -> String {
        self.columns
            .iter()
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    Idle,
    Recording,
    Disabled,
}

/// Shared recording machinery composed into every logger.
pub struct LoggerCore {
    config: LoggerConfig,
    ctx: SessionContext,
    record: LogRecord,
    /// Width of the header written for the current file
    header_width: Option<usize>,
    lines: Vec<String>,
    state: LoggerState,
    disabled_reason: Option<String>,
    file_path: Option<PathBuf>,
    started_at: Option<DateTime<Local>>,
    session_time: Duration,
    flush_timer: Option<Timer>,
    pending_start: Option<Timer>,
    flush_count: u64,
}

impl LoggerCore {
    /// Create a core whose schema is the common columns plus `columns`.
    pub fn new(config: LoggerConfig, ctx: SessionContext, columns: &[&str]) -> Self {
        let record = LogRecord::with_columns(COMMON_COLUMNS.iter().chain(columns).copied());
        Self {
            config,
            ctx,
            record,
            header_width: None,
            lines: Vec::new(),
            state: LoggerState::Idle,
            disabled_reason: None,
            file_path: None,
            started_at: None,
            session_time: Duration::ZERO,
            flush_timer: None,
            pending_start: None,
            flush_count: 0,
        }
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn data_type(&self) -> &str {
        &self.config.data_type
    }

    pub fn state(&self) -> LoggerState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == LoggerState::Recording
    }

    pub fn is_disabled(&self) -> bool {
        self.state == LoggerState::Disabled
    }

    pub fn disabled_reason(&self) -> Option<&str> {
        self.disabled_reason.as_deref()
    }

    /// True while a deferred start has not fired yet.
    pub fn is_start_pending(&self) -> bool {
        self.pending_start.is_some()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn record(&self) -> &LogRecord {
        &self.record
    }

    pub fn header_line(&self) -> String {
        self.record.header_line()
    }

    /// Lines waiting for the next flush.
    pub fn buffered_lines(&self) -> &[String] {
        &self.lines
    }

    /// Flushes that wrote to disk since this logger was created.
    pub fn flush_count(&self) -> u64 {
        self.flush_count
    }

    /// Whether a fixed tick should produce a line right now.
    pub fn wants_continuous_line(&self) -> bool {
        self.config.continuous && self.is_recording() && !self.is_start_pending()
    }

    pub fn start_logging(&mut self) -> Result<PathBuf, LoggerError> {
        match self.state {
            LoggerState::Disabled => return Err(self.disabled_error()),
            LoggerState::Recording => {
                return Err(LoggerError::AlreadyRecording(self.config.data_type.clone()))
            }
            LoggerState::Idle => {}
        }

        let Some(session) = self.ctx.session() else {
            return Err(self.disable(LoggerError::MissingSession));
        };

        let started_at = Local::now();
        let log_root = self.config.log_root.clone().unwrap_or(session.log_root);
        let activity = self.config.activity.clone().unwrap_or(session.activity);
        let username = self
            .config
            .username
            .clone()
            .unwrap_or(session.subject_id);
        let path = session_file_path(
            &log_root,
            &activity,
            &username,
            started_at,
            &self.config.data_type,
        );

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| LoggerError::io(dir, e))?;
        }

        self.file_path = Some(path.clone());
        self.header_width = None;
        self.started_at = Some(started_at);
        self.session_time = Duration::ZERO;
        self.lines.clear();
        self.state = LoggerState::Recording;
        self.flush_timer = Some(Timer::repeating(self.config.write_interval));

        if self.config.start_delay.is_zero() {
            if let Err(e) = self.write_header() {
                self.abort_recording();
                return Err(e);
            }
        } else {
            self.pending_start = Some(Timer::one_shot(self.config.start_delay));
            info!(
                data_type = %self.config.data_type,
                delay_secs = self.config.start_delay.as_secs_f64(),
                "deferring header until start delay elapses"
            );
        }

        info!(data_type = %self.config.data_type, path = %path.display(), "logging started");
        Ok(path)
    }

    /// Stop recording and flush whatever is buffered. Safe to call any time.
    pub fn stop_logging(&mut self) -> Result<(), LoggerError> {
        if self.state != LoggerState::Recording {
            return Ok(());
        }

        self.state = LoggerState::Idle;
        if let Some(mut pending) = self.pending_start.take() {
            pending.cancel();
            debug!(data_type = %self.config.data_type, "pending start cancelled");
        }
        if let Some(mut timer) = self.flush_timer.take() {
            timer.cancel();
        }

        let result = self.flush();
        self.header_width = None;
        result?;
        info!(data_type = %self.config.data_type, "logging stopped");
        Ok(())
    }

    /// Set or add a column value. Returns whether the column already existed.
    ///
    /// Adding a column after the header was written would break the file's
    /// schema, so it disables the logger instead.
    pub fn set_or_add(&mut self, key: &str, value: &str) -> bool {
        if self.record.contains(key) || self.header_width.is_none() {
            return self.record.set_or_add(key, value);
        }

        let violation = LoggerError::SchemaViolation {
            data_type: self.config.data_type.clone(),
            detail: format!("column '{key}' added after the header was written"),
        };
        self.disable(violation);
        false
    }

    /// Snapshot the current record into the buffer.
    ///
    /// Returns `Ok(false)` when nothing was recorded because the logger is
    /// idle or its deferred start is still pending.
    pub fn log_line(&mut self) -> Result<bool, LoggerError> {
        match self.state {
            LoggerState::Disabled => return Err(self.disabled_error()),
            LoggerState::Idle => return Ok(false),
            LoggerState::Recording if self.is_start_pending() => return Ok(false),
            LoggerState::Recording => {}
        }

        let Some(session) = self.ctx.session() else {
            return Err(self.disable(LoggerError::MissingSession));
        };

        self.record.set_or_add("subject_id", &session.subject_id);
        self.record
            .set_or_add("sync_id", &self.ctx.sync_id().to_string());
        self.record
            .set_or_add("timestamp", &format_timestamp(Local::now()));
        self.record
            .set_or_add("sys_ticks", &monotonic_ticks().to_string());
        self.record.set_or_add(
            "unity_log_time",
            &self.session_time.as_secs_f64().to_string(),
        );

        let width = self.record.len();
        if self.header_width != Some(width) {
            let violation = LoggerError::SchemaViolation {
                data_type: self.config.data_type.clone(),
                detail: format!("row has {width} columns, header has {:?}", self.header_width),
            };
            return Err(self.disable(violation));
        }

        self.lines.push(self.record.row_line());
        self.ctx.stats.record_line_logged();
        Ok(true)
    }

    /// Advance timers by one render tick.
    ///
    /// Fires the deferred start and the periodic flush. A write failure
    /// aborts this logger's recording and is returned to the caller.
    pub fn update(&mut self, dt: Duration) -> Result<(), LoggerError> {
        if !self.is_recording() {
            return Ok(());
        }
        self.session_time += dt;

        if let Some(pending) = self.pending_start.as_mut() {
            if pending.advance(dt) > 0 {
                self.pending_start = None;
                if let Err(e) = self.write_header() {
                    self.abort_recording();
                    return Err(e);
                }
                info!(data_type = %self.config.data_type, "deferred start fired");
            }
        }

        let due = self
            .flush_timer
            .as_mut()
            .map(|timer| timer.advance(dt) > 0)
            .unwrap_or(false);
        if due {
            if let Err(e) = self.flush() {
                self.abort_recording();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Append buffered lines to the session file and clear the buffer.
    ///
    /// An empty buffer never touches the file. Returns the number of lines
    /// written.
    pub fn flush(&mut self) -> Result<usize, LoggerError> {
        if self.lines.is_empty() || self.header_width.is_none() {
            return Ok(0);
        }
        let Some(path) = self.file_path.clone() else {
            return Ok(0);
        };

        let mut payload = String::new();
        for line in &self.lines {
            payload.push_str(line);
            payload.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LoggerError::io(&path, e))?;
        file.write_all(payload.as_bytes())
            .map_err(|e| LoggerError::io(&path, e))?;

        let count = self.lines.len();
        self.lines.clear();
        self.flush_count += 1;
        self.ctx.stats.record_flush(payload.len() as u64);
        debug!(data_type = %self.config.data_type, lines = count, "flushed");
        Ok(count)
    }

    fn write_header(&mut self) -> Result<(), LoggerError> {
        let Some(path) = self.file_path.clone() else {
            return Ok(());
        };
        let header = self.record.header_line();
        std::fs::write(&path, format!("{header}\n")).map_err(|e| LoggerError::io(&path, e))?;
        self.header_width = Some(self.record.len());
        Ok(())
    }

    fn abort_recording(&mut self) {
        warn!(data_type = %self.config.data_type, "recording aborted");
        self.state = LoggerState::Idle;
        self.header_width = None;
        self.pending_start = None;
        self.flush_timer = None;
    }

    fn disable(&mut self, cause: LoggerError) -> LoggerError {
        error!(data_type = %self.config.data_type, "disabling logger: {cause}");
        // Rows buffered so far still match the written header.
        if self.is_recording() {
            if let Err(e) = self.flush() {
                warn!(data_type = %self.config.data_type, "flush before disabling failed: {e}");
            }
        }
        self.state = LoggerState::Disabled;
        self.disabled_reason = Some(cause.to_string());
        self.pending_start = None;
        self.flush_timer = None;
        cause
    }

    fn disabled_error(&self) -> LoggerError {
        LoggerError::Disabled {
            data_type: self.config.data_type.clone(),
            reason: self
                .disabled_reason
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Receives answers from a quiz presenter.
pub trait ReceiveQuizUpdates {
    fn receive_quiz_answer(
        &mut self,
        question: &str,
        answer: &str,
        correct: bool,
    ) -> Result<bool, LoggerError>;

    fn receive_quiz_finished(&mut self) -> Result<bool, LoggerError>;
}

/// Receives ratings from a questionnaire presenter.
pub trait ReceiveRatingUpdates {
    fn update_rating(&mut self, name: &str, value: i32) -> Result<bool, LoggerError>;

    fn finished_rating(&mut self) -> Result<bool, LoggerError>;
}

/// Capability interface of a session logger.
///
/// Implementors provide access to their [`LoggerCore`]; the lifecycle
/// methods delegate to it unless overridden.
pub trait DataLogger {
    fn core(&self) -> &LoggerCore;

    fn core_mut(&mut self) -> &mut LoggerCore;

    fn start_logging(&mut self) -> Result<PathBuf, LoggerError> {
        self.core_mut().start_logging()
    }

    fn stop_logging(&mut self) -> Result<(), LoggerError> {
        self.core_mut().stop_logging()
    }

    fn log_line(&mut self) -> Result<bool, LoggerError> {
        self.core_mut().log_line()
    }

    fn set_or_add(&mut self, key: &str, value: &str) -> bool {
        self.core_mut().set_or_add(key, value)
    }

    fn is_recording(&self) -> bool {
        self.core().is_recording()
    }

    fn data_type(&self) -> &str {
        self.core().data_type()
    }

    /// Render tick: timers.
    fn update(&mut self, dt: Duration) -> Result<(), LoggerError> {
        self.core_mut().update(dt)
    }

    /// Fixed tick: one line when logging continuously.
    fn fixed_update(&mut self) -> Result<(), LoggerError> {
        if self.core().wants_continuous_line() {
            self.log_line()?;
        }
        Ok(())
    }

    fn as_quiz_receiver(&mut self) -> Option<&mut dyn ReceiveQuizUpdates> {
        None
    }

    fn as_rating_receiver(&mut self) -> Option<&mut dyn ReceiveRatingUpdates> {
        None
    }
}
