//! Session root: owns the loggers and broadcasts lifecycle and events.

use crate::config::Config;
use crate::session::context::{Session, SessionContext};
use crate::session::logger::{
    DataLogger, LoggerError, ReceiveQuizUpdates, ReceiveRatingUpdates,
};
use crate::session::loggers::{GazeLogger, QuizLogger, RatingLogger};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a session for subject '{0}' is already active")]
    AlreadyActive(String),

    #[error("subject id must not be empty")]
    EmptySubject,
}

/// Outcome of starting one logger.
#[derive(Debug)]
pub struct LoggerStart {
    pub data_type: String,
    pub result: Result<PathBuf, LoggerError>,
}

impl LoggerStart {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct SessionManager {
    ctx: SessionContext,
    log_root: PathBuf,
    loggers: Vec<Box<dyn DataLogger>>,
}

impl SessionManager {
    pub fn new(ctx: SessionContext, log_root: PathBuf) -> Self {
        Self {
            ctx,
            log_root,
            loggers: Vec::new(),
        }
    }

    /// Manager with the quiz, gaze and rating loggers from `config`.
    pub fn with_default_loggers(ctx: SessionContext, config: &Config) -> Self {
        let mut manager = Self::new(ctx.clone(), config.log_root.clone());
        manager.register(Box::new(QuizLogger::new(
            config.loggers.quiz.clone(),
            ctx.clone(),
        )));
        manager.register(Box::new(GazeLogger::new(
            config.loggers.gaze.clone(),
            ctx.clone(),
        )));
        manager.register(Box::new(RatingLogger::new(
            config.loggers.rating.clone(),
            ctx,
        )));
        manager
    }

    /// Add a logger. Lifecycle calls reach loggers in registration order.
    pub fn register(&mut self, logger: Box<dyn DataLogger>) {
        self.loggers.push(logger);
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn loggers(&self) -> &[Box<dyn DataLogger>] {
        &self.loggers
    }

    pub fn loggers_mut(&mut self) -> &mut [Box<dyn DataLogger>] {
        &mut self.loggers
    }

    pub fn session(&self) -> Option<Session> {
        self.ctx.session()
    }

    pub fn is_active(&self) -> bool {
        self.ctx.session().is_some()
    }

    /// Start a session and every registered logger.
    ///
    /// A logger that fails to start is reported in the result and skipped;
    /// the others keep recording.
    pub fn start_session(
        &mut self,
        subject_id: &str,
        activity: &str,
    ) -> Result<Vec<LoggerStart>, SessionError> {
        let subject_id = subject_id.trim();
        if subject_id.is_empty() {
            return Err(SessionError::EmptySubject);
        }
        if let Some(active) = self.ctx.session() {
            return Err(SessionError::AlreadyActive(active.subject_id));
        }

        let session = Session::new(subject_id, activity, self.log_root.clone());
        info!(
            session_id = %session.session_id,
            subject = %session.subject_id,
            activity = %session.activity,
            "session started"
        );
        self.ctx.set_session(Some(session));

        let mut starts = Vec::with_capacity(self.loggers.len());
        for logger in &mut self.loggers {
            let result = logger.start_logging();
            if let Err(e) = &result {
                warn!(data_type = %logger.data_type(), "logger failed to start: {e}");
            }
            starts.push(LoggerStart {
                data_type: logger.data_type().to_string(),
                result,
            });
        }
        Ok(starts)
    }

    /// Stop every logger, flushing their buffers, and clear the session.
    pub fn end_session(&mut self) -> Vec<(String, LoggerError)> {
        let mut failures = Vec::new();
        for logger in &mut self.loggers {
            if let Err(e) = logger.stop_logging() {
                error!(data_type = %logger.data_type(), "flush on stop failed: {e}");
                failures.push((logger.data_type().to_string(), e));
            }
        }
        if let Some(session) = self.ctx.session() {
            info!(session_id = %session.session_id, "session ended");
        }
        self.ctx.set_session(None);
        failures
    }

    /// Fixed tick: advance the sync counter, then let continuous loggers
    /// record. Returns the new sync id.
    pub fn fixed_tick(&mut self) -> u64 {
        let sync_id = self.ctx.clock.tick();
        for logger in &mut self.loggers {
            if let Err(e) = logger.fixed_update() {
                warn!(data_type = %logger.data_type(), "fixed update failed: {e}");
            }
        }
        sync_id
    }

    /// Render tick: advance every logger's timers.
    pub fn update(&mut self, dt: Duration) {
        for logger in &mut self.loggers {
            if let Err(e) = logger.update(dt) {
                warn!(data_type = %logger.data_type(), "update failed: {e}");
            }
        }
    }

    /// Route a quiz answer to every logger that records quizzes.
    ///
    /// Returns how many loggers recorded it. A receiver that is not yet
    /// recording (deferred start pending, or stopped) drops the answer with
    /// a warning.
    pub fn receive_quiz_answer(&mut self, question: &str, answer: &str, correct: bool) -> usize {
        self.route_quiz("quiz answer", |receiver| {
            receiver.receive_quiz_answer(question, answer, correct)
        })
    }

    pub fn receive_quiz_finished(&mut self) -> usize {
        self.route_quiz("quiz end", |receiver| receiver.receive_quiz_finished())
    }

    /// Route a rating to every logger that records ratings.
    ///
    /// Returns how many loggers recorded it; see [`Self::receive_quiz_answer`].
    pub fn update_rating(&mut self, name: &str, value: i32) -> usize {
        self.route_rating("rating", |receiver| receiver.update_rating(name, value))
    }

    pub fn finished_rating(&mut self) -> usize {
        self.route_rating("rating end", |receiver| receiver.finished_rating())
    }

    fn route_quiz(
        &mut self,
        event: &str,
        mut deliver: impl FnMut(&mut dyn ReceiveQuizUpdates) -> Result<bool, LoggerError>,
    ) -> usize {
        let mut recorded = 0;
        for logger in &mut self.loggers {
            let data_type = logger.data_type().to_string();
            if let Some(receiver) = logger.as_quiz_receiver() {
                recorded += report_delivery(event, &data_type, deliver(receiver));
            }
        }
        recorded
    }

    fn route_rating(
        &mut self,
        event: &str,
        mut deliver: impl FnMut(&mut dyn ReceiveRatingUpdates) -> Result<bool, LoggerError>,
    ) -> usize {
        let mut recorded = 0;
        for logger in &mut self.loggers {
            let data_type = logger.data_type().to_string();
            if let Some(receiver) = logger.as_rating_receiver() {
                recorded += report_delivery(event, &data_type, deliver(receiver));
            }
        }
        recorded
    }
}

fn report_delivery(event: &str, data_type: &str, result: Result<bool, LoggerError>) -> usize {
    match result {
        Ok(true) => 1,
        Ok(false) => {
            warn!(%data_type, "{event} dropped: logger is not recording");
            0
        }
        Err(e) => {
            warn!(%data_type, "{event} not recorded: {e}");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(root: &std::path::Path) -> SessionManager {
        let config = Config {
            log_root: root.to_path_buf(),
            ..Config::default()
        };
        SessionManager::with_default_loggers(SessionContext::new(), &config)
    }

    #[test]
    fn test_registration_order() {
        let dir = TempDir::new().unwrap();
        let manager = manager(dir.path());
        let order: Vec<&str> = manager.loggers().iter().map(|l| l.data_type()).collect();
        assert_eq!(order, vec!["quiz", "gaze", "Rating"]);
    }

    #[test]
    fn test_start_and_end_session() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(dir.path());

        let starts = manager.start_session("P01", "walk").unwrap();
        assert_eq!(starts.len(), 3);
        assert!(starts.iter().all(LoggerStart::is_ok));
        assert!(manager.is_active());
        assert!(manager.loggers().iter().all(|l| l.is_recording()));

        let failures = manager.end_session();
        assert!(failures.is_empty());
        assert!(!manager.is_active());
        assert!(manager.loggers().iter().all(|l| !l.is_recording()));
    }

    #[test]
    fn test_rejects_empty_subject_and_double_start() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(dir.path());
        assert!(matches!(
            manager.start_session("  ", "walk"),
            Err(SessionError::EmptySubject)
        ));
        manager.start_session("P01", "walk").unwrap();
        assert!(matches!(
            manager.start_session("P02", "walk"),
            Err(SessionError::AlreadyActive(_))
        ));
    }

    #[test]
    fn test_events_report_recorded_count() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(dir.path());
        assert_eq!(manager.update_rating("comfort", 3), 0);
        assert_eq!(manager.receive_quiz_answer("q", "a", true), 0);

        manager.start_session("P01", "walk").unwrap();
        assert_eq!(manager.update_rating("comfort", 3), 1);
        assert_eq!(manager.receive_quiz_answer("q", "a", true), 1);
        assert_eq!(manager.receive_quiz_finished(), 1);
        assert_eq!(manager.finished_rating(), 1);
    }

    #[test]
    fn test_rating_during_deferred_start_is_reported_dropped() {
        let dir = TempDir::new().unwrap();
        let mut config = Config {
            log_root: dir.path().to_path_buf(),
            ..Config::default()
        };
        config.loggers.rating.start_delay = Duration::from_secs(2);
        let mut manager = SessionManager::with_default_loggers(SessionContext::new(), &config);
        manager.start_session("P01", "walk").unwrap();

        assert_eq!(manager.update_rating("comfort", 4), 0);
        manager.update(Duration::from_secs(2));
        assert_eq!(manager.update_rating("comfort", 4), 1);
    }

    #[test]
    fn test_fixed_tick_counts_without_session() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(dir.path());
        for expected in 1..=4 {
            assert_eq!(manager.fixed_tick(), expected);
        }
        assert_eq!(manager.context().sync_id(), 4);
    }
}
