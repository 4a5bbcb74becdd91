//! The concrete loggers recorded during a session.

use crate::config::LoggerConfig;
use crate::session::context::SessionContext;
use crate::session::encode::encode_vec3;
use crate::session::logger::{
    DataLogger, LoggerCore, LoggerError, ReceiveQuizUpdates, ReceiveRatingUpdates, NOT_AVAILABLE,
};
use tracing::debug;

pub const GAZE_COLUMNS: [&str; 5] = [
    "gaze_position",
    "gaze_direction",
    "gaze_confidence",
    "target_position",
    "target_hit",
];

pub const QUIZ_COLUMNS: [&str; 3] = ["question", "answer", "correct"];

pub const RATING_COLUMNS: [&str; 2] = ["Question", "Rating"];

/// Marker written in the question column when a quiz ends.
pub const QUIZ_FINISHED: &str = "quiz_finished";

/// Marker written in the question column when a questionnaire ends.
pub const RATING_FINISHED: &str = "rating_finished";

/// Logs the latest fused gaze every fixed tick.
pub struct GazeLogger {
    core: LoggerCore,
}

impl GazeLogger {
    pub fn new(config: LoggerConfig, ctx: SessionContext) -> Self {
        Self {
            core: LoggerCore::new(config, ctx, &GAZE_COLUMNS),
        }
    }

    fn capture_gaze(&mut self) {
        let snapshot = self.core.context().hub.snapshot();
        let gaze = snapshot.gaze;
        let target = snapshot.target;
        self.core
            .set_or_add("gaze_position", &encode_vec3(gaze.origin));
        self.core
            .set_or_add("gaze_direction", &encode_vec3(gaze.direction));
        self.core
            .set_or_add("gaze_confidence", &gaze.confidence.to_string());
        self.core
            .set_or_add("target_position", &encode_vec3(target.position));
        self.core
            .set_or_add("target_hit", &target.hit.to_string());
    }
}

impl DataLogger for GazeLogger {
    fn core(&self) -> &LoggerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut LoggerCore {
        &mut self.core
    }

    fn log_line(&mut self) -> Result<bool, LoggerError> {
        if self.core.is_recording() && !self.core.is_start_pending() {
            self.capture_gaze();
        }
        self.core.log_line()
    }
}

/// Logs one row per quiz answer.
pub struct QuizLogger {
    core: LoggerCore,
}

impl QuizLogger {
    pub fn new(config: LoggerConfig, ctx: SessionContext) -> Self {
        Self {
            core: LoggerCore::new(config, ctx, &QUIZ_COLUMNS),
        }
    }
}

impl DataLogger for QuizLogger {
    fn core(&self) -> &LoggerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut LoggerCore {
        &mut self.core
    }

    fn as_quiz_receiver(&mut self) -> Option<&mut dyn ReceiveQuizUpdates> {
        Some(self)
    }
}

impl ReceiveQuizUpdates for QuizLogger {
    fn receive_quiz_answer(
        &mut self,
        question: &str,
        answer: &str,
        correct: bool,
    ) -> Result<bool, LoggerError> {
        self.core.set_or_add("question", question);
        self.core.set_or_add("answer", answer);
        self.core.set_or_add("correct", &correct.to_string());
        self.core.log_line()
    }

    fn receive_quiz_finished(&mut self) -> Result<bool, LoggerError> {
        self.core.set_or_add("question", QUIZ_FINISHED);
        self.core.set_or_add("answer", NOT_AVAILABLE);
        self.core.set_or_add("correct", NOT_AVAILABLE);
        self.core.log_line()
    }
}

/// Logs questionnaire ratings, flushing each one straight to disk.
pub struct RatingLogger {
    core: LoggerCore,
}

impl RatingLogger {
    pub fn new(config: LoggerConfig, ctx: SessionContext) -> Self {
        Self {
            core: LoggerCore::new(config, ctx, &RATING_COLUMNS),
        }
    }

    fn log_and_flush(&mut self) -> Result<bool, LoggerError> {
        let logged = self.core.log_line()?;
        if logged {
            let written = self.core.flush()?;
            debug!(lines = written, "rating written");
        }
        Ok(logged)
    }
}

impl DataLogger for RatingLogger {
    fn core(&self) -> &LoggerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut LoggerCore {
        &mut self.core
    }

    fn as_rating_receiver(&mut self) -> Option<&mut dyn ReceiveRatingUpdates> {
        Some(self)
    }
}

impl ReceiveRatingUpdates for RatingLogger {
    fn update_rating(&mut self, name: &str, value: i32) -> Result<bool, LoggerError> {
        self.core.set_or_add("Question", name);
        self.core.set_or_add("Rating", &value.to_string());
        self.log_and_flush()
    }

    fn finished_rating(&mut self) -> Result<bool, LoggerError> {
        self.core.set_or_add("Question", RATING_FINISHED);
        self.core.set_or_add("Rating", NOT_AVAILABLE);
        self.log_and_flush()
    }
}
