//! Synchronized session recording.
//!
//! A [`SessionManager`] owns a set of [`DataLogger`]s. Each logger buffers
//! rows in memory and appends them to its own CSV file on a timer. Rows
//! from different loggers share the `sync_id` column, taken from the
//! [`SessionClock`] that the fixed tick advances.

pub mod clock;
pub mod context;
pub mod encode;
pub mod logger;
pub mod loggers;
pub mod manager;
pub mod timer;

pub use clock::{create_shared_clock, SessionClock, SharedSessionClock};
pub use context::{Session, SessionContext};
pub use encode::{encode_quat, encode_vec2, encode_vec3, session_file_name, session_file_path};
pub use logger::{
    DataLogger, LogRecord, LoggerCore, LoggerError, LoggerState, ReceiveQuizUpdates,
    ReceiveRatingUpdates, COMMON_COLUMNS,
};
pub use loggers::{GazeLogger, QuizLogger, RatingLogger};
pub use manager::{LoggerStart, SessionError, SessionManager};
pub use timer::{FixedStep, Timer, TimerKind};
