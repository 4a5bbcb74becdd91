//! Cell encoding and file naming for session CSV files.

use chrono::{DateTime, Local};
use glam::{Quat, Vec2, Vec3};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

/// Encode a vector as `x|y|z` so it fits in one CSV cell.
pub fn encode_vec3(v: Vec3) -> String {
    format!("{}|{}|{}", v.x, v.y, v.z)
}

pub fn encode_vec2(v: Vec2) -> String {
    format!("{}|{}", v.x, v.y)
}

/// Encode a quaternion as `x|y|z|w`.
pub fn encode_quat(q: Quat) -> String {
    format!("{}|{}|{}|{}", q.x, q.y, q.z, q.w)
}

/// Make a value safe for an unquoted CSV cell.
///
/// Commas would shift every later column, so they become semicolons;
/// line breaks become spaces.
pub fn sanitize_cell(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            ',' => ';',
            '\n' | '\r' => ' ',
            c => c,
        })
        .collect()
}

/// Wall-clock timestamp column, `yyyy-MM-dd HH:mm:ss.fff`.
pub fn format_timestamp(time: DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Monotonic 100 ns ticks since the first call in this process.
pub fn monotonic_ticks() -> u64 {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    let elapsed = ANCHOR.get_or_init(Instant::now).elapsed();
    (elapsed.as_nanos() / 100) as u64
}

/// `<username> <M-D H-m>-<dataType>.csv`, without zero padding.
pub fn session_file_name(username: &str, started_at: DateTime<Local>, data_type: &str) -> String {
    format!(
        "{} {}-{}.csv",
        username,
        started_at.format("%-m-%-d %-H-%-M"),
        data_type
    )
}

/// `<logPath>/<activity>/<username> <M-D H-m>-<dataType>.csv`
pub fn session_file_path(
    log_root: &Path,
    activity: &str,
    username: &str,
    started_at: DateTime<Local>,
    data_type: &str,
) -> PathBuf {
    log_root
        .join(activity)
        .join(session_file_name(username, started_at, data_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_vector_encoding() {
        assert_eq!(encode_vec3(Vec3::new(1.0, -2.5, 0.25)), "1|-2.5|0.25");
        assert_eq!(encode_vec2(Vec2::new(3.0, 4.0)), "3|4");
        assert_eq!(encode_quat(Quat::IDENTITY), "0|0|0|1");
    }

    #[test]
    fn test_sanitize_cell() {
        assert_eq!(sanitize_cell("red, green\nblue"), "red; green blue");
        assert_eq!(sanitize_cell("plain"), "plain");
    }

    #[test]
    fn test_file_name_has_no_padding() {
        let start = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(session_file_name("P01", start, "gaze"), "P01 3-7 9-5-gaze.csv");
    }

    #[test]
    fn test_file_path_layout() {
        let start = Local.with_ymd_and_hms(2024, 11, 23, 14, 30, 0).unwrap();
        let path = session_file_path(Path::new("logs"), "ishihara", "P02", start, "quiz");
        assert_eq!(
            path,
            Path::new("logs").join("ishihara").join("P02 11-23 14-30-quiz.csv")
        );
    }

    #[test]
    fn test_timestamp_format() {
        let time = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(time), "2024-01-02 03:04:05.000");
    }

    #[test]
    fn test_monotonic_ticks_do_not_decrease() {
        let first = monotonic_ticks();
        let second = monotonic_ticks();
        assert!(second >= first);
    }
}
