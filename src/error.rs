use crate::data::{CourseCode, SemesterId, Weekday};
use thiserror::Error;

/// Problems found while loading or validating a catalogue file.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("failed to read catalogue: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalogue: {0}")]
    Json(#[from] serde_json::Error),

    #[error("semester {semester}, course {course}: time block ends at {end} but starts at {start}")]
    InvalidTimeRange {
        semester: SemesterId,
        course: CourseCode,
        start: u32,
        end: u32,
    },

    #[error("semester {semester}, course {course}: weekday {day} is outside 1..=5")]
    InvalidWeekday {
        semester: SemesterId,
        course: CourseCode,
        day: Weekday,
    },

    #[error("semester {semester}: course {course} is listed more than once")]
    DuplicateCourse {
        semester: SemesterId,
        course: CourseCode,
    },
}

/// Reasons a search cannot be started.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("unknown semester {0}")]
    UnknownSemester(SemesterId),

    #[error("unknown course {course} in semester {semester}")]
    UnknownCourse {
        semester: SemesterId,
        course: CourseCode,
    },

    #[error("selection group {0} has no candidate sections")]
    EmptyGroup(usize),

    #[error("time block on weekday {day} falls outside the school week")]
    InvalidWeekday { day: Weekday },

    #[error("time block on slot {slot} spans {start}..{end}, which is not a valid interval")]
    InvalidBlock { slot: usize, start: u32, end: u32 },

    #[error("search worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}
