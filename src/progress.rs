// src/progress.rs
//
// Course progress state machine. A course is either ongoing or completed;
// the only transition trigger is toggling one topic's completion flag, after
// which everything here is recomputed from a fresh count of the course's
// topics. No stored counter is trusted across calls.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const STATUS_ONGOING: &str = "ongoing";
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Ongoing,
    Completed,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Ongoing => STATUS_ONGOING,
            CourseStatus::Completed => STATUS_COMPLETED,
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of recomputing a course's progress fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub completed_topics: i64,
    pub total_topics: i64,
    /// Percentage in [0, 100]; 0 when the course has no topics.
    pub progress: f64,
    pub status: CourseStatus,
}

impl ProgressSnapshot {
    /// `completed_at` is set exactly when the course is completed.
    pub fn is_completed(&self) -> bool {
        self.status == CourseStatus::Completed
    }
}

/// Recomputes progress and status from fresh topic counts.
pub fn recompute(completed_topics: i64, total_topics: i64) -> ProgressSnapshot {
    let progress = if total_topics > 0 {
        completed_topics as f64 / total_topics as f64 * 100.0
    } else {
        0.0
    };

    let status = if total_topics > 0 && completed_topics == total_topics {
        CourseStatus::Completed
    } else {
        CourseStatus::Ongoing
    };

    ProgressSnapshot {
        completed_topics,
        total_topics,
        progress,
        status,
    }
}
