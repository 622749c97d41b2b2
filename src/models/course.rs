// src/models/course.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// Represents the 'courses' table in the database.
///
/// The curriculum/roadmap/resources/schedule columns are opaque JSONB
/// documents produced by the generation adapter; nothing in the backend
/// queries inside them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub level: Option<String>,
    pub reason: Option<String>,

    /// 'ongoing' or 'completed'; owned by the progress tracker.
    pub status: String,

    pub curriculum: Json<Value>,
    pub roadmap: Json<Value>,
    pub resources: Json<Value>,
    pub schedule: Json<Value>,

    /// Percentage in [0, 100]; owned by the progress tracker.
    pub progress: f64,
    pub total_topics: i64,
    pub completed_topics: i64,

    /// Append-only history of practice outcomes.
    pub learning_scores: Json<Vec<LearningScore>>,

    pub enrolled_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One entry in a course's learning-score series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningScore {
    pub session_id: i64,
    pub topic: Option<String>,
    pub score: f64,
    pub total_correct: i64,
    pub total_questions: i64,
}

/// DTO for enrolling in a new course.
#[derive(Debug, Deserialize, Validate)]
pub struct EnrollRequest {
    #[validate(length(min = 1, max = 255, message = "Subject is required."))]
    pub subject: String,
    /// beginner, intermediate, advanced
    #[validate(length(min = 1, max = 50))]
    pub level: Option<String>,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
    #[validate(range(min = 1, max = 52, message = "Duration must be between 1 and 52 weeks."))]
    pub preferred_duration_weeks: Option<i32>,
    #[validate(range(
        min = 0.25,
        max = 24.0,
        message = "Daily hours must be between 0.25 and 24."
    ))]
    pub daily_hours: Option<f64>,
}

/// Compact course row used in lists and the dashboard.
#[derive(Debug, Serialize)]
pub struct CourseSummary {
    pub id: i64,
    pub title: String,
    pub progress: f64,
    pub status: String,
    pub level: Option<String>,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            title: course.title.clone(),
            progress: course.progress,
            status: course.status.clone(),
            level: course.level.clone(),
            enrolled_at: course.enrolled_at,
            completed_at: course.completed_at,
        }
    }
}

/// Per-course slice of the dashboard's learning-curve chart.
#[derive(Debug, Serialize)]
pub struct LearningData {
    pub course_id: i64,
    pub title: String,
    pub progress: f64,
    pub scores: Vec<LearningScore>,
    pub status: String,
}

/// Response body for a topic toggle.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub topic_id: i64,
    pub is_completed: bool,
    pub course_progress: f64,
    pub course_status: String,
    pub completed_topics: i64,
    pub total_topics: i64,
}
