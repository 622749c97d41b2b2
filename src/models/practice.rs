// src/models/practice.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// Represents the 'practice_sessions' table. Created when questions are
/// generated; graded exactly once on submission.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PracticeSession {
    pub id: i64,
    pub course_id: i64,
    pub topic_id: Option<i64>,
    pub topic_title: Option<String>,
    pub questions: Json<Vec<Value>>,
    pub answers: Option<Json<Vec<String>>>,
    pub score: Option<f64>,
    /// Fixed at creation to the generated question count.
    pub total_questions: i64,
    pub correct_answers: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for requesting question generation. Either topic_id (resolved to its
/// title) or topic_title must be present.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuestionsRequest {
    pub course_id: i64,
    pub topic_id: Option<i64>,
    #[validate(length(max = 255))]
    pub topic_title: Option<String>,
}

/// DTO for submitting answers, positionally aligned with the session's
/// question list.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub session_id: i64,
    pub answers: Vec<String>,
}

/// Session summary row for the practice history view.
#[derive(Debug, Serialize, FromRow)]
pub struct PracticeHistoryEntry {
    pub id: i64,
    pub topic_title: Option<String>,
    pub score: Option<f64>,
    pub correct_answers: i64,
    pub total_questions: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
