// src/models/topic.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, types::Json};

/// Represents the 'topics' table: one scheduled learning unit within a
/// course. Created in bulk at enrollment; only the completion flag and
/// timestamp ever change afterwards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub course_id: i64,
    pub week: i32,
    pub day: i32,
    pub title: String,
    pub description: Option<String>,
    pub resources: Json<Value>,
    pub duration_minutes: i32,
    pub order_index: i32,
    pub is_completed: bool,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}
