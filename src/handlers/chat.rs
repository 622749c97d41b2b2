// src/handlers/chat.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    ai::{LearnerProfile, SharedGenerator, chat},
    error::AppError,
    handlers::{auth::fetch_user, courses::fetch_owned_course},
    utils::jwt::Claims,
};

/// Request body for the learning-assistant chat.
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000, message = "Message is required."))]
    pub message: String,
    /// When present and owned by the caller, the course's details become the
    /// prompt context.
    pub course_id: Option<i64>,
    /// Fallback context when no course resolves.
    #[validate(length(max = 4000))]
    pub context: Option<String>,
}

/// Single-turn chat with the learning assistant. Always answers 200; a
/// generation failure turns into an apologetic reply, never an error.
pub async fn ask(
    State(pool): State<PgPool>,
    State(generator): State<SharedGenerator>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = fetch_user(&pool, claims.user_id()).await?;

    let mut course_context = String::new();
    if let Some(course_id) = payload.course_id {
        // An unresolvable course id just means no course context.
        let course = fetch_owned_course(&pool, course_id, user.id).await.ok();

        if let Some(course) = course {
            course_context = format!(
                "Course: {} ({}). Description: {}. Progress: {}%",
                course.title,
                course.level.as_deref().unwrap_or("unspecified"),
                course.description.as_deref().unwrap_or(""),
                course.progress,
            );
            if let Some(overview) = course.curriculum.0.get("overview").and_then(Value::as_str) {
                course_context.push_str(&format!(". Curriculum overview: {}", overview));
            }
        }
    }

    if course_context.is_empty() {
        course_context = payload.context.unwrap_or_default();
    }

    let profile = LearnerProfile {
        name: Some(user.name.clone()),
        educational_qualification: user.educational_qualification.clone(),
        educational_interests: user.educational_interests.clone(),
        ..Default::default()
    };

    let response = chat::reply(generator.as_ref(), &payload.message, &profile, &course_context).await;

    Ok(Json(json!({ "response": response })))
}
