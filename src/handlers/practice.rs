// src/handlers/practice.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::{Value, json};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    ai::{SharedGenerator, practice},
    error::AppError,
    handlers::courses::fetch_owned_course,
    models::practice::{
        GenerateQuestionsRequest, PracticeHistoryEntry, PracticeSession, SubmitAnswersRequest,
    },
    models::course::LearningScore,
    utils::jwt::Claims,
};

const SESSION_COLUMNS: &str = "id, course_id, topic_id, topic_title, questions, answers, score, \
     total_questions, correct_answers, created_at";

/// Generates practice questions for a topic and opens a session.
///
/// `total_questions` is fixed here to the generated count and never changes
/// after grading.
pub async fn generate_questions(
    State(pool): State<PgPool>,
    State(generator): State<SharedGenerator>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GenerateQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let course = fetch_owned_course(&pool, payload.course_id, claims.user_id()).await?;

    // A topic_id wins over a caller-supplied title when it resolves.
    let mut topic_title = payload.topic_title.clone();
    if let Some(topic_id) = payload.topic_id {
        let resolved: Option<String> =
            sqlx::query_scalar("SELECT title FROM topics WHERE id = $1 AND course_id = $2")
                .bind(topic_id)
                .bind(course.id)
                .fetch_optional(&pool)
                .await?;
        if let Some(title) = resolved {
            topic_title = Some(title);
        }
    }

    let topic_title = topic_title
        .filter(|t| !t.trim().is_empty())
        .ok_or(AppError::BadRequest("Topic title is required".to_string()))?;

    let result = practice::generate_questions(
        generator.as_ref(),
        &course.title,
        &topic_title,
        course.level.as_deref().unwrap_or("beginner"),
        course.description.as_deref().unwrap_or(""),
    )
    .await;

    let questions: Vec<Value> = result
        .get("questions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    // Hard failure: an error with nothing usable alongside it.
    if questions.is_empty() {
        if let Some(error) = result.get("error").and_then(Value::as_str) {
            return Err(AppError::Generation(error.to_string()));
        }
        return Err(AppError::Generation(
            "Question generation produced no questions".to_string(),
        ));
    }

    let session = sqlx::query_as::<_, PracticeSession>(&format!(
        r#"
        INSERT INTO practice_sessions (course_id, topic_id, topic_title, questions, total_questions)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(course.id)
    .bind(payload.topic_id)
    .bind(&topic_title)
    .bind(SqlJson(questions.clone()))
    .bind(questions.len() as i64)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "session_id": session.id,
        "topic_title": topic_title,
        "questions": questions,
    })))
}

/// Grades a submitted answer sheet and appends the outcome to the course's
/// learning-score series.
pub async fn submit_answers(
    State(pool): State<PgPool>,
    State(generator): State<SharedGenerator>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = sqlx::query_as::<_, PracticeSession>(&format!(
        "SELECT {SESSION_COLUMNS} FROM practice_sessions WHERE id = $1"
    ))
    .bind(payload.session_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Practice session not found".to_string()))?;

    // The session already names its course, so failing to resolve it under
    // this user is an authorization failure rather than a missing resource.
    let course = fetch_owned_course(&pool, session.course_id, claims.user_id())
        .await
        .map_err(|_| AppError::Forbidden("Not authorized".to_string()))?;

    let evaluation =
        practice::evaluate_answers(generator.as_ref(), &session.questions.0, &payload.answers)
            .await;

    sqlx::query(
        "UPDATE practice_sessions SET answers = $2, score = $3, correct_answers = $4 WHERE id = $1",
    )
    .bind(session.id)
    .bind(SqlJson(payload.answers.clone()))
    .bind(evaluation.score)
    .bind(evaluation.total_correct)
    .execute(&pool)
    .await?;

    let mut scores = course.learning_scores.0.clone();
    scores.push(LearningScore {
        session_id: session.id,
        topic: session.topic_title.clone(),
        score: evaluation.score,
        total_correct: evaluation.total_correct,
        total_questions: session.total_questions,
    });

    sqlx::query("UPDATE courses SET learning_scores = $2 WHERE id = $1")
        .bind(course.id)
        .bind(SqlJson(scores))
        .execute(&pool)
        .await?;

    Ok(Json(json!({
        "session_id": session.id,
        "score": evaluation.score,
        "correct_answers": evaluation.total_correct,
        "total_questions": session.total_questions,
        "results": evaluation.results,
        "overall_feedback": evaluation.overall_feedback,
    })))
}

/// Lists a course's practice sessions, newest first.
pub async fn history(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = fetch_owned_course(&pool, course_id, claims.user_id()).await?;

    let entries = sqlx::query_as::<_, PracticeHistoryEntry>(
        r#"
        SELECT id, topic_title, score, correct_answers, total_questions, created_at
        FROM practice_sessions
        WHERE course_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(course.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(entries))
}
