// src/handlers/courses.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    ai::{
        LearnerProfile, SharedGenerator,
        curriculum::{self, EnrollmentParams, ResourcePolicy},
    },
    config::Config,
    error::AppError,
    handlers::auth::fetch_user,
    models::{
        course::{Course, CourseSummary, EnrollRequest, LearningData, ToggleResponse},
        topic::Topic,
        user::UserSummary,
    },
    progress,
    utils::jwt::Claims,
};

const COURSE_COLUMNS: &str = "id, user_id, title, description, level, reason, status, curriculum, \
     roadmap, resources, schedule, progress, total_topics, completed_topics, learning_scores, \
     enrolled_at, completed_at, created_at";

const TOPIC_COLUMNS: &str = "id, course_id, week, day, title, description, resources, \
     duration_minutes, order_index, is_completed, completed_at";

/// Enrolls the user in a new course.
///
/// The generator call completes and is validated before any row is written;
/// the course and its topics then go in as a single transaction so a
/// mid-batch failure leaves nothing behind.
pub async fn enroll(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    State(generator): State<SharedGenerator>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<EnrollRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = fetch_user(&pool, claims.user_id()).await?;

    let ongoing_titles: Vec<String> = sqlx::query_scalar(
        "SELECT title FROM courses WHERE user_id = $1 AND status = 'ongoing'",
    )
    .bind(user.id)
    .fetch_all(&pool)
    .await?;

    let profile = LearnerProfile {
        name: Some(user.name.clone()),
        age: user.age,
        educational_qualification: user.educational_qualification.clone(),
        educational_interests: user.educational_interests.clone(),
        hobbies: user.hobbies.clone(),
        habits: user.habits.clone(),
        daily_routine: user.daily_routine.clone(),
        ongoing_courses: if ongoing_titles.is_empty() {
            None
        } else {
            Some(ongoing_titles.join(", "))
        },
    };

    let level = payload.level.as_deref().unwrap_or("beginner");
    let params = EnrollmentParams {
        subject: &payload.subject,
        level,
        reason: payload.reason.as_deref().unwrap_or(""),
        duration_weeks: payload.preferred_duration_weeks.unwrap_or(4),
        daily_hours: payload.daily_hours.unwrap_or(1.0),
    };

    let policy = ResourcePolicy::from_flag(config.free_resources_only);
    let plan = curriculum::generate_curriculum(generator.as_ref(), policy, &params, &profile).await;

    // Hard failure: an error object with no usable title.
    if plan.get("title").is_none() {
        if let Some(error) = plan.get("error").and_then(Value::as_str) {
            return Err(AppError::Generation(error.to_string()));
        }
    }

    let topics = curriculum::topics_from(&plan);
    let title = plan
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(&payload.subject);
    let description = plan
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let doc = |key: &str| SqlJson(plan.get(key).cloned().unwrap_or_else(|| json!({})));

    let mut tx = pool.begin().await?;

    let course = sqlx::query_as::<_, Course>(&format!(
        r#"
        INSERT INTO courses
            (user_id, title, description, level, reason, status, curriculum, roadmap,
             resources, schedule, progress, total_topics, completed_topics, learning_scores)
        VALUES ($1, $2, $3, $4, $5, 'ongoing', $6, $7, $8, $9, 0, $10, 0, '[]')
        RETURNING {COURSE_COLUMNS}
        "#
    ))
    .bind(user.id)
    .bind(title)
    .bind(description)
    .bind(level)
    .bind(&payload.reason)
    .bind(doc("curriculum"))
    .bind(doc("roadmap"))
    .bind(doc("resources"))
    .bind(doc("schedule"))
    .bind(topics.len() as i64)
    .fetch_one(&mut *tx)
    .await?;

    if !topics.is_empty() {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO topics (course_id, week, day, title, description, resources, \
             duration_minutes, order_index) ",
        );
        builder.push_values(topics.iter().enumerate(), |mut row, (i, topic)| {
            row.push_bind(course.id)
                .push_bind(topic.week)
                .push_bind(topic.day)
                .push_bind(&topic.title)
                .push_bind(&topic.description)
                .push_bind(SqlJson(topic.resources.clone()))
                .push_bind(topic.duration_minutes)
                .push_bind(i as i32);
        });
        builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;

    tracing::info!(course_id = course.id, topics = topics.len(), "course enrolled");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Course enrolled successfully!",
            "course_id": course.id,
            "title": course.title,
            "total_topics": course.total_topics,
            "curriculum": plan,
        })),
    ))
}

/// Lists the current user's courses, newest enrollment first.
pub async fn list_courses(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let courses = sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE user_id = $1 ORDER BY enrolled_at DESC"
    ))
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(courses))
}

/// Dashboard summary: recent courses, ongoing/completed partitions and the
/// per-course learning-score series for the trend chart.
pub async fn dashboard(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, claims.user_id()).await?;

    let courses = sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE user_id = $1 ORDER BY enrolled_at DESC"
    ))
    .bind(user.id)
    .fetch_all(&pool)
    .await?;

    let recent: Vec<CourseSummary> = courses.iter().take(3).map(CourseSummary::from).collect();
    let ongoing: Vec<&Course> = courses
        .iter()
        .filter(|c| c.status == progress::STATUS_ONGOING)
        .collect();
    let completed: Vec<&Course> = courses
        .iter()
        .filter(|c| c.status == progress::STATUS_COMPLETED)
        .collect();

    let learning_data: Vec<LearningData> = courses
        .iter()
        .map(|c| LearningData {
            course_id: c.id,
            title: c.title.clone(),
            progress: c.progress,
            scores: c.learning_scores.0.clone(),
            status: c.status.clone(),
        })
        .collect();

    Ok(Json(json!({
        "user": UserSummary::from(&user),
        "recent_courses": recent,
        "ongoing_count": ongoing.len(),
        "completed_count": completed.len(),
        "total_courses": courses.len(),
        "ongoing_courses": ongoing.iter().map(|c| CourseSummary::from(*c)).collect::<Vec<_>>(),
        "completed_courses": completed.iter().map(|c| CourseSummary::from(*c)).collect::<Vec<_>>(),
        "learning_data": learning_data,
    })))
}

/// Returns one course with its topics in schedule order.
pub async fn get_course(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = fetch_owned_course(&pool, course_id, claims.user_id()).await?;

    let topics = sqlx::query_as::<_, Topic>(&format!(
        "SELECT {TOPIC_COLUMNS} FROM topics WHERE course_id = $1 ORDER BY order_index"
    ))
    .bind(course.id)
    .fetch_all(&pool)
    .await?;

    let mut body = serde_json::to_value(&course)?;
    body["topics"] = serde_json::to_value(&topics)?;

    Ok(Json(body))
}

/// Toggles one topic's completion flag and recomputes the course's
/// progress fields from a fresh count. Concurrent toggles on the same
/// course race last-write-wins on those fields; that is accepted.
pub async fn toggle_topic(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((course_id, topic_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let course = fetch_owned_course(&pool, course_id, claims.user_id()).await?;

    let topic = sqlx::query_as::<_, Topic>(&format!(
        "SELECT {TOPIC_COLUMNS} FROM topics WHERE id = $1 AND course_id = $2"
    ))
    .bind(topic_id)
    .bind(course.id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Topic not found".to_string()))?;

    let now = chrono::Utc::now();
    let is_completed = !topic.is_completed;
    let topic_completed_at = is_completed.then_some(now);

    sqlx::query("UPDATE topics SET is_completed = $2, completed_at = $3 WHERE id = $1")
        .bind(topic.id)
        .bind(is_completed)
        .bind(topic_completed_at)
        .execute(&pool)
        .await?;

    // Fresh counts; stored course counters are never trusted here.
    let (completed_count, total): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE is_completed), COUNT(*) FROM topics WHERE course_id = $1",
    )
    .bind(course.id)
    .fetch_one(&pool)
    .await?;

    let snapshot = progress::recompute(completed_count, total);
    let course_completed_at = snapshot.is_completed().then_some(now);

    sqlx::query(
        r#"
        UPDATE courses
        SET completed_topics = $2, total_topics = $3, progress = $4, status = $5, completed_at = $6
        WHERE id = $1
        "#,
    )
    .bind(course.id)
    .bind(snapshot.completed_topics)
    .bind(snapshot.total_topics)
    .bind(snapshot.progress)
    .bind(snapshot.status.as_str())
    .bind(course_completed_at)
    .execute(&pool)
    .await?;

    Ok(Json(ToggleResponse {
        topic_id: topic.id,
        is_completed,
        course_progress: snapshot.progress,
        course_status: snapshot.status.to_string(),
        completed_topics: snapshot.completed_topics,
        total_topics: snapshot.total_topics,
    }))
}

/// Deletes a course; topics and practice sessions go with it via the
/// foreign-key cascades.
pub async fn delete_course(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM courses WHERE id = $1 AND user_id = $2")
        .bind(course_id)
        .bind(claims.user_id())
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    Ok(Json(json!({ "message": "Course deleted successfully" })))
}

/// Looks up a course by id, filtered to the caller. Someone else's course is
/// indistinguishable from a missing one.
pub(crate) async fn fetch_owned_course(
    pool: &PgPool,
    course_id: i64,
    user_id: i64,
) -> Result<Course, AppError> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1 AND user_id = $2"
    ))
    .bind(course_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Course not found".to_string()))
}
