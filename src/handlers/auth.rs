// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{
        GoogleAuthRequest, LoginRequest, ProfileUpdateRequest, SignupRequest, User, UserSummary,
    },
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

const USER_COLUMNS: &str = "id, name, email, phone, password_hash, age, hobbies, habits, \
     educational_qualification, educational_interests, daily_routine, google_id, avatar_url, \
     created_at, updated_at";

const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Registers a new user with an email/password credential and optional
/// profile fields. Returns 201 with a bearer token.
pub async fn signup(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users
            (name, email, phone, password_hash, age, hobbies, habits,
             educational_qualification, educational_interests, daily_routine)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&hashed_password)
    .bind(payload.age)
    .bind(&payload.hobbies)
    .bind(&payload.habits)
    .bind(&payload.educational_qualification)
    .bind(&payload.educational_interests)
    .bind(&payload.daily_routine)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::BadRequest("Email already registered".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    let token = sign_jwt(user.id, &user.email, &config.jwt_secret, config.jwt_expiration)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "access_token": token,
            "token_type": "bearer",
            "user": UserSummary::from(&user),
        })),
    ))
}

/// Authenticates an email/password user and returns a bearer token.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // OAuth-only accounts have no password hash and cannot log in this way.
    let user = user.ok_or(AppError::AuthError("Invalid email or password".to_string()))?;
    let stored_hash = user
        .password_hash
        .as_deref()
        .ok_or(AppError::AuthError("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, stored_hash)? {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let token = sign_jwt(user.id, &user.email, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "user": UserSummary::from(&user),
    })))
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Exchanges a Google OAuth access token for a local bearer token, creating
/// the account on first login or linking google_id onto an existing email.
pub async fn google_auth(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<GoogleAuthRequest>,
) -> Result<impl IntoResponse, AppError> {
    let client = reqwest::Client::new();
    let res = client
        .get(GOOGLE_USERINFO_URL)
        .header("Authorization", format!("Bearer {}", payload.token))
        .send()
        .await
        .map_err(|e| AppError::InternalServerError(format!("Google auth error: {}", e)))?;

    if !res.status().is_success() {
        return Err(AppError::AuthError("Invalid Google token".to_string()));
    }

    let info: GoogleUserInfo = res
        .json()
        .await
        .map_err(|e| AppError::InternalServerError(format!("Google auth error: {}", e)))?;

    let existing = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(&info.email)
    .fetch_optional(&pool)
    .await?;

    let user = match existing {
        Some(user) => {
            sqlx::query_as::<_, User>(&format!(
                r#"
                UPDATE users
                SET google_id = $2, avatar_url = $3, updated_at = now()
                WHERE id = $1
                RETURNING {USER_COLUMNS}
                "#
            ))
            .bind(user.id)
            .bind(&info.sub)
            .bind(&info.picture)
            .fetch_one(&pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, User>(&format!(
                r#"
                INSERT INTO users (name, email, google_id, avatar_url)
                VALUES ($1, $2, $3, $4)
                RETURNING {USER_COLUMNS}
                "#
            ))
            .bind(info.name.as_deref().unwrap_or("User"))
            .bind(&info.email)
            .bind(&info.sub)
            .bind(&info.picture)
            .fetch_one(&pool)
            .await?
        }
    };

    let token = sign_jwt(user.id, &user.email, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "user": UserSummary::from(&user),
    })))
}

/// Returns the current user's full profile.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, claims.user_id()).await?;
    Ok(Json(user))
}

/// Partially updates the current user's profile; absent fields keep their
/// stored values.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET name = COALESCE($2, name),
            phone = COALESCE($3, phone),
            age = COALESCE($4, age),
            hobbies = COALESCE($5, hobbies),
            habits = COALESCE($6, habits),
            educational_qualification = COALESCE($7, educational_qualification),
            educational_interests = COALESCE($8, educational_interests),
            daily_routine = COALESCE($9, daily_routine),
            updated_at = now()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(claims.user_id())
    .bind(&payload.name)
    .bind(&payload.phone)
    .bind(payload.age)
    .bind(&payload.hobbies)
    .bind(&payload.habits)
    .bind(&payload.educational_qualification)
    .bind(&payload.educational_interests)
    .bind(&payload.daily_routine)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

pub(crate) async fn fetch_user(pool: &PgPool, user_id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
