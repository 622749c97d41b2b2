// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique email address, the login identifier.
    pub email: String,

    pub phone: Option<String>,

    /// Argon2 password hash; NULL for accounts created via Google OAuth.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: Option<String>,

    // Free-text profile fields fed into the generation prompts.
    pub age: Option<i32>,
    pub hobbies: Option<String>,
    pub habits: Option<String>,
    pub educational_qualification: Option<String>,
    pub educational_interests: Option<String>,
    pub daily_routine: Option<String>,

    #[serde(skip)]
    pub google_id: Option<String>,
    pub avatar_url: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for registration.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters."))]
    pub name: String,
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(range(min = 1, max = 150))]
    pub age: Option<i32>,
    pub hobbies: Option<String>,
    pub habits: Option<String>,
    #[validate(length(max = 255))]
    pub educational_qualification: Option<String>,
    pub educational_interests: Option<String>,
    pub daily_routine: Option<String>,
}

/// DTO for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for the Google OAuth token exchange.
#[derive(Debug, Deserialize)]
pub struct GoogleAuthRequest {
    pub token: String,
}

/// DTO for partial profile updates; absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(range(min = 1, max = 150))]
    pub age: Option<i32>,
    pub hobbies: Option<String>,
    pub habits: Option<String>,
    #[validate(length(max = 255))]
    pub educational_qualification: Option<String>,
    pub educational_interests: Option<String>,
    pub daily_routine: Option<String>,
}

/// Compact user block embedded in auth responses and the dashboard.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}
