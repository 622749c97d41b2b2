// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,

    /// Groq (OpenAI-compatible) chat-completions endpoint settings.
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub groq_model: String,
    /// Hard deadline for a single generation call. A timeout is treated the
    /// same as any other generation failure.
    pub generation_timeout_secs: u64,

    /// When true, curriculum prompts are restricted to the free-resource
    /// allow-list and generated documents are scrubbed against it. When
    /// false, paid resources (with price fields) are permitted.
    pub free_resources_only: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(72 * 3600);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let groq_api_key = env::var("GROQ_API_KEY").unwrap_or_default();

        let groq_base_url = env::var("GROQ_BASE_URL")
            .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string());

        let groq_model =
            env::var("GROQ_MODEL").unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string());

        let generation_timeout_secs = env::var("GENERATION_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let free_resources_only = env::var("FREE_RESOURCES_ONLY")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            groq_api_key,
            groq_base_url,
            groq_model,
            generation_timeout_secs,
            free_resources_only,
        }
    }
}
