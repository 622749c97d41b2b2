// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, chat, courses, practice},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, courses, practice, chat).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, generator).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/google", post(auth::google_auth))
        // Protected profile routes
        .merge(
            Router::new()
                .route("/me", get(auth::get_me))
                .route("/profile", put(auth::update_profile))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let course_routes = Router::new()
        .route("/enroll", post(courses::enroll))
        .route("/", get(courses::list_courses))
        .route("/dashboard", get(courses::dashboard))
        .route("/{id}", get(courses::get_course).delete(courses::delete_course))
        .route(
            "/{id}/topics/{topic_id}/toggle",
            put(courses::toggle_topic),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let practice_routes = Router::new()
        .route("/generate", post(practice::generate_questions))
        .route("/submit", post(practice::submit_answers))
        .route("/history/{course_id}", get(practice::history))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let chat_routes = Router::new()
        .route("/ask", post(chat::ask))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/courses", course_routes)
        .nest("/api/practice", practice_routes)
        .nest("/api/chat", chat_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
