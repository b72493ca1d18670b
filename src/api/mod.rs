//! API handlers for the Book Club REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::{
        header::{AUTHORIZATION, ETAG, IF_MATCH},
        request::Parts,
        HeaderMap, HeaderName,
    },
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{error::AppError, models::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthenticated)?;

        let claims = state.services.auth.validate_token(token)?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Entity tags listed by the client in `If-Match`, without quotes or weak
/// marker. `None` when the header is absent, empty or `*`.
pub(crate) fn if_match(headers: &HeaderMap) -> Option<Vec<String>> {
    let value = headers.get(IF_MATCH)?.to_str().ok()?;

    let tags: Vec<String> = value
        .split(',')
        .map(|tag| tag.trim().trim_start_matches("W/").trim_matches('"').to_string())
        .filter(|tag| !tag.is_empty())
        .collect();

    if tags.is_empty() || tags.iter().any(|tag| tag == "*") {
        None
    } else {
        Some(tags)
    }
}

/// `ETag` response header for a resource version
pub(crate) fn etag_header(etag: &str) -> [(HeaderName, String); 1] {
    [(ETAG, format!("\"{}\"", etag))]
}

/// Response carrying a resource and its version
pub(crate) type Tagged<T> = ([(HeaderName, String); 1], Json<T>);

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let server = state.config.server.clone();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([ETAG]);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Authentication
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/check", get(auth::check))
        // Books
        .route("/book", get(books::list_books).post(books::create_book))
        .route(
            "/book/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        // Rentals
        .route("/book/rent/request", post(books::request_rental))
        .route("/book/rent/cancel", post(books::cancel_rental))
        .route("/book/rent/return", post(books::return_rental))
        // Users
        .route(
            "/user",
            get(users::list_users).put(users::update_user).delete(users::delete_user),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(DefaultBodyLimit::max(server.payload_limit_bytes))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
