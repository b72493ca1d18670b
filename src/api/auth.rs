//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{LoginRequest, SignupRequest},
        User,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Token issued on signup and login
#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub user: User,
}

impl AuthResponse {
    fn bearer(token: String, user: User) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            user,
        }
    }
}

/// Create an account
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    request.validate()?;

    let (token, user) = state.services.auth.signup(request).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::bearer(token, user))))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Unknown email or wrong password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    request.validate()?;

    let (token, user) = state.services.auth.login(request).await?;
    Ok(Json(AuthResponse::bearer(token, user)))
}

/// Logout. Tokens are stateless, the client drops its copy.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out")
    )
)]
pub async fn logout() -> Json<Option<()>> {
    Json(None)
}

/// Return the user behind the bearer token
#[utoipa::path(
    get,
    path = "/auth/check",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token is valid", body = User),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn check(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<User>> {
    let user = state
        .services
        .users
        .get_by_id(claims.sub)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::Unauthenticated,
            other => other,
        })?;
    Ok(Json(user))
}
