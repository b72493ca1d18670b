//! User account endpoints

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{user::UpdateProfile, User},
    services::users::AccountDeletion,
    AppState,
};

use super::{etag_header, AuthenticatedUser, Tagged};

/// List all users
#[utoipa::path(
    get,
    path = "/user",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = Vec<User>)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.services.users.list().await?;
    Ok(Json(users))
}

/// Update the authenticated user's profile
#[utoipa::path(
    put,
    path = "/user",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 412, description = "The provided eTag is outdated", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<UpdateProfile>,
) -> AppResult<Tagged<User>> {
    data.validate()?;

    let user = state.services.users.update_profile(claims.sub, data).await?;
    Ok((etag_header(&user.etag), Json(user)))
}

/// Delete the authenticated user's account with their books and rentals
#[utoipa::path(
    delete,
    path = "/user",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account deleted", body = AccountDeletion),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<AccountDeletion>> {
    let report = state.services.users.delete_account(claims.sub).await?;
    Ok(Json(report))
}
