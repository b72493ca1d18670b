//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Club API",
        version = "1.0.0",
        description = "Peer-to-peer book lending REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        // Auth
        auth::signup,
        auth::login,
        auth::logout,
        auth::check,
        // Books
        books::list_books,
        books::create_book,
        books::get_book,
        books::update_book,
        books::delete_book,
        // Rentals
        books::request_rental,
        books::cancel_rental,
        books::return_rental,
        // Users
        users::list_users,
        users::update_user,
        users::delete_user,
    ),
    components(
        schemas(
            // Auth
            auth::AuthResponse,
            crate::models::user::SignupRequest,
            crate::models::user::LoginRequest,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Users
            crate::models::user::User,
            crate::models::user::UpdateProfile,
            crate::services::users::AccountDeletion,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::ServiceError,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Book management"),
        (name = "rentals", description = "Rent requests, cancellations and returns"),
        (name = "users", description = "User accounts")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
