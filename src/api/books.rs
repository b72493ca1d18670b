//! Book and rental endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_LOCATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Book, CreateBook, RentalQuery, UpdateBook},
    AppState,
};

use super::{etag_header, if_match, AuthenticatedUser, Tagged};

fn tagged(book: Book) -> Tagged<Book> {
    (etag_header(&book.etag), Json(book))
}

/// Validate the rent parameters; `bookId` is reported before `userId`
fn rental_params(request: &str, query: RentalQuery) -> AppResult<(Uuid, Uuid)> {
    let book_id = required(request, "bookId", query.book_id)?;
    let user_id = required(request, "userId", query.user_id)?;
    Ok((book_id, user_id))
}

fn required(request: &str, parameter: &'static str, value: Option<String>) -> AppResult<Uuid> {
    let value = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::MissingParameter {
            request: request.to_string(),
            parameter,
        })?;

    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::Validation(format!("{} '{}' is not a valid identifier", parameter, value)))
}

/// List all books
#[utoipa::path(
    get,
    path = "/book",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list().await?;
    Ok(Json(books))
}

/// List a new book owned by the authenticated user
#[utoipa::path(
    post,
    path = "/book",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Title already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateBook>,
) -> AppResult<impl IntoResponse> {
    data.validate()?;

    let book = state.services.books.create(claims.sub, data).await?;
    let location = format!("/api/v1/book/{}", book.id);

    Ok((StatusCode::CREATED, [(CONTENT_LOCATION, location)], tagged(book)))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/book/{id}",
    tag = "books",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Tagged<Book>> {
    let book = state.services.books.get_by_id(id).await?;
    Ok(tagged(book))
}

/// Update a book's author, title or cover art
#[utoipa::path(
    put,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 403, description = "Not the owner", body = crate::error::ErrorResponse),
        (status = 412, description = "The provided eTag is outdated", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateBook>,
) -> AppResult<Tagged<Book>> {
    data.validate()?;

    let book = state.services.books.update(id, claims.sub, data).await?;
    Ok(tagged(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "ID of the deleted book", body = Uuid),
        (status = 403, description = "Not the owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Uuid>> {
    state.services.books.delete(id, claims.sub).await?;
    Ok(Json(id))
}

/// Request a book for rental by a user
#[utoipa::path(
    post,
    path = "/book/rent/request",
    tag = "rentals",
    params(RentalQuery),
    responses(
        (status = 200, description = "Updated book", body = Book),
        (status = 400, description = "Missing or invalid parameter", body = crate::error::ErrorResponse),
        (status = 409, description = "User already renting or waiting", body = crate::error::ErrorResponse),
        (status = 412, description = "Book changed concurrently", body = crate::error::ErrorResponse)
    )
)]
pub async fn request_rental(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RentalQuery>,
) -> AppResult<Tagged<Book>> {
    let (book_id, user_id) = rental_params("/book/rent/request", query)?;
    let expected = if_match(&headers);

    let book = state
        .services
        .rentals
        .request(book_id, user_id, expected.as_deref())
        .await?;
    Ok(tagged(book))
}

/// Remove a user's rent request, or end their rental early
#[utoipa::path(
    post,
    path = "/book/rent/cancel",
    tag = "rentals",
    params(RentalQuery),
    responses(
        (status = 200, description = "Updated book", body = Book),
        (status = 400, description = "Missing or invalid parameter", body = crate::error::ErrorResponse),
        (status = 409, description = "User neither renting nor waiting", body = crate::error::ErrorResponse),
        (status = 412, description = "Book changed concurrently", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_rental(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RentalQuery>,
) -> AppResult<Tagged<Book>> {
    let (book_id, user_id) = rental_params("/book/rent/cancel", query)?;
    let expected = if_match(&headers);

    let book = state
        .services
        .rentals
        .cancel(book_id, user_id, expected.as_deref())
        .await?;
    Ok(tagged(book))
}

/// Return a book; the next user waiting becomes its renter
#[utoipa::path(
    post,
    path = "/book/rent/return",
    tag = "rentals",
    params(RentalQuery),
    responses(
        (status = 200, description = "Updated book", body = Book),
        (status = 400, description = "Missing or invalid parameter", body = crate::error::ErrorResponse),
        (status = 409, description = "User is not the renter", body = crate::error::ErrorResponse),
        (status = 412, description = "Book changed concurrently", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_rental(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RentalQuery>,
) -> AppResult<Tagged<Book>> {
    let (book_id, user_id) = rental_params("/book/rent/return", query)?;
    let expected = if_match(&headers);

    let book = state
        .services
        .rentals
        .return_book(book_id, user_id, expected.as_deref())
        .await?;
    Ok(tagged(book))
}
