//! Repository layer for book and user persistence
//!
//! Each entity is stored behind a trait so the services run unchanged over
//! PostgreSQL or over the in-process store. Every write stamps the record with
//! a new modification time and entity tag; replacements only succeed when the
//! caller still holds the stored entity tag.

pub mod books;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, User},
};

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Book>>;

    async fn get(&self, id: Uuid) -> AppResult<Book>;

    async fn insert(&self, book: Book) -> AppResult<Book>;

    /// Replace the stored book if its entity tag still equals `expected_etag`.
    ///
    /// Fails with `AppError::Outdated` carrying the stored book otherwise,
    /// leaving it untouched.
    async fn replace_if_match(&self, book: Book, expected_etag: &str) -> AppResult<Book>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Delete every book owned by the user, returning how many were removed
    async fn delete_by_owner(&self, owner: Uuid) -> AppResult<u64>;

    /// Books the user currently rents or waits for
    async fn find_involving(&self, user_id: Uuid) -> AppResult<Vec<Book>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<User>>;

    async fn get(&self, id: Uuid) -> AppResult<User>;

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn insert(&self, user: User) -> AppResult<User>;

    /// Same contract as [`BookStore::replace_if_match`]
    async fn replace_if_match(&self, user: User, expected_etag: &str) -> AppResult<User>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Main repository struct holding the entity stores
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub users: Arc<dyn UserStore>,
}

impl Repository {
    /// Create a repository backed by PostgreSQL
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            users: Arc::new(users::UsersRepository::new(pool)),
        }
    }

    /// Create a repository backed by the in-process store
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            books: store.clone(),
            users: store,
        }
    }
}

/// Whether the database refused a write because of a unique constraint
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(e) if e.is_unique_violation())
}
