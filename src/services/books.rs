//! Book catalog service

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Book, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get(id).await
    }

    /// List a new book owned by the user
    pub async fn create(&self, owner: Uuid, data: CreateBook) -> AppResult<Book> {
        let book = self
            .repository
            .books
            .insert(Book::new(owner, data, Utc::now()))
            .await?;
        tracing::info!(book_id = %book.id, %owner, "Book created");
        Ok(book)
    }

    /// Update a book's description; the update must be based on the current version
    pub async fn update(&self, id: Uuid, user_id: Uuid, data: UpdateBook) -> AppResult<Book> {
        let book = self.repository.books.get(id).await?;
        self.require_owner(&book, user_id)?;

        if data.etag != book.etag {
            return Err(AppError::outdated(&book));
        }

        let expected = book.etag.clone();
        let updated = data.apply(&book);
        self.repository.books.replace_if_match(updated, &expected).await
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        let book = self.repository.books.get(id).await?;
        self.require_owner(&book, user_id)?;

        self.repository.books.delete(id).await?;
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }

    fn require_owner(&self, book: &Book, user_id: Uuid) -> AppResult<()> {
        if book.owner != user_id {
            return Err(AppError::Forbidden {
                user_id,
                resource: format!("book {}", book.id),
            });
        }
        Ok(())
    }
}
