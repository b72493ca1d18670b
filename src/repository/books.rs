//! Books repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{update_cache_props, Book},
};

use super::{is_unique_violation, BookStore};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }
}

fn map_write_error(error: sqlx::Error, book: &Book) -> AppError {
    if is_unique_violation(&error) {
        AppError::Duplicate(format!("a book titled '{}' already exists", book.title))
    } else {
        AppError::Database(error)
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY created")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn get(&self, id: Uuid) -> AppResult<Book> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("book {}", id)))
    }

    async fn insert(&self, mut book: Book) -> AppResult<Book> {
        update_cache_props(&mut book, Utc::now())?;

        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                id, author, title, cover_art_url, owner, renter, rent_requests,
                created, last_modified, etag
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(book.id)
        .bind(&book.author)
        .bind(&book.title)
        .bind(&book.cover_art_url)
        .bind(book.owner)
        .bind(book.renter)
        .bind(&book.rent_requests)
        .bind(book.created)
        .bind(book.last_modified)
        .bind(&book.etag)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &book))
    }

    async fn replace_if_match(&self, mut book: Book, expected_etag: &str) -> AppResult<Book> {
        update_cache_props(&mut book, Utc::now())?;

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET author = $2, title = $3, cover_art_url = $4, renter = $5,
                rent_requests = $6, last_modified = $7, etag = $8
            WHERE id = $1 AND etag = $9
            RETURNING *
            "#,
        )
        .bind(book.id)
        .bind(&book.author)
        .bind(&book.title)
        .bind(&book.cover_art_url)
        .bind(book.renter)
        .bind(&book.rent_requests)
        .bind(book.last_modified)
        .bind(&book.etag)
        .bind(expected_etag)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &book))?;

        match updated {
            Some(updated) => Ok(updated),
            None => match self.find(book.id).await? {
                Some(current) => Err(AppError::outdated(&current)),
                None => Err(AppError::NotFound(format!("book {}", book.id))),
            },
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("book {}", id)));
        }

        Ok(())
    }

    async fn delete_by_owner(&self, owner: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM books WHERE owner = $1")
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_involving(&self, user_id: Uuid) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE renter = $1 OR $1 = ANY(rent_requests) ORDER BY created",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }
}
