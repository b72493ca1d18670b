//! In-process store, selected with a `memory://` database URL
//!
//! Records live in maps behind a single lock; a conditional replace compares
//! and writes while holding it, which gives the same guarantee as the
//! `WHERE etag = ...` clause of the PostgreSQL repositories.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{update_cache_props, Book, User},
};

use super::{BookStore, UserStore};

#[derive(Default)]
struct Tables {
    books: HashMap<Uuid, Book>,
    users: HashMap<Uuid, User>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        let mut books: Vec<Book> = tables.books.values().cloned().collect();
        books.sort_by_key(|b| b.created);
        Ok(books)
    }

    async fn get(&self, id: Uuid) -> AppResult<Book> {
        let tables = self.tables.read().await;
        tables
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("book {}", id)))
    }

    async fn insert(&self, mut book: Book) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        if tables.books.values().any(|b| b.title == book.title) {
            return Err(AppError::Duplicate(format!(
                "a book titled '{}' already exists",
                book.title
            )));
        }

        update_cache_props(&mut book, Utc::now())?;
        tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn replace_if_match(&self, mut book: Book, expected_etag: &str) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        let current = tables
            .books
            .get(&book.id)
            .ok_or_else(|| AppError::NotFound(format!("book {}", book.id)))?;

        if current.etag != expected_etag {
            return Err(AppError::outdated(current));
        }
        if tables
            .books
            .values()
            .any(|b| b.id != book.id && b.title == book.title)
        {
            return Err(AppError::Duplicate(format!(
                "a book titled '{}' already exists",
                book.title
            )));
        }

        update_cache_props(&mut book, Utc::now())?;
        tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("book {}", id)))
    }

    async fn delete_by_owner(&self, owner: Uuid) -> AppResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.books.len();
        tables.books.retain(|_, b| b.owner != owner);
        Ok((before - tables.books.len()) as u64)
    }

    async fn find_involving(&self, user_id: Uuid) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        let mut books: Vec<Book> = tables
            .books
            .values()
            .filter(|b| b.involves(user_id))
            .cloned()
            .collect();
        books.sort_by_key(|b| b.created);
        Ok(books)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
        Ok(users)
    }

    async fn get(&self, id: Uuid) -> AppResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert(&self, mut user: User) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::UserDuplicate(user.email));
        }

        update_cache_props(&mut user, Utc::now())?;
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn replace_if_match(&self, mut user: User, expected_etag: &str) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        let current = tables
            .users
            .get(&user.id)
            .ok_or_else(|| AppError::NotFound(format!("user {}", user.id)))?;

        if current.etag != expected_etag {
            return Err(AppError::outdated(current));
        }
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::UserDuplicate(user.email));
        }

        update_cache_props(&mut user, Utc::now())?;
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }
}
