//! Rental service: applies ledger transitions to stored books

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    ledger::{self, Transition},
    models::Book,
    repository::Repository,
};

#[derive(Clone)]
pub struct RentalsService {
    repository: Repository,
}

impl RentalsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Request the book for the user
    pub async fn request(&self, book_id: Uuid, user_id: Uuid, if_match: Option<&[String]>) -> AppResult<Book> {
        self.apply("request", ledger::request, book_id, user_id, if_match).await
    }

    /// Withdraw the user's request, or end their rental early
    pub async fn cancel(&self, book_id: Uuid, user_id: Uuid, if_match: Option<&[String]>) -> AppResult<Book> {
        self.apply("cancel", ledger::cancel, book_id, user_id, if_match).await
    }

    /// Return the book and hand it to the next user waiting
    pub async fn return_book(&self, book_id: Uuid, user_id: Uuid, if_match: Option<&[String]>) -> AppResult<Book> {
        self.apply("return", ledger::return_book, book_id, user_id, if_match).await
    }

    /// Read the current snapshot, compute the next one and write it only if
    /// nobody else wrote in between. Conflicts are reported, not retried.
    async fn apply(
        &self,
        action: &'static str,
        transition: Transition,
        book_id: Uuid,
        user_id: Uuid,
        if_match: Option<&[String]>,
    ) -> AppResult<Book> {
        let snapshot = self.repository.books.get(book_id).await?;

        if let Some(expected) = if_match {
            if !expected.iter().any(|tag| *tag == snapshot.etag) {
                return Err(AppError::outdated(&snapshot));
            }
        }

        let next = transition(&snapshot, user_id).map_err(|rejection| {
            tracing::debug!(%book_id, %user_id, action, "Rental rejected: {}", rejection);
            rejection
        })?;

        let saved = self
            .repository
            .books
            .replace_if_match(next, &snapshot.etag)
            .await?;

        tracing::info!(
            %book_id,
            %user_id,
            action,
            renter = ?saved.renter,
            waiting = saved.rent_requests.len(),
            "Rental updated"
        );

        Ok(saved)
    }
}
