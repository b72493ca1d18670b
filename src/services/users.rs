//! User account service

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    ledger,
    models::{user::UpdateProfile, Book, User},
    repository::Repository,
};

/// Outcome of deleting an account
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountDeletion {
    pub user_id: Uuid,
    /// Books owned by the user that were removed
    pub books_deleted: u64,
    /// Books the user was renting or waiting for
    pub books_released: u64,
    /// Books that changed concurrently and still reference the user
    pub books_skipped: u64,
}

/// Conditional writes tried per book before the cascade gives up on it
const PURGE_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.repository.users.get(id).await
    }

    /// Update the user's profile; the update must be based on the current version
    pub async fn update_profile(&self, user_id: Uuid, profile: UpdateProfile) -> AppResult<User> {
        let user = self.repository.users.get(user_id).await?;

        if profile.etag != user.etag {
            return Err(AppError::outdated(&user));
        }

        let expected = user.etag.clone();
        let updated = profile.apply(&user);
        self.repository.users.replace_if_match(updated, &expected).await
    }

    /// Delete the account, then clean up the books that reference it.
    ///
    /// Each step is an independent write. A book modified concurrently is read
    /// again and purged from the fresh snapshot, up to `PURGE_ATTEMPTS` times.
    pub async fn delete_account(&self, user_id: Uuid) -> AppResult<AccountDeletion> {
        self.repository.users.delete(user_id).await?;

        let mut report = AccountDeletion {
            user_id,
            ..Default::default()
        };

        report.books_deleted = self.repository.books.delete_by_owner(user_id).await?;

        for book in self.repository.books.find_involving(user_id).await? {
            if self.release(book, user_id).await? {
                report.books_released += 1;
            } else {
                report.books_skipped += 1;
            }
        }

        tracing::info!(
            %user_id,
            books_deleted = report.books_deleted,
            books_released = report.books_released,
            books_skipped = report.books_skipped,
            "Account deleted"
        );

        Ok(report)
    }

    /// Purge the user from the book. Returns false when the book is gone or
    /// kept changing under every attempt.
    async fn release(&self, mut book: Book, user_id: Uuid) -> AppResult<bool> {
        for attempt in 1..=PURGE_ATTEMPTS {
            let purged = ledger::purge(&book, user_id);
            match self.repository.books.replace_if_match(purged, &book.etag).await {
                Ok(_) => return Ok(true),
                Err(AppError::Outdated { .. }) => {
                    tracing::debug!(book_id = %book.id, %user_id, attempt, "Book changed during account deletion, retrying");
                    match self.repository.books.get(book.id).await {
                        Ok(fresh) if fresh.involves(user_id) => book = fresh,
                        Ok(_) => return Ok(true),
                        Err(AppError::NotFound(_)) => return Ok(false),
                        Err(e) => return Err(e),
                    }
                }
                Err(AppError::NotFound(_)) => return Ok(false),
                Err(e) => return Err(e),
            }
        }

        tracing::warn!(book_id = %book.id, %user_id, "Book kept changing during account deletion, skipped");
        Ok(false)
    }
}
