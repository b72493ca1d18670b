//! Rental ledger
//!
//! State transitions of a book's rental: who holds it (`renter`) and who is
//! waiting for it (`rent_requests`, first come first served). Every
//! transition takes a snapshot and returns the next snapshot or a
//! [`Rejection`]; persisting the result is left to the caller, which must
//! write it conditionally on the snapshot's entity tag.
//!
//! Invariants kept by every transition:
//! - a user appears at most once in `rent_requests`;
//! - the renter never appears in `rent_requests`.

use thiserror::Error;
use uuid::Uuid;

use crate::{error::ErrorCode, models::Book};

/// A transition refused because of the book's current rental state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("The user {user_id} already has a rent request for book {book_id}")]
    RequestDuplicate { book_id: Uuid, user_id: Uuid },

    #[error("The user {user_id} is not the current renter of book {book_id}")]
    ReturnMissingUser { book_id: Uuid, user_id: Uuid },

    #[error("The user {user_id} has not requested to rent the book {book_id}")]
    CancelMissingUser { book_id: Uuid, user_id: Uuid },
}

impl Rejection {
    pub fn code(&self) -> ErrorCode {
        match self {
            Rejection::RequestDuplicate { .. } => ErrorCode::RentRequestDuplicate,
            Rejection::ReturnMissingUser { .. } => ErrorCode::RentReturnMissingUser,
            Rejection::CancelMissingUser { .. } => ErrorCode::RentCancelMissingUser,
        }
    }

    /// Book and user the rejection is about
    pub fn subject(&self) -> (Uuid, Uuid) {
        match *self {
            Rejection::RequestDuplicate { book_id, user_id }
            | Rejection::ReturnMissingUser { book_id, user_id }
            | Rejection::CancelMissingUser { book_id, user_id } => (book_id, user_id),
        }
    }
}

pub type Transition = fn(&Book, Uuid) -> Result<Book, Rejection>;

/// Request a book: take it right away when nobody holds it, otherwise join
/// the end of the waitlist.
pub fn request(book: &Book, user_id: Uuid) -> Result<Book, Rejection> {
    if book.involves(user_id) {
        return Err(Rejection::RequestDuplicate {
            book_id: book.id,
            user_id,
        });
    }

    let mut next = book.clone();
    if next.renter.is_none() {
        next.renter = Some(user_id);
    } else {
        next.rent_requests.push(user_id);
    }
    Ok(next)
}

/// Withdraw from a book. The renter cancelling is an early return; a waiting
/// user leaves the waitlist without disturbing the others' order.
pub fn cancel(book: &Book, user_id: Uuid) -> Result<Book, Rejection> {
    if book.renter == Some(user_id) {
        return Ok(hand_over(book));
    }

    let Some(position) = book.rent_requests.iter().position(|&id| id == user_id) else {
        return Err(Rejection::CancelMissingUser {
            book_id: book.id,
            user_id,
        });
    };

    let mut next = book.clone();
    next.rent_requests.remove(position);
    Ok(next)
}

/// Give the book back; the head of the waitlist becomes the renter.
pub fn return_book(book: &Book, user_id: Uuid) -> Result<Book, Rejection> {
    if book.renter != Some(user_id) {
        return Err(Rejection::ReturnMissingUser {
            book_id: book.id,
            user_id,
        });
    }

    Ok(hand_over(book))
}

/// Remove every trace of a user from a book, used when the account is
/// deleted. Never rejects and applying it twice changes nothing.
pub fn purge(book: &Book, user_id: Uuid) -> Book {
    let mut next = book.clone();
    next.rent_requests.retain(|&id| id != user_id);
    if next.renter == Some(user_id) {
        next = hand_over(&next);
    }
    next
}

/// Pass the book from its renter to the first user waiting, if any.
fn hand_over(book: &Book) -> Book {
    let mut next = book.clone();
    next.renter = if next.rent_requests.is_empty() {
        None
    } else {
        Some(next.rent_requests.remove(0))
    };
    next
}
