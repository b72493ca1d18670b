//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::version::Versioned;

/// Book record as stored and as served to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    /// Name of the author
    pub author: String,
    /// Title of the book, unique across the club
    pub title: String,
    /// URL of the cover art
    #[serde(rename = "coverArtURL")]
    pub cover_art_url: Option<String>,
    /// User who owns the book
    pub owner: Uuid,
    /// User currently holding the book
    pub renter: Option<Uuid>,
    /// Users waiting for the book, first come first served
    pub rent_requests: Vec<Uuid>,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(rename = "eTag")]
    pub etag: String,
}

impl Book {
    /// A freshly listed book: nobody renting it, nobody waiting
    pub fn new(owner: Uuid, data: CreateBook, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author: data.author,
            title: data.title,
            cover_art_url: data.cover_art_url,
            owner,
            renter: None,
            rent_requests: Vec::new(),
            created: now,
            last_modified: now,
            etag: String::new(),
        }
    }

    /// Whether the user currently rents the book or waits for it
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.renter == Some(user_id) || self.rent_requests.contains(&user_id)
    }
}

impl Versioned for Book {
    fn set_etag(&mut self, etag: String) {
        self.etag = etag;
    }

    fn set_last_modified(&mut self, last_modified: DateTime<Utc>) {
        self.last_modified = last_modified;
    }
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 1, max = 512))]
    pub author: String,
    #[validate(length(min = 1, max = 512))]
    pub title: String,
    #[serde(rename = "coverArtURL")]
    #[validate(url)]
    pub cover_art_url: Option<String>,
}

/// Update book request; the rental fields are only changed through the rent endpoints
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 512))]
    pub author: Option<String>,
    #[validate(length(min = 1, max = 512))]
    pub title: Option<String>,
    #[serde(rename = "coverArtURL")]
    #[validate(url)]
    pub cover_art_url: Option<String>,
    /// Version token of the snapshot the update was based on
    #[serde(rename = "eTag")]
    pub etag: String,
}

impl UpdateBook {
    pub fn apply(self, book: &Book) -> Book {
        Book {
            author: self.author.unwrap_or_else(|| book.author.clone()),
            title: self.title.unwrap_or_else(|| book.title.clone()),
            cover_art_url: self.cover_art_url.or_else(|| book.cover_art_url.clone()),
            ..book.clone()
        }
    }
}

/// Query parameters of the rent endpoints
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RentalQuery {
    /// Book to rent, return or cancel
    pub book_id: Option<String>,
    /// Acting user
    pub user_id: Option<String>,
}
