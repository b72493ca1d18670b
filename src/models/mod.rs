//! Data models for the Book Club server

pub mod book;
pub mod user;
pub mod version;

// Re-export commonly used types
pub use book::{Book, CreateBook, RentalQuery, UpdateBook};
pub use user::{User, UserClaims};
pub use version::{update_cache_props, Versioned};
