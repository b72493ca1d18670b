//! Business logic services

pub mod auth;
pub mod books;
pub mod rentals;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub books: books::BooksService,
    pub rentals: rentals::RentalsService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            books: books::BooksService::new(repository.clone()),
            rentals: rentals::RentalsService::new(repository.clone()),
            users: users::UsersService::new(repository),
        }
    }
}
