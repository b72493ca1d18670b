//! User model and related types

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::version::Versioned;

/// User record; the password hash never leaves the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(rename = "eTag")]
    pub etag: String,
}

impl User {
    pub fn new(data: &SignupRequest, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: data.email.clone(),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            password: password_hash,
            created: now,
            last_modified: now,
            etag: String::new(),
        }
    }
}

impl Versioned for User {
    fn set_etag(&mut self, etag: String) {
        self.etag = etag;
    }

    fn set_last_modified(&mut self, last_modified: DateTime<Utc>) {
        self.last_modified = last_modified;
    }
}

/// Signup request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 128))]
    pub first_name: String,
    #[validate(length(min = 1, max = 128))]
    pub last_name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Profile update request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub last_name: Option<String>,
    /// Version token of the snapshot the update was based on
    #[serde(rename = "eTag")]
    pub etag: String,
}

impl UpdateProfile {
    pub fn apply(self, user: &User) -> User {
        User {
            email: self.email.unwrap_or_else(|| user.email.clone()),
            first_name: self.first_name.unwrap_or_else(|| user.first_name.clone()),
            last_name: self.last_name.unwrap_or_else(|| user.last_name.clone()),
            ..user.clone()
        }
    }
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User ID
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a JWT token from claims
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Decode and validate a JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let token_data = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
