//! Authentication service: signup, login and token handling

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        user::{LoginRequest, SignupRequest},
        User, UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new user and return a token for it
    pub async fn signup(&self, request: SignupRequest) -> AppResult<(String, User)> {
        if self.repository.users.get_by_email(&request.email).await?.is_some() {
            return Err(AppError::UserDuplicate(request.email));
        }

        let password = self.hash_password(&request.password)?;
        let user = self
            .repository
            .users
            .insert(User::new(&request, password, Utc::now()))
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    /// Authenticate user by email and password
    pub async fn login(&self, request: LoginRequest) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::NotRegistered(request.email.clone()))?;

        if !self.verify_password(&user, &request.password)? {
            tracing::debug!(user_id = %user.id, "Login refused");
            return Err(AppError::Credentials(user.id));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    /// Resolve the user behind a bearer token
    pub fn validate_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            AppError::Unauthenticated
        })
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.id,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify user password
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
