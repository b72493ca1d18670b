//! Users repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{update_cache_props, User},
};

use super::{is_unique_violation, UserStore};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

fn map_write_error(error: sqlx::Error, user: &User) -> AppError {
    if is_unique_violation(&error) {
        AppError::UserDuplicate(user.email.clone())
    } else {
        AppError::Database(error)
    }
}

#[async_trait]
impl UserStore for UsersRepository {
    async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY last_name, first_name")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn get(&self, id: Uuid) -> AppResult<User> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert(&self, mut user: User) -> AppResult<User> {
        update_cache_props(&mut user, Utc::now())?;

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, email, first_name, last_name, password, created, last_modified, etag
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password)
        .bind(user.created)
        .bind(user.last_modified)
        .bind(&user.etag)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user))
    }

    async fn replace_if_match(&self, mut user: User, expected_etag: &str) -> AppResult<User> {
        update_cache_props(&mut user, Utc::now())?;

        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, first_name = $3, last_name = $4, password = $5,
                last_modified = $6, etag = $7
            WHERE id = $1 AND etag = $8
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password)
        .bind(user.last_modified)
        .bind(&user.etag)
        .bind(expected_etag)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user))?;

        match updated {
            Some(updated) => Ok(updated),
            None => match self.find(user.id).await? {
                Some(current) => Err(AppError::outdated(&current)),
                None => Err(AppError::NotFound(format!("user {}", user.id))),
            },
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", id)));
        }

        Ok(())
    }
}
