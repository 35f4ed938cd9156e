use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::password::PasswordHasher;
use crate::{
    db::{models::UserCredentials, queries},
    error::{ServiceError, ServiceResult},
};

const LOGIN_FAILED: &str = "Login failed";

/// Partial update for a user; `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserService {
    pool: PgPool,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(pool: PgPool, hasher: PasswordHasher) -> Self {
        Self { pool, hasher }
    }

    pub async fn create(
        &self,
        username: Option<String>,
        password: Option<String>,
    ) -> ServiceResult<Uuid> {
        let (username, password) = require_credentials(username, password)?;
        let stored = self.hasher.hash(&password)?;

        let id: Uuid = sqlx::query_scalar(queries::INSERT_USER)
            .bind(&username)
            .bind(stored)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, "Username already exists."))?;

        info!(user_id = %id, username = %username, "User created");
        Ok(id)
    }

    /// Returns the user's id when `username` exists and `password` matches.
    /// Unknown user and wrong password fail identically.
    pub async fn login(
        &self,
        username: Option<String>,
        password: Option<String>,
    ) -> ServiceResult<Uuid> {
        let (username, password) = require_credentials(username, password)?;

        let user = sqlx::query_as::<_, UserCredentials>(queries::SELECT_USER_CREDENTIALS)
            .bind(&username)
            .fetch_optional(&self.pool)
            .await?;

        let verified = match &user {
            Some(user) => self.hasher.verify(&user.password, &password)?,
            None => false,
        };

        match user {
            Some(user) if verified => {
                info!(user_id = %user.id, "Login succeeded");
                Ok(user.id)
            }
            _ => {
                warn!(username = %username, "Login failed");
                Err(ServiceError::Unauthorized(LOGIN_FAILED.into()))
            }
        }
    }

    /// Apply `patch`; empty strings count as absent. A new password is
    /// hashed before it is stored.
    pub async fn update(&self, id: Uuid, patch: UserPatch) -> ServiceResult<Uuid> {
        let username = patch.username.filter(|u| !u.is_empty());
        let password = patch.password.filter(|p| !p.is_empty());
        if username.is_none() && password.is_none() {
            return Err(ServiceError::Validation(
                "At least one field (username or password) must be provided.".into(),
            ));
        }

        let password = password.map(|p| self.hasher.hash(&p)).transpose()?;

        let updated: Option<Uuid> = sqlx::query_scalar(queries::UPDATE_USER)
            .bind(username)
            .bind(password)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, "Username already exists."))?;

        let id = updated.ok_or_else(user_not_found)?;
        info!(user_id = %id, "User updated");
        Ok(id)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<Uuid> {
        let deleted: Option<Uuid> = sqlx::query_scalar(queries::DELETE_USER)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let id = deleted.ok_or_else(user_not_found)?;
        info!(user_id = %id, "User deleted");
        Ok(id)
    }
}

fn require_credentials(
    username: Option<String>,
    password: Option<String>,
) -> ServiceResult<(String, String)> {
    match (username, password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Ok((u, p)),
        _ => Err(ServiceError::Validation(
            "Username and password are required.".into(),
        )),
    }
}

fn user_not_found() -> ServiceError {
    ServiceError::NotFound("User not found.".into())
}
