use thiserror::Error;

/// Failure taxonomy shared by every service.
///
/// The HTTP layer maps each variant to a status code; see `api::errors`.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// Credentials did not match a known user.
    #[error("{0}")]
    Unauthorized(String),

    /// A unique key already exists.
    #[error("{message}")]
    Conflict {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    /// The entity is absent, or an aggregate found no rows.
    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Raw storage-layer text, if this error originated in the database.
    pub fn storage_details(&self) -> Option<String> {
        match self {
            Self::Conflict { source, .. } | Self::Database(source) => Some(source.to_string()),
            _ => None,
        }
    }

    /// Turn a unique-key violation into [`ServiceError::Conflict`] carrying
    /// `message`; every other error passes through as a database error.
    pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        if is_violation(&err, Violation::Unique) {
            Self::Conflict {
                message: message.into(),
                source: err,
            }
        } else {
            Self::Database(err)
        }
    }

    /// Replace a foreign-key violation with `mapped`; every other error
    /// passes through as a database error.
    pub(crate) fn on_foreign_key(err: sqlx::Error, mapped: impl FnOnce() -> Self) -> Self {
        if is_violation(&err, Violation::ForeignKey) {
            mapped()
        } else {
            Self::Database(err)
        }
    }
}

enum Violation {
    Unique,
    ForeignKey,
}

fn is_violation(err: &sqlx::Error, kind: Violation) -> bool {
    match (err, kind) {
        (sqlx::Error::Database(db), Violation::Unique) => db.is_unique_violation(),
        (sqlx::Error::Database(db), Violation::ForeignKey) => db.is_foreign_key_violation(),
        _ => false,
    }
}
