use marketplace_core::error::ValidationError;

/// PostgreSQL error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL error code for foreign key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Error returned by every repository method.
///
/// Integrity violations raised by the store stay as [`sqlx::Error`]; use
/// [`DbError::is_unique_violation`] and friends to classify them.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// An entity guard rejected the change before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DbError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.database_code().as_deref() == Some(UNIQUE_VIOLATION)
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        self.database_code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
    }

    /// Name of the violated constraint, if the store reported one.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            DbError::Database(sqlx::Error::Database(db_err)) => db_err.constraint(),
            _ => None,
        }
    }

    fn database_code(&self) -> Option<String> {
        match self {
            DbError::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().map(|code| code.into_owned())
            }
            _ => None,
        }
    }
}
