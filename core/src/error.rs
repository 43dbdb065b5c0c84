//! Error taxonomy shared by the store and registry layers.

use thiserror::Error;

/// Result type alias for Vendstack operations.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

/// All failure modes surfaced by the record store, the immutability guard,
/// the event bus and the central registry.
///
/// The excluded HTTP layer maps these onto responses: anything where
/// [`CoreError::is_user_error`] returns `true` becomes a 4xx, the rest 5xx.
///
/// Database errors are carried as strings so this crate stays independent of
/// any particular database driver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// Storage unreachable; surfaced, never retried automatically.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Table-creation conflict: a table of this name already exists.
    #[error("table '{0}' already exists")]
    AlreadyExists(String),

    /// The identifier has no matching row.
    #[error("no record with identifier '{0}'")]
    NotFound(String),

    /// An update attempted to change a protected field.
    #[error("field '{0}' is immutable and cannot be changed")]
    ImmutableField(String),

    /// Caller-supplied data failed validation: missing foreign key,
    /// non-positive quantity, unknown table or column, empty search filter.
    #[error("{0}")]
    Validation(String),

    /// Event publication failed after a successful write. The write is
    /// deliberately not rolled back; see the registry docs.
    #[error("failed to publish event: {0}")]
    PublishFailed(String),

    /// Underlying database failure other than an unreachable server.
    #[error("database error: {0}")]
    Database(String),
}

impl CoreError {
    /// Build a [`CoreError::Validation`] from any message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Build a [`CoreError::Database`] from any displayable error.
    pub fn database(error: impl std::fmt::Display) -> Self {
        Self::Database(error.to_string())
    }

    /// Returns `true` if this error is caused by the caller's input rather
    /// than by infrastructure.
    ///
    /// # Examples
    ///
    /// ```
    /// # use vendstack_core::CoreError;
    /// assert!(CoreError::Validation("quantity must be positive".into()).is_user_error());
    /// assert!(!CoreError::Connection("refused".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExists(_)
                | Self::NotFound(_)
                | Self::ImmutableField(_)
                | Self::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_map_to_4xx() {
        assert!(CoreError::NotFound("x".into()).is_user_error());
        assert!(CoreError::ImmutableField("id".into()).is_user_error());
        assert!(!CoreError::Database("oops".into()).is_user_error());
        assert!(!CoreError::PublishFailed("bus down".into()).is_user_error());
    }

    #[test]
    fn immutable_field_error_names_the_field() {
        let err = CoreError::ImmutableField("created_at".into());
        assert!(err.to_string().contains("created_at"));
    }
}
