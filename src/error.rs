use sea_orm::{DbErr, SqlErr};
use std::borrow::Cow;

/// An error from any operation of the backend.
///
/// The variants are the caller-visible taxonomy; the request boundary maps
/// each of them onto one HTTP status code.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed id, missing field, or a credential that fails validation
    #[error("{0}")]
    InvalidArgument(Cow<'static, str>),
    /// Missing or invalid identity
    #[error("{0}")]
    Unauthenticated(Cow<'static, str>),
    /// Missing record, or a record owned by someone else
    #[error("{0}")]
    NotFound(Cow<'static, str>),
    /// Duplicate edge or duplicate unique field
    #[error("{0}")]
    Conflict(Cow<'static, str>),
    /// The database failed
    #[error(transparent)]
    Db(#[from] DbErr),
    /// Reading or writing an upload failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Anything else that is not the caller's fault
    #[error("{0}")]
    Internal(Cow<'static, str>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn invalid(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal(msg.into())
    }

    /// Turn a unique-constraint violation into [`Error::Conflict`] with the
    /// given message; every other database error passes through.
    pub(crate) fn on_unique_violation(err: DbErr, msg: &'static str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::conflict(msg),
            _ => Self::Db(err),
        }
    }

    /// True for the variants that are reported as a server fault.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Db(_) | Self::Io(_) | Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_is_not_guessed_from_other_errors() {
        let err = Error::on_unique_violation(DbErr::Custom("boom".to_owned()), "taken");
        assert!(matches!(err, Error::Db(_)));
        assert!(err.is_internal());
    }

    #[test]
    fn message_is_the_display() {
        assert_eq!(Error::not_found("tweet not found").to_string(), "tweet not found");
        assert!(!Error::conflict("x").is_internal());
    }
}
