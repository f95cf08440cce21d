//! Error types for entity API
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

use events::store::{Error as StoreError, StoreErrorKind};
use sea_orm::error::DbErr;

/// Errors while executing operations related to entities.
/// The intent is to categorize errors into two major types:
///  * Errors related to data. Ex DbError::RecordNotFound
///  * Errors related to interactions with the database itself. Ex DbError::Conn
#[derive(Debug)]
pub struct Error {
    // Underlying error emitted from seaORM internals
    pub source: Option<DbErr>,
    // Enum representing which category of error
    pub error_kind: EntityApiErrorKind,
}

#[derive(Debug, PartialEq, Serialize)]
pub enum EntityApiErrorKind {
    // Record not found
    RecordNotFound,
    // Record not updated
    RecordNotUpdated,
    // The stored value could not be serialized/deserialized
    InvalidStoredValue,
    // Errors related to interactions with the database itself. Ex DbError::Conn
    SystemError,
    // Other errors
    Other,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Entity API Error: {:?}", self)
    }
}

impl StdError for Error {}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(_) => Error {
                source: Some(err),
                error_kind: EntityApiErrorKind::RecordNotFound,
            },
            DbErr::RecordNotUpdated => Error {
                source: Some(err),
                error_kind: EntityApiErrorKind::RecordNotUpdated,
            },
            DbErr::ConnectionAcquire(_) => Error {
                source: Some(err),
                error_kind: EntityApiErrorKind::SystemError,
            },
            DbErr::Conn(_) => Error {
                source: Some(err),
                error_kind: EntityApiErrorKind::SystemError,
            },
            DbErr::Exec(_) => Error {
                source: Some(err),
                error_kind: EntityApiErrorKind::SystemError,
            },
            _ => Error {
                source: Some(err),
                error_kind: EntityApiErrorKind::SystemError,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(_err: serde_json::Error) -> Self {
        Error {
            source: None,
            error_kind: EntityApiErrorKind::InvalidStoredValue,
        }
    }
}

// This is where entity API errors are translated into the storage-seam
// error the `events` crate defines, so the relay never depends on seaORM.
impl From<Error> for StoreError {
    fn from(err: Error) -> Self {
        let error_kind = match err.error_kind {
            EntityApiErrorKind::SystemError => StoreErrorKind::Unavailable,
            EntityApiErrorKind::RecordNotUpdated => StoreErrorKind::WriteFailed,
            EntityApiErrorKind::InvalidStoredValue => StoreErrorKind::Serialization,
            EntityApiErrorKind::RecordNotFound | EntityApiErrorKind::Other => {
                StoreErrorKind::Other
            }
        };

        StoreError {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_connection_errors_map_to_system_error() {
        let err: Error = DbErr::Conn(sea_orm::RuntimeErr::Internal("down".to_string())).into();
        assert_eq!(err.error_kind, EntityApiErrorKind::SystemError);
    }

    #[test]
    fn system_errors_translate_to_unavailable_store_errors() {
        let err = Error {
            source: None,
            error_kind: EntityApiErrorKind::SystemError,
        };
        let store_err: StoreError = err.into();
        assert_eq!(store_err.error_kind, StoreErrorKind::Unavailable);
    }

    #[test]
    fn stored_value_errors_translate_to_serialization_store_errors() {
        let err = Error {
            source: None,
            error_kind: EntityApiErrorKind::InvalidStoredValue,
        };
        let store_err: StoreError = err.into();
        assert_eq!(store_err.error_kind, StoreErrorKind::Serialization);
    }
}
