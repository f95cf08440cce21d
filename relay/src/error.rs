//! Error types for the relay layer.
//!
//! Relay errors follow the same layering pattern as the rest of the
//! workspace: a root `Error` struct holding an `error_kind` tree plus the
//! original `source`, translated upward so the web layer can map kinds to
//! HTTP status codes without depending on storage internals.

use events::store::{Error as StoreError, StoreErrorKind};
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: RelayErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum RelayErrorKind {
    /// The durable log write or read failed; delivery was not attempted.
    Storage(StoreErrorKind),
    /// An event or frame could not be serialized.
    Serialization,
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Relay Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        let kind = err.error_kind;
        Error {
            source: Some(Box::new(err)),
            error_kind: RelayErrorKind::Storage(kind),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: RelayErrorKind::Serialization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_kind() {
        let err: Error = StoreError {
            source: None,
            error_kind: StoreErrorKind::WriteFailed,
        }
        .into();

        assert_eq!(
            err.error_kind,
            RelayErrorKind::Storage(StoreErrorKind::WriteFailed)
        );
        assert!(err.source.is_some());
    }
}
