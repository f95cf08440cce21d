use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use events::store::StoreErrorKind;
use relay::error::{Error as RelayError, RelayErrorKind};

extern crate log;

pub type Result<T> = core::result::Result<T, Error>;

/// Web-layer error wrapping the relay error tree. Kinds are mapped to HTTP
/// status codes here so lower layers stay free of HTTP concerns.
#[derive(Debug)]
pub struct Error(RelayError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            RelayErrorKind::Storage(store_error_kind) => match store_error_kind {
                StoreErrorKind::Unavailable => {
                    (StatusCode::SERVICE_UNAVAILABLE, "SERVICE UNAVAILABLE").into_response()
                }
                StoreErrorKind::WriteFailed
                | StoreErrorKind::Serialization
                | StoreErrorKind::Other => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
            RelayErrorKind::Serialization | RelayErrorKind::Other(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
            }
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<RelayError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
