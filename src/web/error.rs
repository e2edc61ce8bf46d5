use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::error::Category;
use std::sync::Arc;
use strum_macros::AsRefStr;

use super::types::DataParsingError;

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("data parsing error: {0}")]
    DataParsing(#[from] DataParsingError),
    #[error("failed to read the request body: {0}")]
    BodyRejection(#[from] BytesRejection),
    #[error("failed to deserialize json body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::DataParsing(_) => (StatusCode::BAD_REQUEST, InvalidEmail),
            Error::BodyRejection(er) => (er.status(), InvalidBody),
            // Valid JSON of the wrong shape, e.g. an email that is not a string.
            Error::Json(er) if er.classify() == Category::Data => {
                (StatusCode::BAD_REQUEST, InvalidEmail)
            }
            Error::Json(_) => (StatusCode::BAD_REQUEST, InvalidBody),
            Error::Sqlx(_) => (StatusCode::INTERNAL_SERVER_ERROR, ServiceError),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// The error as the client sees it. `Display` is the text sent in the `error` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Invalid email")]
    InvalidEmail,
    #[display("Invalid request body")]
    InvalidBody,
    #[display("Service error")]
    ServiceError,
}
