use std::io::Error as IoError;

use actix_web::ResponseError;
use actix_web::http::StatusCode;
use thiserror::Error;

/// Failures that abort server startup
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

/// Failures surfaced from request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
    #[error("session read failed: {0}")]
    SessionGet(#[from] actix_session::SessionGetError),
    #[error("session write failed: {0}")]
    SessionInsert(#[from] actix_session::SessionInsertError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
