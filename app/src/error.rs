//! Maps internal failures onto the HTTP error taxonomy (§7). The router and
//! sync paths are failure absorbers and never reach this type; it exists for
//! the handful of places bad input or auth is the caller's fault.

use log::error;
use miette::Diagnostic;
use rocket::http::{ContentType, Status};
use rocket::response::Responder;
use rocket::serde::json::json;
use rocket::{Request, Response};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AppError {
    #[error("missing bearer token")]
    MissingBearer,

    #[error("invalid bearer token")]
    InvalidBearer,

    #[error("missing webhook signature header")]
    MissingSignature,

    #[error("webhook signature did not match")]
    SignatureMismatch,

    #[error("webhook secret is not configured")]
    WebhookSecretNotConfigured,

    #[error("request body was not valid JSON: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> Status {
        match self {
            AppError::MissingBearer | AppError::InvalidBearer => Status::Unauthorized,
            AppError::SignatureMismatch => Status::Unauthorized,
            AppError::MissingSignature => Status::BadRequest,
            AppError::WebhookSecretNotConfigured => Status::InternalServerError,
            AppError::BadRequest(_) => Status::BadRequest,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for AppError {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'o> {
        error!("request failed: {self}");
        let status = self.status();
        let body = json!({"error": self.to_string()}).to_string();
        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}
