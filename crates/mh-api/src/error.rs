//! HTTP mapping of [`AppError`].
//!
//! JSON routes answer `{ "error": message }`; page routes render HTML.
//! Internal errors are logged here and never shown to the caller.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use askama::Template;
use mh_core::error::AppError;
use mh_ui::NotFoundTemplate;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
#[error(transparent)]
pub struct ApiError(#[from] pub AppError);

#[derive(Error, Debug)]
#[error(transparent)]
pub struct PageError(#[from] pub AppError);

impl From<askama::Error> for PageError {
    fn from(e: askama::Error) -> Self {
        PageError(AppError::Internal(anyhow::Error::new(e).context("template rendering failed")))
    }
}

fn status_of(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound(..) => StatusCode::NOT_FOUND,
        AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The caller-facing message. Logs internal failures as a side effect.
fn public_message(err: &AppError) -> String {
    match err {
        AppError::Internal(e) => {
            log::error!("request failed: {e:#}");
            "Internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_of(&self.0)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": public_message(&self.0) }))
    }
}

impl ResponseError for PageError {
    fn status_code(&self) -> StatusCode {
        status_of(&self.0)
    }

    fn error_response(&self) -> HttpResponse {
        let message = public_message(&self.0);
        if let AppError::NotFound(what, _) = &self.0 {
            if let Ok(html) = (NotFoundTemplate { what: *what }).render() {
                return HttpResponse::NotFound().content_type("text/html; charset=utf-8").body(html);
            }
        }
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(message)
    }
}
