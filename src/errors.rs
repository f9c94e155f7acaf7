use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use tera::Context;
use thiserror::Error;

use crate::{api::ApiError, templates::TEMPLATES};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Template error: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("Remote API error: {0}")]
    ApiError(#[from] ApiError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::TemplateError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ApiError(_) => StatusCode::BAD_GATEWAY,
            AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut context = Context::new();
        context.insert("title", "Error");
        context.insert("status", &status.as_u16());
        context.insert("message", &self.to_string());

        match TEMPLATES.render("error.html", &context) {
            Ok(rendered) => HttpResponse::build(status)
                .content_type("text/html; charset=utf-8")
                .body(rendered),
            Err(e) => {
                log::error!("Failed to render error page: {}", e);
                HttpResponse::build(status).body(self.to_string())
            }
        }
    }
}

impl From<AppError> for std::io::Error {
    fn from(err: AppError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    }
}
