//! Error kinds surfaced by workflows and the model client.
//!
//! `AppError` is what handlers return; it maps onto HTTP status codes and a
//! short JSON body. `ModelError` stays inside the content layer and is folded
//! into `AppError::Generation` before it reaches a caller.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
  #[error("model not configured (OPENAI_API_KEY missing)")]
  NotConfigured,
  #[error("transport error: {0}")]
  Transport(String),
  #[error("model HTTP {status}: {message}")]
  Http { status: u16, message: String },
  #[error("model returned an empty payload")]
  EmptyPayload,
  #[error("could not decode model payload: {0}")]
  Decode(String),
}

#[derive(Debug, Error)]
pub enum AppError {
  /// User input violates a precondition; nothing was attempted.
  #[error("{0}")]
  Validation(String),
  /// The external model failed or produced unusable content.
  #[error("{message}")]
  Generation {
    message: String,
    #[source]
    source: Option<ModelError>,
  },
  /// Storage read/write failed. Logged, never shown to the user.
  #[error("storage error: {0}")]
  Persistence(String),
  #[error("{0}")]
  NotFound(String),
}

impl AppError {
  pub fn validation(msg: impl Into<String>) -> Self {
    AppError::Validation(msg.into())
  }

  pub fn generation(msg: impl Into<String>, source: ModelError) -> Self {
    AppError::Generation { message: msg.into(), source: Some(source) }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "validation",
      AppError::Generation { .. } => "generation",
      AppError::Persistence(_) => "persistence",
      AppError::NotFound(_) => "not_found",
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Generation { .. } => StatusCode::BAD_GATEWAY,
      AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> axum::response::Response {
    let body = json!({ "error": self.kind(), "message": self.to_string() });
    (self.status(), Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generation_error_keeps_user_message_and_source() {
    let err = AppError::generation("Gagal menghubungi layanan AI.", ModelError::EmptyPayload);
    assert_eq!(err.to_string(), "Gagal menghubungi layanan AI.");
    assert_eq!(err.kind(), "generation");
    let source = std::error::Error::source(&err).map(|s| s.to_string());
    assert_eq!(source.as_deref(), Some("model returned an empty payload"));
  }

  #[test]
  fn status_codes_follow_kind() {
    assert_eq!(AppError::validation("x").status(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Persistence("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
