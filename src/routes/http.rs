//! HTTP endpoint handlers. These are thin wrappers that forward to the workflows.
//! Each handler is instrumented; failures come back as `AppError` JSON bodies.

use std::sync::Arc;
use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::catalog::catalog;
use crate::domain::{QuestionCounts, SetupContext};
use crate::error::AppError;
use crate::export::WordExport;
use crate::protocol::*;
use crate::state::AppState;
use crate::workflow;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let model = state.ai.as_ref().map(|ai| ai.model_name().to_string());
  Json(HealthOut { ok: true, model })
}

#[instrument(level = "info")]
pub async fn http_catalog() -> impl IntoResponse { Json(catalog()) }

#[instrument(level = "info", skip(state))]
pub async fn http_dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(workflow::dashboard(&state).await)
}

#[instrument(level = "debug", skip(state))]
pub async fn http_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(StatusOut { is_loading: state.is_busy(), toasts: state.toasts().await })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_setup(State(state): State<Arc<AppState>>) -> Json<SetupContext> {
  Json(state.setup().await)
}

#[instrument(level = "info", skip(state, body), fields(field = ?body.field))]
pub async fn http_put_setup(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SetupUpdateIn>,
) -> Json<SetupContext> {
  Json(workflow::update_setup(&state, body.field, body.value).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_outline(State(state): State<Arc<AppState>>) -> Result<Json<OutlineOut>, AppError> {
  let outline = workflow::fetch_outline(&state).await?;
  info!(target: "generation", outline_len = outline.len(), "HTTP outline served");
  Ok(Json(OutlineOut { outline }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_documents(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.documents().await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_generate_documents(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
  let docs = workflow::generate_all_documents(&state).await?;
  Ok((StatusCode::CREATED, Json(docs)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_export_document(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<WordExport, AppError> {
  workflow::export_document(&state, &id).await
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_questions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.questions().await)
}

#[instrument(level = "info", skip(state, counts), fields(total = counts.total()))]
pub async fn http_generate_questions(
  State(state): State<Arc<AppState>>,
  Json(counts): Json<QuestionCounts>,
) -> Result<impl IntoResponse, AppError> {
  let items = workflow::generate_question_bank(&state, counts).await?;
  Ok((StatusCode::CREATED, Json(items)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_question(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
  workflow::delete_question(&state, &id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state))]
pub async fn http_clear_questions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let removed = workflow::clear_questions(&state).await;
  Json(ClearedOut { removed })
}

#[instrument(level = "info", skip(state))]
pub async fn http_export_package(State(state): State<Arc<AppState>>) -> Result<WordExport, AppError> {
  workflow::export_exam_package(&state).await
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_admin(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.admin_documents().await)
}

#[instrument(level = "info", skip(state, body), fields(type_id = %body.type_id))]
pub async fn http_generate_admin(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateAdminIn>,
) -> Result<impl IntoResponse, AppError> {
  let doc = workflow::generate_admin_document(&state, &body.type_id).await?;
  Ok((StatusCode::CREATED, Json(doc)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_export_admin(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<WordExport, AppError> {
  workflow::export_admin_document(&state, &id).await
}
