//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs its parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, http::StatusCode, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::logic;
use crate::protocol::*;
use crate::registry;
use crate::routes::error::ApiError;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

/// Registry catalogue: every variant with its category, fields and capabilities.
#[instrument(level = "info")]
pub async fn http_get_variants() -> impl IntoResponse {
  Json(registry::all())
}

#[instrument(level = "info", skip(body), fields(variant = %body.variant))]
pub async fn http_post_validate(Json(body): Json<BlockIn>) -> Result<Json<ValidateOut>, ApiError> {
  Ok(Json(logic::validate_block(body)?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_lessons(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(logic::list_lessons(&state).await)
}

#[instrument(level = "info", skip(state, body), fields(title = %body.title))]
pub async fn http_post_lesson(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CreateLessonIn>,
) -> Result<impl IntoResponse, ApiError> {
  let out = logic::create_lesson(&state, body).await?;
  info!(target: "authoring", lesson = %out.id, "HTTP lesson created");
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "info", skip(state), fields(%lesson_id))]
pub async fn http_get_lesson(
  State(state): State<Arc<AppState>>,
  Path(lesson_id): Path<String>,
) -> Result<Json<LessonOut>, ApiError> {
  Ok(Json(logic::load_lesson(&state, &lesson_id).await?))
}

#[instrument(level = "info", skip(state, body), fields(%lesson_id, variant = %body.variant))]
pub async fn http_post_block(
  State(state): State<Arc<AppState>>,
  Path(lesson_id): Path<String>,
  Json(body): Json<BlockIn>,
) -> Result<impl IntoResponse, ApiError> {
  let out = logic::add_block(&state, &lesson_id, body).await?;
  info!(target: "authoring", lesson = %lesson_id, revision = out.revision, "HTTP block added");
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "info", skip(state, body), fields(%lesson_id, %block_id))]
pub async fn http_put_block(
  State(state): State<Arc<AppState>>,
  Path((lesson_id, block_id)): Path<(String, String)>,
  Json(body): Json<BlockIn>,
) -> Result<Json<WriteOut>, ApiError> {
  let out = logic::replace_block(&state, &lesson_id, &block_id, body).await?;
  info!(target: "authoring", lesson = %lesson_id, %block_id, revision = out.revision, "HTTP block replaced");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(%lesson_id, %block_id))]
pub async fn http_delete_block(
  State(state): State<Arc<AppState>>,
  Path((lesson_id, block_id)): Path<(String, String)>,
  Query(q): Query<RevisionQuery>,
) -> Result<Json<WriteOut>, ApiError> {
  let out = logic::remove_block(&state, &lesson_id, &block_id, q.expected_revision).await?;
  info!(target: "authoring", lesson = %lesson_id, %block_id, revision = out.revision, "HTTP block removed");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%lesson_id, %block_id, to = body.to))]
pub async fn http_post_move(
  State(state): State<Arc<AppState>>,
  Path((lesson_id, block_id)): Path<(String, String)>,
  Json(body): Json<MoveIn>,
) -> Result<Json<WriteOut>, ApiError> {
  Ok(Json(logic::move_block(&state, &lesson_id, &block_id, body).await?))
}
