//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Dry-run validation of a block submission
//!   - Submitting, replacing, removing and moving blocks in a lesson
//!   - Loading lessons (every read decodes the stored records)
//!
//! Handlers stay thin: they parse the request, call in here, and map
//! `ServiceError` to a response.

use thiserror::Error;
use tracing::{info, instrument};

use crate::block::{submit, BlockId, BlockRejection, Draft};
use crate::error::UnknownVariantError;
use crate::lesson::LessonError;
use crate::protocol::{
  BlockIn, BlockOut, CreateLessonIn, LessonOut, LessonSummaryOut, MoveIn, ValidateOut, WriteOut,
};
use crate::registry::{lookup, VariantTag};
use crate::state::AppState;
use crate::util::trunc_for_log;

#[derive(Debug, Error)]
pub enum ServiceError {
  #[error("lesson '{0}' not found")]
  LessonNotFound(String),
  #[error("lesson '{0}' already exists")]
  LessonExists(String),
  #[error("invalid block id '{0}'")]
  InvalidBlockId(String),
  #[error(transparent)]
  UnknownVariant(#[from] UnknownVariantError),
  #[error(transparent)]
  Rejected(#[from] BlockRejection),
  #[error(transparent)]
  Lesson(#[from] LessonError),
}

fn parse_variant(tag: &str) -> Result<VariantTag, ServiceError> {
  Ok(lookup(tag)?.tag)
}

fn parse_block_id(raw: &str) -> Result<BlockId, ServiceError> {
  raw.parse().map_err(|_| ServiceError::InvalidBlockId(trunc_for_log(raw, 64)))
}

/// Validate and compose without storing anything.
#[instrument(level = "info", skip(body), fields(variant = %body.variant))]
pub fn validate_block(body: BlockIn) -> Result<ValidateOut, ServiceError> {
  let variant = parse_variant(&body.variant)?;
  let out = match submit(Draft::new(variant, body.content, body.config)) {
    Ok(_) => ValidateOut { valid: true, category: variant.category(), violations: Vec::new(), config_errors: Vec::new() },
    Err(rejection) => ValidateOut {
      valid: false,
      category: variant.category(),
      violations: rejection.content,
      config_errors: rejection.config,
    },
  };
  info!(target: "authoring", %variant, valid = out.valid, violations = out.violations.len(), config_errors = out.config_errors.len(), "Dry-run validation");
  Ok(out)
}

#[instrument(level = "info", skip(state))]
pub async fn list_lessons(state: &AppState) -> Vec<LessonSummaryOut> {
  state.list_lessons().await.iter().map(LessonSummaryOut::from).collect()
}

#[instrument(level = "info", skip(state, body), fields(title = %body.title))]
pub async fn create_lesson(state: &AppState, body: CreateLessonIn) -> Result<LessonSummaryOut, ServiceError> {
  let requested = body.id.clone();
  let lesson = state
    .create_lesson(body.id, body.title)
    .await
    .ok_or_else(|| ServiceError::LessonExists(requested.unwrap_or_default()))?;
  info!(target: "authoring", lesson = %lesson.id(), "Lesson created");
  Ok(LessonSummaryOut::from(&lesson))
}

/// Decode a lesson for display. Records that fail are reported, not fatal.
#[instrument(level = "info", skip(state), fields(%lesson_id))]
pub async fn load_lesson(state: &AppState, lesson_id: &str) -> Result<LessonOut, ServiceError> {
  let lesson = state
    .get_lesson(lesson_id)
    .await
    .ok_or_else(|| ServiceError::LessonNotFound(lesson_id.to_string()))?;
  let load = lesson.load();
  info!(target: "lesson_blocks", lesson = %lesson_id, blocks = load.blocks.len(), failures = load.failures.len(), "Lesson loaded");
  Ok(LessonOut::new(&lesson, load))
}

/// Submit a new block and append it to the lesson.
#[instrument(level = "info", skip(state, body), fields(%lesson_id, variant = %body.variant))]
pub async fn add_block(state: &AppState, lesson_id: &str, body: BlockIn) -> Result<WriteOut, ServiceError> {
  let variant = parse_variant(&body.variant)?;
  let block = submit(Draft::new(variant, body.content, body.config))?;
  let limit = state.limits.max_blocks_per_lesson;
  let revision = state
    .update_lesson(lesson_id, |lesson| lesson.append(body.expected_revision, &block, limit))
    .await
    .ok_or_else(|| ServiceError::LessonNotFound(lesson_id.to_string()))??;
  Ok(WriteOut { revision, block: Some(BlockOut::from(&block)) })
}

/// Full replacement of a block's content and config. Same id, same variant.
#[instrument(level = "info", skip(state, body), fields(%lesson_id, %block_id, variant = %body.variant))]
pub async fn replace_block(
  state: &AppState,
  lesson_id: &str,
  block_id: &str,
  body: BlockIn,
) -> Result<WriteOut, ServiceError> {
  let id = parse_block_id(block_id)?;
  let variant = parse_variant(&body.variant)?;
  let block = submit(Draft::replacing(id, variant, body.content, body.config))?;
  let revision = state
    .update_lesson(lesson_id, |lesson| lesson.replace(body.expected_revision, &block))
    .await
    .ok_or_else(|| ServiceError::LessonNotFound(lesson_id.to_string()))??;
  Ok(WriteOut { revision, block: Some(BlockOut::from(&block)) })
}

#[instrument(level = "info", skip(state), fields(%lesson_id, %block_id))]
pub async fn remove_block(
  state: &AppState,
  lesson_id: &str,
  block_id: &str,
  expected_revision: Option<u64>,
) -> Result<WriteOut, ServiceError> {
  let id = parse_block_id(block_id)?;
  let revision = state
    .update_lesson(lesson_id, |lesson| lesson.remove(expected_revision, id))
    .await
    .ok_or_else(|| ServiceError::LessonNotFound(lesson_id.to_string()))??;
  Ok(WriteOut { revision, block: None })
}

#[instrument(level = "info", skip(state, body), fields(%lesson_id, %block_id, to = body.to))]
pub async fn move_block(
  state: &AppState,
  lesson_id: &str,
  block_id: &str,
  body: MoveIn,
) -> Result<WriteOut, ServiceError> {
  let id = parse_block_id(block_id)?;
  let revision = state
    .update_lesson(lesson_id, |lesson| lesson.move_block(body.expected_revision, id, body.to))
    .await
    .ok_or_else(|| ServiceError::LessonNotFound(lesson_id.to_string()))??;
  Ok(WriteOut { revision, block: None })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::content::ContentDraft;
  use crate::registry::Category;
  use crate::runtime::{ConfigDraft, SpeakingOptions};
  use crate::seeds::DEMO_LESSON_ID;

  fn mcq(answer: &str) -> BlockIn {
    BlockIn {
      variant: "mcq_single".into(),
      content: ContentDraft {
        options: vec!["walks".into(), "walk".into()],
        correct_answers: vec![answer.into()],
        ..Default::default()
      },
      config: ConfigDraft::default(),
      expected_revision: None,
    }
  }

  #[test]
  fn dry_run_reports_everything() {
    let out = validate_block(BlockIn {
      variant: "essay_writing".into(),
      content: ContentDraft::default(),
      config: ConfigDraft {
        speaking: Some(SpeakingOptions { preparation_time_seconds: 10, recording_time_seconds: 60 }),
        ..Default::default()
      },
      expected_revision: None,
    })
    .unwrap();
    assert!(!out.valid);
    assert_eq!(out.category, Category::Writing);
    assert_eq!(out.violations.len(), 1);
    assert_eq!(out.config_errors.len(), 1);

    assert!(validate_block(mcq("walks")).unwrap().valid);
    assert!(matches!(
      validate_block(BlockIn { variant: "hangman".into(), ..mcq("walks") }),
      Err(ServiceError::UnknownVariant(_))
    ));
  }

  #[tokio::test]
  async fn add_then_replace_then_remove() {
    let state = AppState::default();
    let lesson = create_lesson(&state, CreateLessonIn { id: Some("u1".into()), title: "Unit 1".into() })
      .await
      .unwrap();
    assert_eq!(lesson.revision, 0);

    let added = add_block(&state, "u1", BlockIn { expected_revision: Some(0), ..mcq("walks") }).await.unwrap();
    assert_eq!(added.revision, 1);
    let id = added.block.as_ref().unwrap().id.to_string();

    let replaced = replace_block(&state, "u1", &id, BlockIn { expected_revision: Some(1), ..mcq("walk") })
      .await
      .unwrap();
    assert_eq!(replaced.revision, 2);

    let stale = remove_block(&state, "u1", &id, Some(1)).await;
    assert!(matches!(stale, Err(ServiceError::Lesson(LessonError::RevisionConflict { .. }))));

    assert_eq!(remove_block(&state, "u1", &id, Some(2)).await.unwrap().revision, 3);
    assert!(load_lesson(&state, "u1").await.unwrap().blocks.is_empty());
  }

  #[tokio::test]
  async fn rejected_submit_leaves_lesson_untouched() {
    let state = AppState::default();
    let before = state.get_lesson(DEMO_LESSON_ID).await.unwrap();
    let err = add_block(&state, DEMO_LESSON_ID, mcq("run")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Rejected(_)));
    assert_eq!(state.get_lesson(DEMO_LESSON_ID).await.unwrap(), before);
  }

  #[tokio::test]
  async fn unknown_lesson_and_bad_ids() {
    let state = AppState::default();
    assert!(matches!(add_block(&state, "nope", mcq("walks")).await, Err(ServiceError::LessonNotFound(_))));
    assert!(matches!(
      remove_block(&state, DEMO_LESSON_ID, "12", None).await,
      Err(ServiceError::InvalidBlockId(_))
    ));
  }
}
