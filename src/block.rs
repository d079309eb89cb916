//! Blocks and drafts: the authoring boundary.
//!
//! Lifecycle of a block:
//!
//! ```text
//! Draft ──submit──▶ Block ──serialize──▶ stored record
//!   ▲                 │
//!   └──── editing ────┘      (full replace, same id, same variant)
//! ```
//!
//! A `Block` can only come out of `submit` or `codec::deserialize`, so holding
//! one means its content and config passed validation.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::content::{
  BlankDraft, ContentDraft, GroupDraft, MediaDraft, PairDraft, ValidatedContent,
};
use crate::registry::{Category, VariantTag};
use crate::runtime::{compose_draft, ConfigDraft, ConfigError, ListeningOptions, RuntimeConfig, SpeakingOptions};
use crate::validate::{validate, Violation};

/// Opaque, immutable block identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(Uuid);

impl BlockId {
  pub fn new() -> Self {
    Self(Uuid::new_v4())
  }
}

impl Default for BlockId {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for BlockId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

impl FromStr for BlockId {
  type Err = uuid::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Uuid::parse_str(s.trim()).map(Self)
  }
}

/// A validated unit of lesson content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
  id: BlockId,
  content: ValidatedContent,
  config: RuntimeConfig,
}

impl Block {
  pub fn id(&self) -> BlockId {
    self.id
  }

  pub fn variant(&self) -> VariantTag {
    self.content.variant()
  }

  pub fn category(&self) -> Category {
    self.content.category()
  }

  pub fn content(&self) -> &ValidatedContent {
    &self.content
  }

  pub fn config(&self) -> &RuntimeConfig {
    &self.config
  }
}

/// Why a draft (or a stored record) could not become a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Error)]
#[error("block rejected: {} content violation(s), {} config error(s)", .content.len(), .config.len())]
pub struct BlockRejection {
  pub content: Vec<Violation>,
  pub config: Vec<ConfigError>,
}

/// Validate content and compose config for one block. Both run regardless of
/// the other's outcome.
pub(crate) fn accept(
  id: BlockId,
  variant: VariantTag,
  content: &ContentDraft,
  config: &ConfigDraft,
) -> Result<Block, BlockRejection> {
  match (validate(variant, content), compose_draft(variant, config)) {
    (Ok(content), Ok(config)) => Ok(Block { id, content, config }),
    (content, config) => Err(BlockRejection {
      content: content.err().map(|e| e.into_inner()).unwrap_or_default(),
      config: config.err().map(|e| e.0).unwrap_or_default(),
    }),
  }
}

/// Unvalidated block input. Immutable once built; edits produce a new draft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
  block_id: Option<BlockId>,
  variant: VariantTag,
  content: ContentDraft,
  config: ConfigDraft,
}

impl Draft {
  /// Draft for a new block. The id is assigned on submit.
  pub fn new(variant: VariantTag, content: ContentDraft, config: ConfigDraft) -> Self {
    Self { block_id: None, variant, content, config }
  }

  /// Full replacement of an existing block's content and config.
  pub fn replacing(block_id: BlockId, variant: VariantTag, content: ContentDraft, config: ConfigDraft) -> Self {
    Self { block_id: Some(block_id), variant, content, config }
  }

  /// The block's current values as an editable draft. Same id, same variant.
  pub fn editing(block: &Block) -> Self {
    Self::replacing(block.id, block.variant(), block.content.to_draft(), block.config.to_draft())
  }

  pub fn block_id(&self) -> Option<BlockId> {
    self.block_id
  }

  pub fn variant(&self) -> VariantTag {
    self.variant
  }

  pub fn content(&self) -> &ContentDraft {
    &self.content
  }

  pub fn config(&self) -> &ConfigDraft {
    &self.config
  }

  pub fn with_content(self, content: ContentDraft) -> Self {
    Self { content, ..self }
  }

  pub fn with_config(self, config: ConfigDraft) -> Self {
    Self { config, ..self }
  }
}

/// Empty draft for `variant`.
pub fn create_draft(variant: VariantTag) -> Draft {
  Draft::new(variant, ContentDraft::default(), ConfigDraft::default())
}

/// Validate a draft into a block.
pub fn submit(draft: Draft) -> Result<Block, BlockRejection> {
  let id = draft.block_id.unwrap_or_default();
  let result = accept(id, draft.variant, &draft.content, &draft.config);
  match &result {
    Ok(block) => debug!(target: "authoring", id = %block.id, variant = %block.variant(), "Draft accepted"),
    Err(e) => debug!(target: "authoring", variant = %draft.variant, error = %e, "Draft rejected"),
  }
  result
}

/// Accumulates field values and yields a `Draft` on `build`.
#[derive(Clone, Debug)]
pub struct DraftBuilder {
  block_id: Option<BlockId>,
  variant: VariantTag,
  content: ContentDraft,
  config: ConfigDraft,
}

impl DraftBuilder {
  pub fn new(variant: VariantTag) -> Self {
    Self { block_id: None, variant, content: ContentDraft::default(), config: ConfigDraft::default() }
  }

  /// Start a replacement for `block` from empty content and default config.
  pub fn replacing(block: &Block) -> Self {
    Self { block_id: Some(block.id), ..Self::new(block.variant()) }
  }

  pub fn text(mut self, value: impl Into<String>) -> Self {
    self.content.text = Some(value.into());
    self
  }

  pub fn passage(mut self, value: impl Into<String>) -> Self {
    self.content.passage = Some(value.into());
    self
  }

  pub fn prompt(mut self, value: impl Into<String>) -> Self {
    self.content.prompt = Some(value.into());
    self
  }

  pub fn rubric(mut self, value: impl Into<String>) -> Self {
    self.content.rubric = Some(value.into());
    self
  }

  pub fn sample_answer(mut self, value: impl Into<String>) -> Self {
    self.content.sample_answer = Some(value.into());
    self
  }

  pub fn option(mut self, value: impl Into<String>) -> Self {
    self.content.options.push(value.into());
    self
  }

  pub fn options<I, S>(mut self, values: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.content.options.extend(values.into_iter().map(Into::into));
    self
  }

  pub fn correct_answer(mut self, value: impl Into<String>) -> Self {
    self.content.correct_answers.push(value.into());
    self
  }

  pub fn blank(mut self, answer: impl Into<String>) -> Self {
    self.content.blanks.push(BlankDraft { answer: answer.into(), ..Default::default() });
    self
  }

  pub fn marked_blank(mut self, marker: impl Into<String>, answer: impl Into<String>) -> Self {
    self.content.blanks.push(BlankDraft {
      marker: Some(marker.into()),
      answer: answer.into(),
      alternatives: Vec::new(),
    });
    self
  }

  pub fn pair(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
    self.content.matching_pairs.push(PairDraft { left: left.into(), right: right.into() });
    self
  }

  pub fn group<I, S>(mut self, name: impl Into<String>, items: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.content.categories.push(GroupDraft {
      name: name.into(),
      items: items.into_iter().map(Into::into).collect(),
    });
    self
  }

  pub fn item(mut self, value: impl Into<String>) -> Self {
    self.content.items.push(value.into());
    self
  }

  pub fn media_url(mut self, url: impl Into<String>) -> Self {
    self.content.media = Some(MediaDraft { url: Some(url.into()), file_id: None });
    self
  }

  pub fn media_file(mut self, file_id: impl Into<String>) -> Self {
    self.content.media = Some(MediaDraft { url: None, file_id: Some(file_id.into()) });
    self
  }

  pub fn time_limit_seconds(mut self, seconds: i64) -> Self {
    self.config.universal.time_limit_seconds = Some(seconds);
    self
  }

  pub fn max_attempts(mut self, attempts: i64) -> Self {
    self.config.universal.max_attempts = Some(attempts);
    self
  }

  pub fn show_solution_after_exhausted(mut self, show: bool) -> Self {
    self.config.universal.show_solution_after_exhausted = Some(show);
    self
  }

  pub fn ai_evaluation(mut self, prompt: Option<String>) -> Self {
    self.config.universal.ai_evaluation_enabled = Some(true);
    self.config.universal.ai_evaluation_prompt = prompt;
    self
  }

  pub fn exam_mode(mut self, enabled: bool) -> Self {
    self.config.universal.exam_mode_enabled = Some(enabled);
    self
  }

  pub fn points(mut self, points: i64) -> Self {
    self.config.universal.scoring.points = Some(points);
    self
  }

  pub fn partial_credit(mut self, allowed: bool) -> Self {
    self.config.universal.scoring.partial_credit_allowed = Some(allowed);
    self
  }

  pub fn speaking(mut self, preparation_time_seconds: i64, recording_time_seconds: i64) -> Self {
    self.config.speaking = Some(SpeakingOptions { preparation_time_seconds, recording_time_seconds });
    self
  }

  pub fn listening(mut self, max_playback_count: i64, auto_play_enabled: bool) -> Self {
    self.config.listening = Some(ListeningOptions { max_playback_count, auto_play_enabled });
    self
  }

  pub fn build(self) -> Draft {
    Draft { block_id: self.block_id, variant: self.variant, content: self.content, config: self.config }
  }
}
