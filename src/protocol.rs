//! Public protocol structs for the HTTP authoring API (serde ready).
//! Request bodies reuse the core draft shapes; responses spell blocks out in
//! the same field-map form they are stored in.

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId};
use crate::codec::{DeserializationError, LessonLoad, LoadFailure};
use crate::content::ContentDraft;
use crate::lesson::Lesson;
use crate::registry::{Category, VariantTag};
use crate::runtime::{ConfigDraft, ConfigError, RuntimeConfig};
use crate::validate::Violation;

//
// Requests
//

/// Block submission: a new block, a replacement, or a dry-run validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockIn {
    pub variant: String,
    #[serde(default)]
    pub content: ContentDraft,
    #[serde(default)]
    pub config: ConfigDraft,
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLessonIn {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveIn {
    pub to: usize,
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionQuery {
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

//
// Responses
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockOut {
    pub id: BlockId,
    pub variant: VariantTag,
    pub category: Category,
    pub content: ContentDraft,
    pub config: RuntimeConfig,
}

impl From<&Block> for BlockOut {
    fn from(b: &Block) -> Self {
        Self {
            id: b.id(),
            variant: b.variant(),
            category: b.category(),
            content: b.content().to_draft(),
            config: b.config().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadFailureOut {
    pub position: usize,
    pub block_id: Option<String>,
    pub message: String,
    pub error: DeserializationError,
}

impl From<LoadFailure> for LoadFailureOut {
    fn from(f: LoadFailure) -> Self {
        Self {
            position: f.position,
            block_id: f.block_id,
            message: f.error.to_string(),
            error: f.error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LessonOut {
    pub id: String,
    pub title: String,
    pub revision: u64,
    pub blocks: Vec<BlockOut>,
    pub failures: Vec<LoadFailureOut>,
}

impl LessonOut {
    pub fn new(lesson: &Lesson, load: LessonLoad) -> Self {
        Self {
            id: lesson.id().to_string(),
            title: lesson.title().to_string(),
            revision: lesson.revision(),
            blocks: load.blocks.iter().map(BlockOut::from).collect(),
            failures: load.failures.into_iter().map(LoadFailureOut::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LessonSummaryOut {
    pub id: String,
    pub title: String,
    pub revision: u64,
    pub blocks: usize,
}

impl From<&Lesson> for LessonSummaryOut {
    fn from(l: &Lesson) -> Self {
        Self {
            id: l.id().to_string(),
            title: l.title().to_string(),
            revision: l.revision(),
            blocks: l.len(),
        }
    }
}

/// Result of a write: the lesson's new revision and, for submits, the block.
#[derive(Debug, Serialize)]
pub struct WriteOut {
    pub revision: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockOut>,
}

/// Dry-run result. Lists are empty when the draft is valid.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateOut {
    pub valid: bool,
    pub category: Category,
    pub violations: Vec<Violation>,
    pub config_errors: Vec<ConfigError>,
}
