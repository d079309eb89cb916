//! Canonical block records.
//!
//! A stored block is a JSON document:
//!
//! ```json
//! { "schemaVersion": 2, "id": "…", "variant": "mcq_single",
//!   "content": { … }, "config": { … } }
//! ```
//!
//! - `content` and `config` use the same field-map shapes authors submit.
//! - Decoding never trusts storage: records are migrated to the current schema
//!   version, then re-validated and re-composed exactly like a fresh submit.
//! - A lesson load isolates failures per record; one bad block never hides the
//!   rest of the lesson.

use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::block::{accept, Block, BlockId, BlockRejection};
use crate::content::ContentDraft;
use crate::error::UnknownVariantError;
use crate::registry::{lookup, VariantTag};
use crate::runtime::{ConfigDraft, RuntimeConfig};

/// Version written by `serialize`.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum DeserializationError {
  #[error("malformed record: {message}")]
  Malformed { message: String },
  #[error("record has no schemaVersion")]
  MissingSchemaVersion,
  #[error("schema version {found} is not supported (current is {current})")]
  UnsupportedSchemaVersion { found: u64, current: u32 },
  #[error("invalid block id '{id}'")]
  InvalidId { id: String },
  #[error(transparent)]
  UnknownVariant(#[from] UnknownVariantError),
  #[error(transparent)]
  Invalid(#[from] BlockRejection),
}

impl DeserializationError {
  fn malformed(err: impl std::fmt::Display) -> Self {
    Self::Malformed { message: err.to_string() }
  }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordOut<'a> {
  schema_version: u32,
  id: BlockId,
  variant: VariantTag,
  content: ContentDraft,
  config: &'a RuntimeConfig,
}

/// Fields read before `content` and `config` are decoded.
#[derive(Deserialize)]
struct RecordHeader {
  id: String,
  variant: String,
}

/// Encode a block as a current-version record.
pub fn serialize(block: &Block) -> Result<Vec<u8>, serde_json::Error> {
  serde_json::to_vec(&RecordOut {
    schema_version: CURRENT_SCHEMA_VERSION,
    id: block.id(),
    variant: block.variant(),
    content: block.content().to_draft(),
    config: block.config(),
  })
}

/// Decode a record into a block, migrating and re-validating on the way.
pub fn deserialize(bytes: &[u8]) -> Result<Block, DeserializationError> {
  let mut record: Value = serde_json::from_slice(bytes).map_err(DeserializationError::malformed)?;
  let version = schema_version(&record)?;
  migrate(&mut record, version)?;

  let header = RecordHeader::deserialize(&record).map_err(DeserializationError::malformed)?;
  let variant = lookup(&header.variant)?.tag;
  let id: BlockId = header
    .id
    .parse()
    .map_err(|_| DeserializationError::InvalidId { id: header.id.clone() })?;

  let content: ContentDraft = body(&mut record, "content")?;
  let config: ConfigDraft = body(&mut record, "config")?;
  let block = accept(id, variant, &content, &config)?;
  Ok(block)
}

/// Decode one body section; absent or null means empty.
fn body<T: DeserializeOwned + Default>(record: &mut Value, key: &str) -> Result<T, DeserializationError> {
  match record.get_mut(key).map(Value::take) {
    None | Some(Value::Null) => Ok(T::default()),
    Some(value) => {
      serde_json::from_value(value).map_err(|e| DeserializationError::malformed(format!("{key}: {e}")))
    }
  }
}

fn schema_version(record: &Value) -> Result<u32, DeserializationError> {
  let found = record
    .get("schemaVersion")
    .and_then(Value::as_u64)
    .ok_or(DeserializationError::MissingSchemaVersion)?;
  match u32::try_from(found) {
    Ok(v) if (1..=CURRENT_SCHEMA_VERSION).contains(&v) => Ok(v),
    _ => Err(DeserializationError::UnsupportedSchemaVersion { found, current: CURRENT_SCHEMA_VERSION }),
  }
}

// ---------------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------------

type Migration = fn(&mut Value) -> Result<(), DeserializationError>;

/// `MIGRATIONS[n]` lifts a record from version `n + 1` to `n + 2`.
const MIGRATIONS: &[Migration] = &[nest_scoring];

fn migrate(record: &mut Value, from: u32) -> Result<(), DeserializationError> {
  for (step, migration) in MIGRATIONS.iter().enumerate().skip(from as usize - 1) {
    migration(record)?;
    debug!(target: "lesson_blocks", from = step + 1, to = step + 2, "Migrated block record");
  }
  if let Some(obj) = record.as_object_mut() {
    obj.insert("schemaVersion".into(), CURRENT_SCHEMA_VERSION.into());
  }
  Ok(())
}

/// v1 kept `points` and `partialCredit` flat in config; v2 nests them under
/// `scoring`.
fn nest_scoring(record: &mut Value) -> Result<(), DeserializationError> {
  let Some(config) = record.get_mut("config").and_then(Value::as_object_mut) else {
    return Ok(());
  };
  let points = config.remove("points");
  let partial = config.remove("partialCredit");
  if points.is_none() && partial.is_none() {
    return Ok(());
  }

  let scoring = config
    .entry("scoring")
    .or_insert_with(|| Value::Object(Map::new()))
    .as_object_mut()
    .ok_or_else(|| DeserializationError::malformed("config.scoring is not an object"))?;
  if let Some(points) = points {
    scoring.entry("points").or_insert(points);
  }
  if let Some(partial) = partial {
    scoring.entry("partialCreditAllowed").or_insert(partial);
  }
  Ok(())
}

// ---------------------------------------------------------------------------
// Lesson loads
// ---------------------------------------------------------------------------

/// The id field of a record, read without decoding the rest.
pub fn peek_id(bytes: &[u8]) -> Option<String> {
  peek(bytes, "id")
}

/// The variant tag of a record, read without decoding the rest.
pub fn peek_variant(bytes: &[u8]) -> Option<String> {
  peek(bytes, "variant")
}

fn peek(bytes: &[u8], key: &str) -> Option<String> {
  let value: Value = serde_json::from_slice(bytes).ok()?;
  value.get(key)?.as_str().map(str::to_string)
}

/// A record that could not be decoded, with its position in the lesson.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadFailure {
  pub position: usize,
  pub block_id: Option<String>,
  pub error: DeserializationError,
}

#[derive(Debug, Default)]
pub struct LessonLoad {
  pub blocks: Vec<Block>,
  pub failures: Vec<LoadFailure>,
}

/// Decode every record of a lesson in order, collecting failures instead of
/// aborting.
pub fn load_lesson<R: AsRef<[u8]>>(records: &[R]) -> LessonLoad {
  let mut load = LessonLoad::default();
  for (position, record) in records.iter().enumerate() {
    let bytes = record.as_ref();
    match deserialize(bytes) {
      Ok(block) => load.blocks.push(block),
      Err(error) => {
        let block_id = peek_id(bytes);
        warn!(
          target: "lesson_blocks",
          position,
          block_id = block_id.as_deref().unwrap_or("?"),
          %error,
          "Skipping unreadable block record"
        );
        load.failures.push(LoadFailure { position, block_id, error });
      }
    }
  }
  load
}

/// Decode many lessons at once on the rayon pool. Output order follows input.
pub fn load_lessons_parallel<R: AsRef<[u8]> + Sync>(lessons: &[Vec<R>]) -> Vec<LessonLoad> {
  lessons.par_iter().map(|records| load_lesson(records)).collect()
}
