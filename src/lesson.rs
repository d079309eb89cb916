//! Lessons: ordered block records under an optimistic revision counter.
//!
//! A lesson stores records, not blocks. Reads go through `codec::load_lesson`,
//! so a record that no longer decodes stays in place (it can still be replaced,
//! moved or removed) instead of vanishing on the next write.
//!
//! Every mutation takes the revision the caller last saw. A stale revision is
//! rejected with `LessonError::RevisionConflict` and the lesson is untouched.

use serde::Serialize;
use thiserror::Error;

use crate::block::{Block, BlockId};
use crate::codec::{self, LessonLoad};

/// One stored block record plus the header fields read from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlock {
  id: Option<String>,
  variant: Option<String>,
  bytes: Vec<u8>,
}

impl StoredBlock {
  /// Wrap a raw record as found in storage. Header fields are best effort.
  pub fn from_bytes(bytes: Vec<u8>) -> Self {
    Self { id: codec::peek_id(&bytes), variant: codec::peek_variant(&bytes), bytes }
  }

  pub fn encode(block: &Block) -> Result<Self, serde_json::Error> {
    Ok(Self {
      id: Some(block.id().to_string()),
      variant: Some(block.variant().as_str().to_string()),
      bytes: codec::serialize(block)?,
    })
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  fn is(&self, id: BlockId) -> bool {
    self.id.as_deref().and_then(|s| s.parse::<BlockId>().ok()) == Some(id)
  }
}

impl AsRef<[u8]> for StoredBlock {
  fn as_ref(&self) -> &[u8] {
    &self.bytes
  }
}

#[derive(Debug, Error, Serialize, PartialEq, Eq)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum LessonError {
  #[error("lesson changed since revision {expected} (now {actual})")]
  RevisionConflict { expected: u64, actual: u64 },
  #[error("block {id} is not in this lesson")]
  BlockNotFound { id: BlockId },
  #[error("block {id} is already in this lesson")]
  DuplicateBlock { id: BlockId },
  #[error("block {id} is a '{from}' block and cannot become '{to}'")]
  VariantChanged { id: BlockId, from: String, to: String },
  #[error("lesson is full ({limit} blocks)")]
  TooManyBlocks { limit: usize },
  #[error("could not encode block: {message}")]
  Encode { message: String },
}

impl From<serde_json::Error> for LessonError {
  fn from(err: serde_json::Error) -> Self {
    LessonError::Encode { message: err.to_string() }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lesson {
  id: String,
  title: String,
  revision: u64,
  blocks: Vec<StoredBlock>,
}

impl Lesson {
  pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
    Self { id: id.into(), title: title.into(), revision: 0, blocks: Vec::new() }
  }

  /// Rebuild a lesson from stored records.
  pub fn from_records(id: impl Into<String>, title: impl Into<String>, records: Vec<Vec<u8>>) -> Self {
    Self {
      blocks: records.into_iter().map(StoredBlock::from_bytes).collect(),
      ..Self::new(id, title)
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn revision(&self) -> u64 {
    self.revision
  }

  pub fn len(&self) -> usize {
    self.blocks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.blocks.is_empty()
  }

  pub fn records(&self) -> &[StoredBlock] {
    &self.blocks
  }

  /// Decode every record in order.
  pub fn load(&self) -> LessonLoad {
    codec::load_lesson(&self.blocks)
  }

  /// Append `block` at the end. Returns the new revision.
  pub fn append(&mut self, expected: Option<u64>, block: &Block, limit: usize) -> Result<u64, LessonError> {
    self.check_revision(expected)?;
    if self.position(block.id()).is_some() {
      return Err(LessonError::DuplicateBlock { id: block.id() });
    }
    if self.blocks.len() >= limit {
      return Err(LessonError::TooManyBlocks { limit });
    }
    self.blocks.push(StoredBlock::encode(block)?);
    Ok(self.bump())
  }

  /// Replace the record with `block`'s id by `block`. The variant must match
  /// the stored record's.
  pub fn replace(&mut self, expected: Option<u64>, block: &Block) -> Result<u64, LessonError> {
    self.check_revision(expected)?;
    let id = block.id();
    let index = self.position(id).ok_or(LessonError::BlockNotFound { id })?;

    let stored = self.blocks[index].variant.as_deref().unwrap_or_default();
    if stored != block.variant().as_str() {
      return Err(LessonError::VariantChanged {
        id,
        from: stored.to_string(),
        to: block.variant().as_str().to_string(),
      });
    }
    self.blocks[index] = StoredBlock::encode(block)?;
    Ok(self.bump())
  }

  /// Remove a record. Works for records that no longer decode.
  pub fn remove(&mut self, expected: Option<u64>, id: BlockId) -> Result<u64, LessonError> {
    self.check_revision(expected)?;
    let index = self.position(id).ok_or(LessonError::BlockNotFound { id })?;
    self.blocks.remove(index);
    Ok(self.bump())
  }

  /// Move a record to `to`, clamped to the end of the lesson.
  pub fn move_block(&mut self, expected: Option<u64>, id: BlockId, to: usize) -> Result<u64, LessonError> {
    self.check_revision(expected)?;
    let from = self.position(id).ok_or(LessonError::BlockNotFound { id })?;
    let record = self.blocks.remove(from);
    let to = to.min(self.blocks.len());
    self.blocks.insert(to, record);
    Ok(self.bump())
  }

  /// `None` skips the check (single-writer tools, imports).
  fn check_revision(&self, expected: Option<u64>) -> Result<(), LessonError> {
    match expected {
      Some(expected) if expected != self.revision => {
        Err(LessonError::RevisionConflict { expected, actual: self.revision })
      }
      _ => Ok(()),
    }
  }

  fn position(&self, id: BlockId) -> Option<usize> {
    self.blocks.iter().position(|b| b.is(id))
  }

  fn bump(&mut self) -> u64 {
    self.revision += 1;
    self.revision
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::{submit, Draft, DraftBuilder};
  use crate::registry::VariantTag;
  use serde_json::json;

  const LIMIT: usize = 200;

  fn text(passage: &str) -> Block {
    submit(DraftBuilder::new(VariantTag::Text).passage(passage).build()).unwrap()
  }

  fn passages(lesson: &Lesson) -> Vec<String> {
    lesson
      .load()
      .blocks
      .iter()
      .map(|b| b.content().to_draft().passage.unwrap_or_default())
      .collect()
  }

  #[test]
  fn append_replace_remove_bump_revision() {
    let mut lesson = Lesson::new("unit-1", "Present simple");
    let a = text("A");
    let b = text("B");
    assert_eq!(lesson.append(Some(0), &a, LIMIT), Ok(1));
    assert_eq!(lesson.append(Some(1), &b, LIMIT), Ok(2));

    let edited = submit(Draft::editing(&a).with_content(crate::content::ContentDraft {
      passage: Some("A2".into()),
      ..Default::default()
    }))
    .unwrap();
    assert_eq!(lesson.replace(Some(2), &edited), Ok(3));
    assert_eq!(passages(&lesson), vec!["A2", "B"]);

    assert_eq!(lesson.remove(Some(3), b.id()), Ok(4));
    assert_eq!(passages(&lesson), vec!["A2"]);
    assert_eq!(lesson.revision(), 4);
  }

  #[test]
  fn stale_revision_is_rejected_without_change() {
    let mut lesson = Lesson::new("l", "t");
    lesson.append(None, &text("A"), LIMIT).unwrap();
    let before = lesson.clone();
    assert_eq!(
      lesson.append(Some(0), &text("B"), LIMIT),
      Err(LessonError::RevisionConflict { expected: 0, actual: 1 })
    );
    assert_eq!(lesson, before);
  }

  #[test]
  fn variant_cannot_change_on_replace() {
    let mut lesson = Lesson::new("l", "t");
    let a = text("A");
    lesson.append(None, &a, LIMIT).unwrap();

    let impostor = submit(Draft::replacing(
      a.id(),
      VariantTag::Image,
      crate::testkit::minimal_draft(VariantTag::Image),
      Default::default(),
    ))
    .unwrap();
    assert!(matches!(
      lesson.replace(None, &impostor),
      Err(LessonError::VariantChanged { from, to, .. }) if from == "text" && to == "image"
    ));
  }

  #[test]
  fn move_reorders_and_clamps() {
    let mut lesson = Lesson::new("l", "t");
    let blocks: Vec<Block> = ["A", "B", "C"].iter().map(|p| text(p)).collect();
    for b in &blocks {
      lesson.append(None, b, LIMIT).unwrap();
    }
    lesson.move_block(None, blocks[2].id(), 0).unwrap();
    assert_eq!(passages(&lesson), vec!["C", "A", "B"]);
    lesson.move_block(None, blocks[2].id(), 99).unwrap();
    assert_eq!(passages(&lesson), vec!["A", "B", "C"]);
    let missing = BlockId::new();
    assert_eq!(lesson.move_block(None, missing, 0), Err(LessonError::BlockNotFound { id: missing }));
    assert_eq!(lesson.revision(), 5);
  }

  #[test]
  fn limit_and_duplicates() {
    let mut lesson = Lesson::new("l", "t");
    let a = text("A");
    lesson.append(None, &a, 1).unwrap();
    assert_eq!(lesson.append(None, &text("B"), 1), Err(LessonError::TooManyBlocks { limit: 1 }));
    assert_eq!(lesson.append(None, &a, 5), Err(LessonError::DuplicateBlock { id: a.id() }));
  }

  #[test]
  fn unreadable_records_survive_writes() {
    let retired_id = BlockId::new();
    let retired = serde_json::to_vec(&json!({
      "schemaVersion": 2,
      "id": retired_id.to_string(),
      "variant": "hangman",
      "content": {}
    }))
    .unwrap();
    let mut lesson = Lesson::from_records("l", "t", vec![retired.clone()]);
    assert_eq!(lesson.records()[0].bytes(), retired.as_slice());

    lesson.append(None, &text("A"), LIMIT).unwrap();
    let load = lesson.load();
    assert_eq!(load.blocks.len(), 1);
    assert_eq!(load.failures.len(), 1);
    assert_eq!(load.failures[0].position, 0);

    lesson.remove(None, retired_id).unwrap();
    let load = lesson.load();
    assert_eq!(load.blocks.len(), 1);
    assert!(load.failures.is_empty());
  }

  #[test]
  fn padded_stored_tag_is_unreadable_not_replaceable() {
    let a = text("A");
    let mut record: serde_json::Value = serde_json::from_slice(&codec::serialize(&a).unwrap()).unwrap();
    record["variant"] = json!(" text ");
    let mut lesson = Lesson::from_records("l", "t", vec![serde_json::to_vec(&record).unwrap()]);

    let load = lesson.load();
    assert!(load.blocks.is_empty());
    assert!(matches!(
      &load.failures[0].error,
      codec::DeserializationError::UnknownVariant(e) if e.tag == " text "
    ));
    assert!(matches!(lesson.replace(None, &a), Err(LessonError::VariantChanged { .. })));
    assert_eq!(lesson.remove(None, a.id()), Ok(1));
  }
}
