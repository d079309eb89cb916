//! Loading service configuration (limits + lesson bank) from TOML.
//!
//! Lesson blocks in the bank are stored records written in TOML syntax; they
//! go through the same decoder as any other stored record.
//!
//! ```toml
//! [limits]
//! max_blocks_per_lesson = 200
//!
//! [[lessons]]
//! id = "unit-1"
//! title = "Present simple"
//!
//! [[lessons.blocks]]
//! schemaVersion = 2
//! variant = "mcq_single"
//! content = { options = ["walks", "walk"], correctAnswers = ["walks"] }
//! ```

use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

pub const DEFAULT_MAX_BLOCKS_PER_LESSON: usize = 200;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ServiceConfig {
  #[serde(default)]
  pub limits: Limits,
  #[serde(default)]
  pub lessons: Vec<LessonCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Limits {
  #[serde(default = "default_max_blocks")]
  pub max_blocks_per_lesson: usize,
}

impl Default for Limits {
  fn default() -> Self {
    Self { max_blocks_per_lesson: DEFAULT_MAX_BLOCKS_PER_LESSON }
  }
}

fn default_max_blocks() -> usize {
  DEFAULT_MAX_BLOCKS_PER_LESSON
}

/// Lesson entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct LessonCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default)] pub blocks: Vec<toml::Value>,
}

impl LessonCfg {
  /// Block entries as JSON records. Entries without an `id` get a fresh one
  /// so they stay addressable once loaded.
  pub fn records(&self) -> Vec<Vec<u8>> {
    let mut out = Vec::with_capacity(self.blocks.len());
    for (position, entry) in self.blocks.iter().enumerate() {
      let mut record = match serde_json::to_value(entry) {
        Ok(v) => v,
        Err(e) => {
          error!(target: "lesson_blocks", title = %self.title, position, error = %e, "Skipping unconvertible block entry");
          continue;
        }
      };
      if let Some(obj) = record.as_object_mut() {
        obj.entry("id").or_insert_with(|| Uuid::new_v4().to_string().into());
      }
      match serde_json::to_vec(&record) {
        Ok(bytes) => out.push(bytes),
        Err(e) => error!(target: "lesson_blocks", title = %self.title, position, error = %e, "Skipping unencodable block entry"),
      }
    }
    out
  }
}

/// Attempt to load `ServiceConfig` from LESSONS_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_service_config_from_env() -> Option<ServiceConfig> {
  let path = std::env::var("LESSONS_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_service_config(&s) {
      Ok(cfg) => {
        info!(target: "lesson_blocks", %path, lessons = cfg.lessons.len(), "Loaded service config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lesson_blocks", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lesson_blocks", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_service_config(s: &str) -> Result<ServiceConfig, toml::de::Error> {
  toml::from_str(s)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::load_lesson;
  use crate::registry::VariantTag;

  const BANK: &str = r#"
[limits]
max_blocks_per_lesson = 50

[[lessons]]
id = "unit-1"
title = "Present simple"

[[lessons.blocks]]
schemaVersion = 2
variant = "mcq_single"
content = { options = ["walks", "walk"], correctAnswers = ["walks"] }
config = { maxAttempts = 2 }

[[lessons.blocks]]
schemaVersion = 1
id = "6f1c2b8e-3f7a-4d2e-9a61-0c5d8e7f9b10"
variant = "cue_card"
content = { prompt = "Describe your morning routine." }
config = { points = 20, speaking = { preparationTimeSeconds = 30, recordingTimeSeconds = 90 } }
"#;

  #[test]
  fn defaults_without_limits_section() {
    let cfg = parse_service_config("").unwrap();
    assert_eq!(cfg.limits.max_blocks_per_lesson, DEFAULT_MAX_BLOCKS_PER_LESSON);
    assert!(cfg.lessons.is_empty());
  }

  #[test]
  fn bank_entries_decode_as_records() {
    let cfg = parse_service_config(BANK).unwrap();
    assert_eq!(cfg.limits.max_blocks_per_lesson, 50);
    assert_eq!(cfg.lessons.len(), 1);

    let records = cfg.lessons[0].records();
    let load = load_lesson(&records);
    assert!(load.failures.is_empty(), "{:?}", load.failures);
    assert_eq!(load.blocks.len(), 2);
    assert_eq!(load.blocks[0].variant(), VariantTag::McqSingle);
    assert_eq!(load.blocks[0].config().max_attempts, 2);
    assert_eq!(load.blocks[1].id().to_string(), "6f1c2b8e-3f7a-4d2e-9a61-0c5d8e7f9b10");
    assert_eq!(load.blocks[1].config().scoring.points, 20);
  }

  #[test]
  fn missing_title_is_a_parse_error() {
    assert!(parse_service_config("[[lessons]]\nid = \"x\"\n").is_err());
  }
}
