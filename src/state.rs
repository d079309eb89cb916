//! Application state: the in-memory lesson store and service limits.
//!
//! This module owns:
//!   - lessons by id, each holding only serialized block records
//!   - the limits from TOML config (or defaults)
//!
//! Startup imports the configured lesson bank (decoded in parallel to report
//! what loads and what does not). Without a bank, the demo lesson is seeded.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::codec::load_lessons_parallel;
use crate::config::{load_service_config_from_env, Limits, ServiceConfig};
use crate::lesson::{Lesson, LessonError};
use crate::seeds::{demo_blocks, DEMO_LESSON_ID, DEMO_LESSON_TITLE};

#[derive(Clone)]
pub struct AppState {
    pub lessons: Arc<RwLock<HashMap<String, Lesson>>>,
    pub limits: Limits,
}

impl AppState {
    /// Build state from env: load config, import lessons, seed the demo.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        Self::from_config(load_service_config_from_env().unwrap_or_default())
    }

    #[instrument(level = "info", skip_all, fields(lessons = cfg.lessons.len()))]
    pub fn from_config(cfg: ServiceConfig) -> Self {
        let mut lessons = HashMap::<String, Lesson>::new();

        let records: Vec<Vec<Vec<u8>>> = cfg.lessons.iter().map(|l| l.records()).collect();
        let loads = load_lessons_parallel(&records);
        for ((lc, records), load) in cfg.lessons.iter().zip(records).zip(loads) {
            let id = lc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
            if lessons.contains_key(&id) {
                warn!(target: "lesson_blocks", lesson = %id, "Duplicate lesson id in config; keeping the first");
                continue;
            }
            info!(
                target: "lesson_blocks",
                lesson = %id,
                title = %lc.title,
                blocks = load.blocks.len(),
                failures = load.failures.len(),
                "Imported lesson"
            );
            lessons.insert(id.clone(), Lesson::from_records(id, lc.title.clone(), records));
        }

        if lessons.is_empty() {
            let mut demo = Lesson::new(DEMO_LESSON_ID, DEMO_LESSON_TITLE);
            for block in demo_blocks() {
                if let Err(e) = demo.append(None, &block, cfg.limits.max_blocks_per_lesson) {
                    warn!(target: "lesson_blocks", error = %e, "Demo block not added");
                }
            }
            info!(target: "lesson_blocks", lesson = DEMO_LESSON_ID, blocks = demo.len(), "Seeded demo lesson");
            lessons.insert(DEMO_LESSON_ID.to_string(), demo);
        }

        Self {
            lessons: Arc::new(RwLock::new(lessons)),
            limits: cfg.limits,
        }
    }

    /// Snapshot of every lesson, sorted by id.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_lessons(&self) -> Vec<Lesson> {
        let lessons = self.lessons.read().await;
        let mut out: Vec<Lesson> = lessons.values().cloned().collect();
        out.sort_by(|a, b| a.id().cmp(b.id()));
        out
    }

    /// Create an empty lesson. `None` if the requested id is taken.
    #[instrument(level = "info", skip(self), fields(%title))]
    pub async fn create_lesson(&self, id: Option<String>, title: String) -> Option<Lesson> {
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut lessons = self.lessons.write().await;
        if lessons.contains_key(&id) {
            return None;
        }
        let lesson = Lesson::new(id.clone(), title);
        lessons.insert(id, lesson.clone());
        Some(lesson)
    }

    /// Read-only access to a lesson by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_lesson(&self, id: &str) -> Option<Lesson> {
        self.lessons.read().await.get(id).cloned()
    }

    /// Run a mutation against one lesson under the write lock.
    /// Returns `None` when the lesson does not exist.
    #[instrument(level = "debug", skip(self, op), fields(%id))]
    pub async fn update_lesson<T>(
        &self,
        id: &str,
        op: impl FnOnce(&mut Lesson) -> Result<T, LessonError>,
    ) -> Option<Result<T, LessonError>> {
        let mut lessons = self.lessons.write().await;
        let lesson = lessons.get_mut(id)?;
        let result = op(lesson);
        match &result {
            Ok(_) => info!(target: "authoring", lesson = %id, revision = lesson.revision(), "Lesson updated"),
            Err(e) => warn!(target: "authoring", lesson = %id, error = %e, "Lesson update refused"),
        }
        Some(result)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(ServiceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_service_config;

    #[tokio::test]
    async fn seeds_demo_without_bank() {
        let state = AppState::default();
        let demo = state.get_lesson(DEMO_LESSON_ID).await.expect("demo lesson");
        let load = demo.load();
        assert!(load.failures.is_empty());
        assert_eq!(load.blocks.len(), demo.len());
        assert!(!demo.is_empty());
    }

    #[tokio::test]
    async fn bank_replaces_demo_and_keeps_bad_records() {
        let cfg = parse_service_config(
            r#"
[[lessons]]
id = "unit-9"
title = "Mixed"

[[lessons.blocks]]
schemaVersion = 2
variant = "text"
content = { passage = "Hello." }

[[lessons.blocks]]
schemaVersion = 2
variant = "crossword"
"#,
        )
        .unwrap();
        let state = AppState::from_config(cfg);
        assert!(state.get_lesson(DEMO_LESSON_ID).await.is_none());

        let lesson = state.get_lesson("unit-9").await.unwrap();
        assert_eq!(lesson.len(), 2);
        let load = lesson.load();
        assert_eq!(load.blocks.len(), 1);
        assert_eq!(load.failures.len(), 1);
        assert_eq!(load.failures[0].position, 1);
    }

    #[tokio::test]
    async fn create_refuses_taken_ids() {
        let state = AppState::default();
        assert!(state.create_lesson(Some("x".into()), "X".into()).await.is_some());
        assert!(state.create_lesson(Some("x".into()), "Y".into()).await.is_none());
        assert!(state.update_lesson("missing", |l| Ok(l.revision())).await.is_none());
    }
}
