//! Lesson content blocks: variant registry, validation, runtime config and
//! versioned persistence, plus the HTTP authoring service built on top.
//!
//! Core (pure, synchronous):
//!   registry → classify → {validate, runtime} → block → codec → lesson
//!
//! Service (axum):
//!   config, telemetry, seeds, state, protocol, logic, routes

pub mod error;
pub mod registry;
pub mod classify;
pub mod content;
pub mod validate;
pub mod runtime;
pub mod block;
pub mod codec;
pub mod lesson;

pub mod config;
pub mod telemetry;
pub mod seeds;
pub mod state;
pub mod protocol;
pub mod logic;
pub mod routes;

mod util;

#[cfg(test)]
mod testkit;

pub use block::{create_draft, submit, Block, BlockId, BlockRejection, Draft, DraftBuilder};
pub use classify::{classify, classify_tag};
pub use codec::{deserialize, load_lesson, serialize, DeserializationError, LessonLoad};
pub use error::UnknownVariantError;
pub use lesson::{Lesson, LessonError};
pub use registry::{lookup, Capability, Category, Field, VariantDescriptor, VariantTag};
pub use runtime::{compose, ConfigDraft, RuntimeConfig};
pub use validate::{validate, Violation, ViolationKind};
