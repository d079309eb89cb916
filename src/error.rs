//! Error types shared across the block model.
//!
//! Each component owns the errors it produces (violations live in `validate`,
//! configuration errors in `runtime`, decoding errors in `codec`); this module
//! holds the one error every component can raise: an unregistered variant tag.

use serde::Serialize;
use thiserror::Error;

/// A variant tag that is not in the registry.
///
/// At the authoring boundary this is a caller bug (tags must come from the
/// registry catalogue). On load it usually means a retired variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Error)]
#[error("unknown block variant '{tag}'")]
pub struct UnknownVariantError {
  pub tag: String,
}

impl UnknownVariantError {
  pub fn new(tag: impl Into<String>) -> Self {
    Self { tag: tag.into() }
  }
}
