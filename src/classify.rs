//! Category classifier.
//!
//! The one place that answers "which family rules apply to this variant".
//! Validator, composer and service code ask these functions instead of
//! checking variant membership themselves.

use crate::error::UnknownVariantError;
use crate::registry::{self, AnswerArity, Capability, Category, VariantTag};

/// Family of a registered variant.
pub fn classify(variant: VariantTag) -> Category {
  variant.descriptor().category
}

/// Family of a wire tag.
pub fn classify_tag(tag: &str) -> Result<Category, UnknownVariantError> {
  registry::lookup(tag).map(|d| d.category)
}

/// Whether a block of `variant` may carry `capability` in its config.
pub fn capability_allowed(variant: VariantTag, capability: Capability) -> bool {
  variant.descriptor().allowed_capabilities.contains(&capability)
}

/// Minimum length of the ordered item sequence.
/// Reordering needs something to reorder; word lists need at least one word.
pub fn min_ordered_items(variant: VariantTag) -> usize {
  match classify(variant) {
    Category::Reordering => 2,
    _ => 1,
  }
}

pub fn answer_arity(variant: VariantTag) -> Option<AnswerArity> {
  variant.descriptor().answer_arity
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classify_is_pure() {
    for tag in VariantTag::ALL {
      assert_eq!(classify(*tag), classify(*tag));
    }
  }

  #[test]
  fn families() {
    assert_eq!(classify(VariantTag::McqSingle), Category::MultipleChoice);
    assert_eq!(classify(VariantTag::EssayWriting), Category::Writing);
    assert_eq!(classify(VariantTag::Shadowing), Category::Speaking);
    assert_eq!(classify(VariantTag::ListenAndType), Category::Listening);
    assert_eq!(classify(VariantTag::DragDropCategorization), Category::Matching);
    assert_eq!(classify_tag("short_answer"), Ok(Category::GrammarVocab));
    assert!(classify_tag("crossword").is_err());
  }

  #[test]
  fn capabilities_follow_category() {
    for tag in VariantTag::ALL {
      let category = classify(*tag);
      assert_eq!(
        capability_allowed(*tag, Capability::SpeakingCapture),
        category == Category::Speaking
      );
      assert_eq!(
        capability_allowed(*tag, Capability::ListeningCapture),
        category == Category::Listening
      );
    }
  }

  #[test]
  fn reordering_needs_two_items() {
    assert_eq!(min_ordered_items(VariantTag::ParagraphReordering), 2);
    assert_eq!(min_ordered_items(VariantTag::WriteSentenceWithWords), 1);
    assert_eq!(answer_arity(VariantTag::McqMultiple), Some(AnswerArity::Multiple));
    assert_eq!(answer_arity(VariantTag::EssayWriting), None);
  }
}
