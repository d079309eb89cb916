//! Seed data: a built-in demo lesson so the service is useful without config.

use tracing::error;

use crate::block::{submit, Block, Draft, DraftBuilder};
use crate::registry::VariantTag;

pub const DEMO_LESSON_ID: &str = "demo";
pub const DEMO_LESSON_TITLE: &str = "Present simple: daily routines";

/// One block per common family, in teaching order.
fn demo_drafts() -> Vec<Draft> {
  vec![
    DraftBuilder::new(VariantTag::Text)
      .passage("We use the present simple for habits: she walks to school, they take the bus.")
      .build(),
    DraftBuilder::new(VariantTag::McqSingle)
      .prompt("She ___ to school every day.")
      .options(["walk", "walks", "walking"])
      .correct_answer("walks")
      .build(),
    DraftBuilder::new(VariantTag::FillBlanks)
      .passage("He {{1}} up at seven and {{2}} breakfast at eight.")
      .blank("gets")
      .blank("has")
      .partial_credit(true)
      .build(),
    DraftBuilder::new(VariantTag::Matching)
      .prompt("Match the verb with its third-person form.")
      .pair("go", "goes")
      .pair("watch", "watches")
      .pair("study", "studies")
      .build(),
    DraftBuilder::new(VariantTag::SentenceReordering)
      .item("I wake up.")
      .item("I brush my teeth.")
      .item("I leave for work.")
      .build(),
    DraftBuilder::new(VariantTag::CueCard)
      .prompt("Describe a typical weekday morning.")
      .speaking(60, 120)
      .build(),
    DraftBuilder::new(VariantTag::ListenAndSelect)
      .media_url("https://cdn.example.com/audio/routine.mp3")
      .options(["At seven", "At eight", "At nine"])
      .correct_answer("At seven")
      .listening(2, false)
      .build(),
    DraftBuilder::new(VariantTag::EssayWriting)
      .prompt("Write about your weekend routine in 120 words.")
      .ai_evaluation(Some("Check present simple usage and third-person -s.".into()))
      .points(20)
      .build(),
  ]
}

/// Demo blocks. A draft that fails to submit is logged and left out.
pub fn demo_blocks() -> Vec<Block> {
  demo_drafts()
    .into_iter()
    .filter_map(|draft| {
      let variant = draft.variant();
      match submit(draft) {
        Ok(block) => Some(block),
        Err(e) => {
          error!(target: "lesson_blocks", %variant, error = %e, "Demo block rejected");
          None
        }
      }
    })
    .collect()
}
