//! Test fixtures: the smallest draft each variant accepts, built from the
//! registry's required-field set.

use crate::classify::answer_arity;
use crate::content::{BlankDraft, ContentDraft, GroupDraft, MediaDraft, PairDraft};
use crate::registry::{AnswerArity, Field, VariantTag};

pub fn minimal_draft(variant: VariantTag) -> ContentDraft {
  let mut d = ContentDraft::default();
  for field in variant.descriptor().required_fields {
    match field {
      Field::Text => d.text = Some("The train leaves at nine.".into()),
      Field::Passage => d.passage = Some("She {{1}} to school every day.".into()),
      Field::Prompt => d.prompt = Some("Describe your favourite place.".into()),
      Field::Options => d.options = vec!["walks".into(), "walk".into(), "walking".into()],
      Field::CorrectAnswers => {
        d.correct_answers = match answer_arity(variant) {
          Some(AnswerArity::Multiple) => vec!["walks".into(), "walking".into()],
          _ => vec!["walks".into()],
        }
      }
      Field::Blanks => d.blanks = vec![BlankDraft { answer: "walks".into(), ..Default::default() }],
      Field::MatchingPairs => {
        d.matching_pairs = vec![PairDraft { left: "cat".into(), right: "gato".into() }]
      }
      Field::Categories => {
        d.categories = vec![GroupDraft { name: "Animals".into(), items: vec!["cat".into()] }]
      }
      Field::Items => d.items = vec!["First.".into(), "Second.".into()],
      Field::Media => {
        d.media = Some(MediaDraft { url: Some("https://cdn.example.com/clip.mp3".into()), file_id: None })
      }
      Field::Rubric => d.rubric = Some("Task response, coherence, vocabulary.".into()),
      Field::SampleAnswer => d.sample_answer = Some("A short model answer.".into()),
    }
  }
  d
}
