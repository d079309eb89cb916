//! Content schema validator.
//!
//! `validate` checks a draft against the registry's required-field set for its
//! variant and the field-kind rules (answer references, pairs, groups, item
//! counts, blank markers). It never stops at the first problem: the author gets
//! the full correction list in one pass.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::classify::{answer_arity, classify, min_ordered_items};
use crate::content::{
  AnswerKey, Blank, BlankDraft, BlankFilling, CategoryGroup, ChoiceQuestion, ContentDraft,
  ContentPayload, GroupDraft, LanguageTask, ListeningTask, MatchingPair, MatchingTask, MediaDraft,
  MediaRef, OrderingTask, PairDraft, Presentation, SpeakingTask, ValidatedContent, WritingTask,
};
use crate::registry::{AnswerArity, Category, Field, VariantDescriptor, VariantTag};
use crate::util::{clean_text, drop_trailing, trimmed_list};

/// One problem with one field of a draft.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {kind}")]
pub struct Violation {
  pub field: Field,
  #[serde(flatten)]
  pub kind: ViolationKind,
}

impl Violation {
  pub fn new(field: Field, kind: ViolationKind) -> Self {
    Self { field, kind }
  }

  pub fn missing(field: Field) -> Self {
    Self::new(field, ViolationKind::Missing)
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ViolationKind {
  #[error("a value is required")]
  Missing,
  #[error("entry {index} is empty")]
  EmptyEntry { index: usize },
  #[error("option '{option}' appears more than once")]
  DuplicateOption { option: String },
  #[error("answer '{answer}' does not match any option")]
  AnswerNotFound { answer: String },
  #[error("exactly one correct answer is allowed, found {actual}")]
  TooManyAnswers { actual: usize },
  #[error("blank {index} has no answer")]
  BlankWithoutAnswer { index: usize },
  #[error("marker '{marker}' does not appear in the passage")]
  MarkerNotInPassage { marker: String },
  #[error("marker '{marker}' is used by more than one blank")]
  DuplicateMarker { marker: String },
  #[error("pair {index} needs both a left and a right side")]
  IncompletePair { index: usize },
  #[error("group {index} has no name")]
  UnnamedGroup { index: usize },
  #[error("group {index} has no items")]
  EmptyGroup { index: usize },
  #[error("item {index} of group {group} is empty")]
  EmptyGroupItem { group: usize, index: usize },
  #[error("at least {min} items are required, found {actual}")]
  TooFewItems { min: usize, actual: usize },
  #[error("media must be a url or a library file, not both")]
  ConflictingMedia,
}

/// Every violation found in a draft, in field order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("content has {} violation(s)", .0.len())]
pub struct ValidationErrors(pub Vec<Violation>);

impl ValidationErrors {
  pub fn into_inner(self) -> Vec<Violation> {
    self.0
  }
}

/// Sanitized field values, ready to be shaped into a payload.
#[derive(Default)]
struct Checked {
  text: Option<String>,
  passage: Option<String>,
  prompt: Option<String>,
  rubric: Option<String>,
  sample_answer: Option<String>,
  media: Option<MediaRef>,
  key: Option<AnswerKey>,
  blanks: Vec<Blank>,
  pairs: Vec<MatchingPair>,
  groups: Vec<CategoryGroup>,
  items: Vec<String>,
}

/// Validate `draft` as content for `variant`.
pub fn validate(variant: VariantTag, draft: &ContentDraft) -> Result<ValidatedContent, ValidationErrors> {
  let descriptor = variant.descriptor();
  let mut out = Vec::new();
  let mut c = Checked::default();

  c.text = scalar(descriptor, Field::Text, draft.text.as_deref(), &mut out);
  c.passage = scalar(descriptor, Field::Passage, draft.passage.as_deref(), &mut out);
  c.prompt = scalar(descriptor, Field::Prompt, draft.prompt.as_deref(), &mut out);
  c.rubric = scalar(descriptor, Field::Rubric, draft.rubric.as_deref(), &mut out);
  c.sample_answer = scalar(descriptor, Field::SampleAnswer, draft.sample_answer.as_deref(), &mut out);
  c.media = media(descriptor, draft.media.as_ref(), &mut out);

  if descriptor.requires(Field::Options) || descriptor.requires(Field::CorrectAnswers) {
    c.key = answer_key(variant, &draft.options, &draft.correct_answers, &mut out);
  }
  if descriptor.requires(Field::Blanks) {
    c.blanks = blanks(&draft.blanks, c.passage.as_deref(), &mut out);
  }
  if descriptor.requires(Field::MatchingPairs) {
    c.pairs = pairs(&draft.matching_pairs, &mut out);
  }
  if descriptor.requires(Field::Categories) {
    c.groups = groups(&draft.categories, &mut out);
  }
  if descriptor.requires(Field::Items) {
    c.items = items(variant, &draft.items, &mut out);
  }

  if !out.is_empty() {
    debug!(target: "authoring", %variant, violations = out.len(), "Draft rejected");
    return Err(ValidationErrors(out));
  }

  let payload = assemble(classify(variant), c).map_err(|v| ValidationErrors(vec![v]))?;
  Ok(ValidatedContent::new(variant, payload))
}

fn scalar(
  descriptor: &VariantDescriptor,
  field: Field,
  value: Option<&str>,
  out: &mut Vec<Violation>,
) -> Option<String> {
  let cleaned = clean_text(value);
  if cleaned.is_none() && descriptor.requires(field) {
    out.push(Violation::missing(field));
  }
  cleaned
}

fn media(descriptor: &VariantDescriptor, draft: Option<&MediaDraft>, out: &mut Vec<Violation>) -> Option<MediaRef> {
  let url = draft.and_then(|m| clean_text(m.url.as_deref()));
  let file_id = draft.and_then(|m| clean_text(m.file_id.as_deref()));
  match (url, file_id) {
    (Some(_), Some(_)) => {
      out.push(Violation::new(Field::Media, ViolationKind::ConflictingMedia));
      None
    }
    (Some(url), None) => Some(MediaRef::Url(url)),
    (None, Some(id)) => Some(MediaRef::LibraryFile(id)),
    (None, None) => {
      if descriptor.requires(Field::Media) {
        out.push(Violation::missing(Field::Media));
      }
      None
    }
  }
}

/// Trimmed list with interior empty entries reported.
fn string_list(field: Field, values: &[String], out: &mut Vec<Violation>) -> Vec<String> {
  let list = trimmed_list(values);
  for (index, value) in list.iter().enumerate() {
    if value.is_empty() {
      out.push(Violation::new(field, ViolationKind::EmptyEntry { index }));
    }
  }
  list
}

fn answer_key(
  variant: VariantTag,
  options: &[String],
  answers: &[String],
  out: &mut Vec<Violation>,
) -> Option<AnswerKey> {
  let before = out.len();

  let options = string_list(Field::Options, options, out);
  if options.is_empty() {
    out.push(Violation::missing(Field::Options));
  }
  let mut seen = HashSet::new();
  for option in options.iter().filter(|o| !o.is_empty()) {
    if !seen.insert(option.as_str()) {
      out.push(Violation::new(
        Field::Options,
        ViolationKind::DuplicateOption { option: option.clone() },
      ));
    }
  }

  // References are a selection, not slots: blanks and repeats carry no meaning.
  let mut answers: Vec<String> = answers.iter().filter_map(|a| clean_text(Some(a))).collect();
  let mut unique = HashSet::new();
  answers.retain(|a| unique.insert(a.clone()));

  if answers.is_empty() {
    out.push(Violation::missing(Field::CorrectAnswers));
  } else {
    if answer_arity(variant) == Some(AnswerArity::Single) && answers.len() > 1 {
      out.push(Violation::new(
        Field::CorrectAnswers,
        ViolationKind::TooManyAnswers { actual: answers.len() },
      ));
    }
    // With no options there is nothing to resolve against; `options` is already reported.
    if !options.is_empty() {
      for answer in &answers {
        if !options.contains(answer) {
          out.push(Violation::new(
            Field::CorrectAnswers,
            ViolationKind::AnswerNotFound { answer: answer.clone() },
          ));
        }
      }
    }
  }

  if out.len() > before {
    return None;
  }
  let correct = answers
    .iter()
    .filter_map(|a| options.iter().position(|o| o == a))
    .collect();
  Some(AnswerKey { options, correct })
}

fn default_marker(index: usize) -> String {
  format!("{{{{{}}}}}", index + 1)
}

fn blanks(drafts: &[BlankDraft], passage: Option<&str>, out: &mut Vec<Violation>) -> Vec<Blank> {
  let list = drop_trailing(drafts.to_vec(), |b| {
    clean_text(b.marker.as_deref()).is_none()
      && b.answer.trim().is_empty()
      && b.alternatives.iter().all(|a| a.trim().is_empty())
  });
  if list.is_empty() {
    out.push(Violation::missing(Field::Blanks));
    return Vec::new();
  }

  let mut markers = HashSet::new();
  let mut result = Vec::with_capacity(list.len());
  for (index, draft) in list.iter().enumerate() {
    let marker = clean_text(draft.marker.as_deref()).unwrap_or_else(|| default_marker(index));
    let answer = draft.answer.trim().to_string();
    if answer.is_empty() {
      out.push(Violation::new(Field::Blanks, ViolationKind::BlankWithoutAnswer { index }));
    }
    if !markers.insert(marker.clone()) {
      out.push(Violation::new(
        Field::Blanks,
        ViolationKind::DuplicateMarker { marker: marker.clone() },
      ));
    } else if let Some(passage) = passage {
      if !passage.contains(&marker) {
        out.push(Violation::new(
          Field::Blanks,
          ViolationKind::MarkerNotInPassage { marker: marker.clone() },
        ));
      }
    }
    let alternatives = draft
      .alternatives
      .iter()
      .filter_map(|a| clean_text(Some(a)))
      .collect();
    result.push(Blank { marker, answer, alternatives });
  }
  result
}

fn pairs(drafts: &[PairDraft], out: &mut Vec<Violation>) -> Vec<MatchingPair> {
  let trimmed: Vec<MatchingPair> = drafts
    .iter()
    .map(|p| MatchingPair { left: p.left.trim().to_string(), right: p.right.trim().to_string() })
    .collect();
  let list = drop_trailing(trimmed, |p: &MatchingPair| p.left.is_empty() && p.right.is_empty());
  if list.is_empty() {
    out.push(Violation::missing(Field::MatchingPairs));
  }
  for (index, pair) in list.iter().enumerate() {
    if pair.left.is_empty() || pair.right.is_empty() {
      out.push(Violation::new(Field::MatchingPairs, ViolationKind::IncompletePair { index }));
    }
  }
  list
}

fn groups(drafts: &[GroupDraft], out: &mut Vec<Violation>) -> Vec<CategoryGroup> {
  let trimmed: Vec<CategoryGroup> = drafts
    .iter()
    .map(|g| CategoryGroup { name: g.name.trim().to_string(), items: trimmed_list(&g.items) })
    .collect();
  let list = drop_trailing(trimmed, |g: &CategoryGroup| g.name.is_empty() && g.items.is_empty());
  if list.is_empty() {
    out.push(Violation::missing(Field::Categories));
  }
  for (group, g) in list.iter().enumerate() {
    if g.name.is_empty() {
      out.push(Violation::new(Field::Categories, ViolationKind::UnnamedGroup { index: group }));
    }
    if g.items.is_empty() {
      out.push(Violation::new(Field::Categories, ViolationKind::EmptyGroup { index: group }));
    }
    for (index, item) in g.items.iter().enumerate() {
      if item.is_empty() {
        out.push(Violation::new(Field::Categories, ViolationKind::EmptyGroupItem { group, index }));
      }
    }
  }
  list
}

fn items(variant: VariantTag, values: &[String], out: &mut Vec<Violation>) -> Vec<String> {
  let list = string_list(Field::Items, values, out);
  let min = min_ordered_items(variant);
  if list.is_empty() {
    out.push(Violation::missing(Field::Items));
  } else if list.len() < min {
    out.push(Violation::new(Field::Items, ViolationKind::TooFewItems { min, actual: list.len() }));
  }
  list
}

/// Shape checked values into the payload arm of `category`.
/// Fields outside the category's shape are dropped.
fn assemble(category: Category, c: Checked) -> Result<ContentPayload, Violation> {
  Ok(match category {
    Category::Content => ContentPayload::Content(Presentation {
      text: c.text,
      passage: c.passage,
      media: c.media,
    }),
    Category::MultipleChoice => ContentPayload::MultipleChoice(ChoiceQuestion {
      prompt: c.prompt,
      passage: c.passage,
      media: c.media,
      key: c.key.ok_or_else(|| Violation::missing(Field::Options))?,
    }),
    Category::FillBlanks => ContentPayload::FillBlanks(BlankFilling {
      prompt: c.prompt,
      passage: c.passage.ok_or_else(|| Violation::missing(Field::Passage))?,
      blanks: c.blanks,
    }),
    Category::Matching => ContentPayload::Matching(MatchingTask {
      prompt: c.prompt,
      pairs: c.pairs,
      groups: c.groups,
    }),
    Category::Reordering => ContentPayload::Reordering(OrderingTask {
      prompt: c.prompt,
      items: c.items,
    }),
    Category::Writing => ContentPayload::Writing(WritingTask {
      prompt: c.prompt.ok_or_else(|| Violation::missing(Field::Prompt))?,
      media: c.media,
      rubric: c.rubric,
      sample_answer: c.sample_answer,
    }),
    Category::Speaking => ContentPayload::Speaking(SpeakingTask {
      prompt: c.prompt,
      passage: c.passage,
      media: c.media,
      rubric: c.rubric,
      sample_answer: c.sample_answer,
    }),
    Category::Listening => ContentPayload::Listening(ListeningTask {
      prompt: c.prompt,
      media: c.media.ok_or_else(|| Violation::missing(Field::Media))?,
      transcript: c.text,
      key: c.key,
    }),
    Category::GrammarVocab => ContentPayload::GrammarVocab(LanguageTask {
      prompt: c.prompt,
      passage: c.passage,
      key: c.key,
      blanks: c.blanks,
      items: c.items,
      sample_answer: c.sample_answer,
    }),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testkit::minimal_draft;

  fn mcq(options: &[&str], answers: &[&str]) -> ContentDraft {
    ContentDraft {
      options: options.iter().map(|s| s.to_string()).collect(),
      correct_answers: answers.iter().map(|s| s.to_string()).collect(),
      ..Default::default()
    }
  }

  fn kinds(err: &ValidationErrors) -> Vec<(Field, ViolationKind)> {
    err.0.iter().map(|v| (v.field, v.kind.clone())).collect()
  }

  #[test]
  fn mcq_single_with_matching_answer_validates() {
    let ok = validate(VariantTag::McqSingle, &mcq(&["Paris", "London", "Rome"], &["London"]))
      .expect("valid");
    let key = ok.payload().answer_key().expect("key");
    assert_eq!(key.correct_options().collect::<Vec<_>>(), vec!["London"]);
    assert_eq!(ok.category(), Category::MultipleChoice);
  }

  #[test]
  fn mcq_single_with_unknown_answer_fails() {
    let err = validate(VariantTag::McqSingle, &mcq(&["Paris", "London", "Rome"], &["Berlin"]))
      .unwrap_err();
    assert_eq!(
      kinds(&err),
      vec![(Field::CorrectAnswers, ViolationKind::AnswerNotFound { answer: "Berlin".into() })]
    );
  }

  #[test]
  fn matching_pair_with_empty_side_is_one_violation() {
    let draft = ContentDraft {
      matching_pairs: vec![PairDraft { left: "cat".into(), right: "".into() }],
      ..Default::default()
    };
    let err = validate(VariantTag::Matching, &draft).unwrap_err();
    assert_eq!(err.0.len(), 1);
    assert_eq!(err.0[0].kind, ViolationKind::IncompletePair { index: 0 });
  }

  #[test]
  fn reordering_needs_two_items() {
    let draft = ContentDraft { items: vec!["Only sentence.".into()], ..Default::default() };
    let err = validate(VariantTag::ParagraphReordering, &draft).unwrap_err();
    assert_eq!(
      kinds(&err),
      vec![(Field::Items, ViolationKind::TooFewItems { min: 2, actual: 1 })]
    );
  }

  #[test]
  fn collects_every_missing_field() {
    let err = validate(VariantTag::McqSingle, &ContentDraft::default()).unwrap_err();
    assert_eq!(err.0.len(), 2);
    assert!(err.0.iter().any(|v| *v == Violation::missing(Field::Options)));
    assert!(err.0.iter().any(|v| *v == Violation::missing(Field::CorrectAnswers)));

    let err = validate(VariantTag::DescribePicture, &ContentDraft::default()).unwrap_err();
    assert_eq!(err.0.len(), 2);
  }

  #[test]
  fn whitespace_only_is_missing() {
    let draft = ContentDraft { prompt: Some("   \n".into()), ..Default::default() };
    let err = validate(VariantTag::EssayWriting, &draft).unwrap_err();
    assert_eq!(err.0, vec![Violation::missing(Field::Prompt)]);
  }

  #[test]
  fn trailing_placeholders_do_not_count() {
    let ok = validate(VariantTag::McqSingle, &mcq(&["Paris", "London", ""], &["Paris"])).unwrap();
    assert_eq!(ok.payload().answer_key().unwrap().options.len(), 2);

    let err = validate(VariantTag::McqSingle, &mcq(&[""], &["Paris"])).unwrap_err();
    assert_eq!(err.0, vec![Violation::missing(Field::Options)]);

    let draft = ContentDraft {
      items: vec!["one".into(), "two".into(), " ".into()],
      ..Default::default()
    };
    assert!(validate(VariantTag::SentenceReordering, &draft).is_ok());
  }

  #[test]
  fn interior_empty_slot_is_reported() {
    let err = validate(VariantTag::McqMultiple, &mcq(&["a", "", "c"], &["a"])).unwrap_err();
    assert_eq!(kinds(&err), vec![(Field::Options, ViolationKind::EmptyEntry { index: 1 })]);
  }

  #[test]
  fn single_answer_variants_take_exactly_one() {
    let err = validate(VariantTag::McqSingle, &mcq(&["a", "b"], &["a", "b"])).unwrap_err();
    assert_eq!(kinds(&err), vec![(Field::CorrectAnswers, ViolationKind::TooManyAnswers { actual: 2 })]);

    let ok = validate(VariantTag::McqMultiple, &mcq(&["a", "b", "c"], &["a", "c"])).unwrap();
    assert_eq!(ok.payload().answer_key().unwrap().correct, vec![0, 2]);
  }

  #[test]
  fn duplicate_options_are_ambiguous() {
    let err = validate(VariantTag::McqSingle, &mcq(&["a", "a"], &["a"])).unwrap_err();
    assert_eq!(
      kinds(&err),
      vec![(Field::Options, ViolationKind::DuplicateOption { option: "a".into() })]
    );
  }

  #[test]
  fn blank_markers_must_appear_in_passage() {
    let draft = ContentDraft {
      passage: Some("The cat {{1}} on the mat.".into()),
      blanks: vec![
        BlankDraft { answer: "sat".into(), ..Default::default() },
        BlankDraft { marker: Some("[x]".into()), answer: "mat".into(), alternatives: vec![] },
        BlankDraft::default(),
      ],
      ..Default::default()
    };
    let err = validate(VariantTag::FillBlanks, &draft).unwrap_err();
    assert_eq!(
      kinds(&err),
      vec![(Field::Blanks, ViolationKind::MarkerNotInPassage { marker: "[x]".into() })]
    );
  }

  #[test]
  fn blanks_need_answers() {
    let draft = ContentDraft {
      passage: Some("{{1}} and {{2}}".into()),
      blanks: vec![
        BlankDraft { answer: " ".into(), alternatives: vec!["x".into()], ..Default::default() },
        BlankDraft { answer: "two".into(), ..Default::default() },
      ],
      ..Default::default()
    };
    let err = validate(VariantTag::SummaryCompletion, &draft).unwrap_err();
    assert_eq!(kinds(&err), vec![(Field::Blanks, ViolationKind::BlankWithoutAnswer { index: 0 })]);
  }

  #[test]
  fn groups_need_name_and_items() {
    let draft = ContentDraft {
      categories: vec![
        GroupDraft { name: "".into(), items: vec!["dog".into()] },
        GroupDraft { name: "Fruit".into(), items: vec!["".into()] },
        GroupDraft::default(),
      ],
      ..Default::default()
    };
    let err = validate(VariantTag::DragDropCategorization, &draft).unwrap_err();
    assert_eq!(
      kinds(&err),
      vec![
        (Field::Categories, ViolationKind::UnnamedGroup { index: 0 }),
        (Field::Categories, ViolationKind::EmptyGroup { index: 1 }),
      ]
    );
  }

  #[test]
  fn media_must_pick_one_source() {
    let draft = ContentDraft {
      media: Some(MediaDraft { url: Some("https://x".into()), file_id: Some("f1".into()) }),
      ..Default::default()
    };
    let err = validate(VariantTag::Video, &draft).unwrap_err();
    assert_eq!(err.0, vec![Violation::new(Field::Media, ViolationKind::ConflictingMedia)]);

    let draft = ContentDraft {
      media: Some(MediaDraft { url: Some(" ".into()), file_id: Some("lib-42".into()) }),
      ..Default::default()
    };
    let ok = validate(VariantTag::Audio, &draft).unwrap();
    match ok.payload() {
      ContentPayload::Content(p) => assert_eq!(p.media, Some(MediaRef::LibraryFile("lib-42".into()))),
      other => panic!("unexpected payload {other:?}"),
    }
  }

  #[test]
  fn fields_outside_the_shape_are_dropped() {
    let mut draft = mcq(&["a", "b"], &["b"]);
    draft.rubric = Some("unused".into());
    draft.items = vec!["x".into()];
    let ok = validate(VariantTag::McqSingle, &draft).unwrap();
    let back = ok.to_draft();
    assert_eq!(back.rubric, None);
    assert!(back.items.is_empty());
  }

  #[test]
  fn minimal_drafts_validate_for_every_variant() {
    for tag in VariantTag::ALL {
      let ok = validate(*tag, &minimal_draft(*tag));
      assert!(ok.is_ok(), "{tag}: {:?}", ok.err());
      let content = ok.unwrap();
      assert_eq!(content.category(), classify(*tag));
      // Sanitized output re-validates to the same content.
      assert_eq!(validate(*tag, &content.to_draft()).unwrap(), content);
    }
  }

  #[test]
  fn violations_serialize_with_code() {
    let v = Violation::new(Field::Items, ViolationKind::TooFewItems { min: 2, actual: 1 });
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "field": "items", "code": "too_few_items", "min": 2, "actual": 1 })
    );
  }
}
