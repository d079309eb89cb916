//! Content payloads: the loose draft bag authors and storage hand us, and the
//! validated per-category payload the rest of the system works with.
//!
//! A `ContentDraft` is a field map covering every field kind of the shared
//! vocabulary; anything goes until `validate::validate` has looked at it.
//! `ValidatedContent` is the sanitized result, shaped by category (nine arms)
//! rather than by variant. It can only be built by the validator.

use serde::{Deserialize, Deserializer, Serialize};

use crate::registry::{Category, VariantTag};

// ---------------------------------------------------------------------------
// Draft (wire) shapes
// ---------------------------------------------------------------------------

/// Unvalidated content as a field map. Also the persisted `content` shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDraft {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub passage: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub prompt: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub options: Vec<String>,
  #[serde(
    default,
    alias = "correctAnswer",
    deserialize_with = "one_or_many",
    skip_serializing_if = "Vec::is_empty"
  )]
  pub correct_answers: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub blanks: Vec<BlankDraft>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub matching_pairs: Vec<PairDraft>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub categories: Vec<GroupDraft>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub items: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub media: Option<MediaDraft>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rubric: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sample_answer: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlankDraft {
  /// Placeholder in the passage; defaults to `{{n}}` for the n-th blank.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub marker: Option<String>,
  #[serde(default)]
  pub answer: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub alternatives: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairDraft {
  #[serde(default)]
  pub left: String,
  #[serde(default)]
  pub right: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDraft {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub items: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDraft {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file_id: Option<String>,
}

/// Authoring tools send `correctAnswer: "x"` for single-answer forms and
/// `correctAnswers: [..]` elsewhere; both land in one list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum OneOrMany {
    One(String),
    Many(Vec<String>),
  }

  Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
    Some(OneOrMany::One(s)) => vec![s],
    Some(OneOrMany::Many(v)) => v,
    None => Vec::new(),
  })
}

// ---------------------------------------------------------------------------
// Validated shapes
// ---------------------------------------------------------------------------

/// Where a media asset lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaRef {
  Url(String),
  LibraryFile(String),
}

impl MediaRef {
  fn to_draft(&self) -> MediaDraft {
    match self {
      MediaRef::Url(url) => MediaDraft { url: Some(url.clone()), file_id: None },
      MediaRef::LibraryFile(id) => MediaDraft { url: None, file_id: Some(id.clone()) },
    }
  }
}

/// Options plus the indices of the correct ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerKey {
  pub options: Vec<String>,
  pub correct: Vec<usize>,
}

impl AnswerKey {
  pub fn correct_options(&self) -> impl Iterator<Item = &str> {
    self.correct.iter().filter_map(|&i| self.options.get(i).map(String::as_str))
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blank {
  pub marker: String,
  pub answer: String,
  pub alternatives: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchingPair {
  pub left: String,
  pub right: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryGroup {
  pub name: String,
  pub items: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Presentation {
  pub text: Option<String>,
  pub passage: Option<String>,
  pub media: Option<MediaRef>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceQuestion {
  pub prompt: Option<String>,
  pub passage: Option<String>,
  pub media: Option<MediaRef>,
  pub key: AnswerKey,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlankFilling {
  pub prompt: Option<String>,
  pub passage: String,
  pub blanks: Vec<Blank>,
}

/// Pairs for `matching`, groups for drag-and-drop categorization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchingTask {
  pub prompt: Option<String>,
  pub pairs: Vec<MatchingPair>,
  pub groups: Vec<CategoryGroup>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderingTask {
  pub prompt: Option<String>,
  pub items: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WritingTask {
  pub prompt: String,
  pub media: Option<MediaRef>,
  pub rubric: Option<String>,
  pub sample_answer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeakingTask {
  pub prompt: Option<String>,
  pub passage: Option<String>,
  pub media: Option<MediaRef>,
  pub rubric: Option<String>,
  pub sample_answer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListeningTask {
  pub prompt: Option<String>,
  pub media: MediaRef,
  pub transcript: Option<String>,
  pub key: Option<AnswerKey>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageTask {
  pub prompt: Option<String>,
  pub passage: Option<String>,
  pub key: Option<AnswerKey>,
  pub blanks: Vec<Blank>,
  pub items: Vec<String>,
  pub sample_answer: Option<String>,
}

/// Validated content, one arm per category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentPayload {
  Content(Presentation),
  MultipleChoice(ChoiceQuestion),
  FillBlanks(BlankFilling),
  Matching(MatchingTask),
  Reordering(OrderingTask),
  Writing(WritingTask),
  Speaking(SpeakingTask),
  Listening(ListeningTask),
  GrammarVocab(LanguageTask),
}

impl ContentPayload {
  pub fn category(&self) -> Category {
    match self {
      ContentPayload::Content(_) => Category::Content,
      ContentPayload::MultipleChoice(_) => Category::MultipleChoice,
      ContentPayload::FillBlanks(_) => Category::FillBlanks,
      ContentPayload::Matching(_) => Category::Matching,
      ContentPayload::Reordering(_) => Category::Reordering,
      ContentPayload::Writing(_) => Category::Writing,
      ContentPayload::Speaking(_) => Category::Speaking,
      ContentPayload::Listening(_) => Category::Listening,
      ContentPayload::GrammarVocab(_) => Category::GrammarVocab,
    }
  }

  /// Answer key of choice-style content, if this payload has one.
  pub fn answer_key(&self) -> Option<&AnswerKey> {
    match self {
      ContentPayload::MultipleChoice(q) => Some(&q.key),
      ContentPayload::Listening(t) => t.key.as_ref(),
      ContentPayload::GrammarVocab(t) => t.key.as_ref(),
      _ => None,
    }
  }

  fn to_draft(&self) -> ContentDraft {
    let mut d = ContentDraft::default();
    match self {
      ContentPayload::Content(p) => {
        d.text = p.text.clone();
        d.passage = p.passage.clone();
        d.media = p.media.as_ref().map(MediaRef::to_draft);
      }
      ContentPayload::MultipleChoice(q) => {
        d.prompt = q.prompt.clone();
        d.passage = q.passage.clone();
        d.media = q.media.as_ref().map(MediaRef::to_draft);
        put_key(&mut d, &q.key);
      }
      ContentPayload::FillBlanks(f) => {
        d.prompt = f.prompt.clone();
        d.passage = Some(f.passage.clone());
        d.blanks = blanks_to_draft(&f.blanks);
      }
      ContentPayload::Matching(m) => {
        d.prompt = m.prompt.clone();
        d.matching_pairs = m
          .pairs
          .iter()
          .map(|p| PairDraft { left: p.left.clone(), right: p.right.clone() })
          .collect();
        d.categories = m
          .groups
          .iter()
          .map(|g| GroupDraft { name: g.name.clone(), items: g.items.clone() })
          .collect();
      }
      ContentPayload::Reordering(o) => {
        d.prompt = o.prompt.clone();
        d.items = o.items.clone();
      }
      ContentPayload::Writing(w) => {
        d.prompt = Some(w.prompt.clone());
        d.media = w.media.as_ref().map(MediaRef::to_draft);
        d.rubric = w.rubric.clone();
        d.sample_answer = w.sample_answer.clone();
      }
      ContentPayload::Speaking(s) => {
        d.prompt = s.prompt.clone();
        d.passage = s.passage.clone();
        d.media = s.media.as_ref().map(MediaRef::to_draft);
        d.rubric = s.rubric.clone();
        d.sample_answer = s.sample_answer.clone();
      }
      ContentPayload::Listening(l) => {
        d.prompt = l.prompt.clone();
        d.media = Some(l.media.to_draft());
        d.text = l.transcript.clone();
        if let Some(key) = &l.key {
          put_key(&mut d, key);
        }
      }
      ContentPayload::GrammarVocab(g) => {
        d.prompt = g.prompt.clone();
        d.passage = g.passage.clone();
        if let Some(key) = &g.key {
          put_key(&mut d, key);
        }
        d.blanks = blanks_to_draft(&g.blanks);
        d.items = g.items.clone();
        d.sample_answer = g.sample_answer.clone();
      }
    }
    d
  }
}

fn put_key(d: &mut ContentDraft, key: &AnswerKey) {
  d.options = key.options.clone();
  d.correct_answers = key.correct_options().map(str::to_string).collect();
}

fn blanks_to_draft(blanks: &[Blank]) -> Vec<BlankDraft> {
  blanks
    .iter()
    .map(|b| BlankDraft {
      marker: Some(b.marker.clone()),
      answer: b.answer.clone(),
      alternatives: b.alternatives.clone(),
    })
    .collect()
}

/// Content that passed validation for a specific variant. Immutable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedContent {
  variant: VariantTag,
  payload: ContentPayload,
}

impl ValidatedContent {
  pub(crate) fn new(variant: VariantTag, payload: ContentPayload) -> Self {
    Self { variant, payload }
  }

  pub fn variant(&self) -> VariantTag {
    self.variant
  }

  pub fn category(&self) -> Category {
    self.payload.category()
  }

  pub fn payload(&self) -> &ContentPayload {
    &self.payload
  }

  /// Field-map form, as persisted and as handed back to editors.
  pub fn to_draft(&self) -> ContentDraft {
    self.payload.to_draft()
  }
}
