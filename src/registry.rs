//! Variant registry: the closed catalogue of block variants.
//!
//! Every variant is declared once in the `variant_table!` invocation below
//! with its category, label, required content fields and (for choice-style
//! variants) how many correct answers it takes. The table is static data,
//! so lookups are lock-free and safe from any number of threads.

use std::{collections::HashMap, fmt, str::FromStr, sync::OnceLock};

use serde::{Deserialize, Serialize};

use crate::error::UnknownVariantError;

/// Exercise family. Drives which validation and configuration rules apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Content,
  MultipleChoice,
  FillBlanks,
  Matching,
  Reordering,
  Writing,
  Speaking,
  Listening,
  GrammarVocab,
}

impl Category {
  pub const ALL: [Category; 9] = [
    Category::Content,
    Category::MultipleChoice,
    Category::FillBlanks,
    Category::Matching,
    Category::Reordering,
    Category::Writing,
    Category::Speaking,
    Category::Listening,
    Category::GrammarVocab,
  ];

  /// Capture capabilities a block of this family may carry in its config.
  pub const fn capabilities(self) -> &'static [Capability] {
    match self {
      Category::Speaking => &[Capability::SpeakingCapture],
      Category::Listening => &[Capability::ListeningCapture],
      _ => &[],
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Category::Content => "content",
      Category::MultipleChoice => "multiple_choice",
      Category::FillBlanks => "fill_blanks",
      Category::Matching => "matching",
      Category::Reordering => "reordering",
      Category::Writing => "writing",
      Category::Speaking => "speaking",
      Category::Listening => "listening",
      Category::GrammarVocab => "grammar_vocab",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Optional config extensions that only some families accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
  SpeakingCapture,
  ListeningCapture,
}

impl fmt::Display for Capability {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Capability::SpeakingCapture => f.write_str("speaking"),
      Capability::ListeningCapture => f.write_str("listening"),
    }
  }
}

/// Shared vocabulary of content fields. Names match the persisted field map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
  Text,
  Passage,
  Prompt,
  Options,
  CorrectAnswers,
  Blanks,
  MatchingPairs,
  Categories,
  Items,
  Media,
  Rubric,
  SampleAnswer,
}

impl Field {
  pub fn as_str(self) -> &'static str {
    match self {
      Field::Text => "text",
      Field::Passage => "passage",
      Field::Prompt => "prompt",
      Field::Options => "options",
      Field::CorrectAnswers => "correctAnswers",
      Field::Blanks => "blanks",
      Field::MatchingPairs => "matchingPairs",
      Field::Categories => "categories",
      Field::Items => "items",
      Field::Media => "media",
      Field::Rubric => "rubric",
      Field::SampleAnswer => "sampleAnswer",
    }
  }
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// How many correct-answer references a choice-style variant takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerArity {
  Single,
  Multiple,
}

/// Static description of one variant.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDescriptor {
  pub tag: VariantTag,
  pub label: &'static str,
  pub category: Category,
  pub required_fields: &'static [Field],
  pub allowed_capabilities: &'static [Capability],
  #[serde(skip_serializing_if = "Option::is_none")]
  pub answer_arity: Option<AnswerArity>,
}

impl VariantDescriptor {
  pub fn requires(&self, field: Field) -> bool {
    self.required_fields.contains(&field)
  }
}

const SINGLE: Option<AnswerArity> = Some(AnswerArity::Single);
const MULTIPLE: Option<AnswerArity> = Some(AnswerArity::Multiple);

// Declares `VariantTag` and the descriptor table in one place so the enum
// discriminant doubles as the table index.
macro_rules! variant_table {
  ($( $variant:ident = $tag:literal, $label:literal, $category:ident, [$($field:ident),*], $arity:expr; )+) => {
    /// Identifier of a block variant. Fixed for the lifetime of a block.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub enum VariantTag {
      $( #[serde(rename = $tag)] $variant, )+
    }

    impl VariantTag {
      pub const ALL: &'static [VariantTag] = &[$(VariantTag::$variant),+];

      pub fn as_str(self) -> &'static str {
        match self {
          $( VariantTag::$variant => $tag, )+
        }
      }
    }

    static DESCRIPTORS: &[VariantDescriptor] = &[
      $(
        VariantDescriptor {
          tag: VariantTag::$variant,
          label: $label,
          category: Category::$category,
          required_fields: &[$(Field::$field),*],
          allowed_capabilities: Category::$category.capabilities(),
          answer_arity: $arity,
        },
      )+
    ];
  };
}

variant_table! {
  // Content
  Video = "video", "Video", Content, [Media], None;
  Text = "text", "Text", Content, [Passage], None;
  Image = "image", "Image", Content, [Media], None;
  Audio = "audio", "Audio", Content, [Media], None;
  Attachment = "attachment", "Attachment", Content, [Media], None;
  // Multiple choice
  McqSingle = "mcq_single", "Multiple Choice (single answer)", MultipleChoice, [Options, CorrectAnswers], SINGLE;
  McqMultiple = "mcq_multiple", "Multiple Choice (multiple answers)", MultipleChoice, [Options, CorrectAnswers], MULTIPLE;
  // Fill in the blanks
  FillBlanks = "fill_blanks", "Fill in the Blanks", FillBlanks, [Passage, Blanks], None;
  SentenceCompletion = "sentence_completion", "Sentence Completion", FillBlanks, [Passage, Blanks], None;
  SummaryCompletion = "summary_completion", "Summary Completion", FillBlanks, [Passage, Blanks], None;
  TableCompletion = "table_completion", "Table Completion", FillBlanks, [Passage, Blanks], None;
  FlowchartCompletion = "flowchart_completion", "Flowchart Completion", FillBlanks, [Passage, Blanks], None;
  // Matching
  Matching = "matching", "Matching", Matching, [MatchingPairs], None;
  DragDropCategorization = "drag_drop_categorization", "Drag & Drop Categorization", Matching, [Categories], None;
  // Reordering
  ParagraphReordering = "paragraph_reordering", "Paragraph Reordering", Reordering, [Items], None;
  SentenceReordering = "sentence_reordering", "Sentence Reordering", Reordering, [Items], None;
  // Writing
  EssayWriting = "essay_writing", "Essay Writing", Writing, [Prompt], None;
  LetterEmailWriting = "letter_email_writing", "Letter / Email Writing", Writing, [Prompt], None;
  DescribePicture = "describe_picture", "Describe the Picture", Writing, [Prompt, Media], None;
  AiFeedbackWriting = "ai_feedback_writing", "Writing with AI Feedback", Writing, [Prompt, Rubric], None;
  ImagePromptWriting = "image_prompt_writing", "Image-Based Writing", Writing, [Prompt, Media], None;
  // Speaking
  CueCard = "cue_card", "Cue Card", Speaking, [Prompt], None;
  ReadAloud = "read_aloud", "Read Aloud", Speaking, [Passage], None;
  ListenAndSpeak = "listen_and_speak", "Listen and Speak", Speaking, [Prompt, Media], None;
  ReadAndSpeak = "read_and_speak", "Read and Speak", Speaking, [Prompt, Passage], None;
  LongFormSpeaking = "long_form_speaking", "Long-Form Speaking", Speaking, [Prompt], None;
  AudioResponse = "audio_response", "Audio Response", Speaking, [Prompt, Media], None;
  ImpromptuSpeaking = "impromptu_speaking", "Impromptu Speaking", Speaking, [Prompt], None;
  PronunciationCorrection = "pronunciation_correction", "Pronunciation Correction", Speaking, [Passage], None;
  Shadowing = "shadowing", "Shadowing", Speaking, [Passage, Media], None;
  // Listening
  ListenAndType = "listen_and_type", "Listen and Type", Listening, [Media, Text], None;
  ListenAndSelect = "listen_and_select", "Listen and Select", Listening, [Media, Options, CorrectAnswers], SINGLE;
  // Grammar & vocabulary
  GrammarErrorIdentification = "grammar_error_identification", "Identify the Grammar Error", GrammarVocab, [Prompt, Options, CorrectAnswers], SINGLE;
  TenseChoice = "tense_choice", "Choose the Correct Tense", GrammarVocab, [Prompt, Options, CorrectAnswers], SINGLE;
  SynonymChoice = "synonym_choice", "Choose the Synonym", GrammarVocab, [Prompt, Options, CorrectAnswers], SINGLE;
  TitleChoice = "title_choice", "Choose the Best Title", GrammarVocab, [Passage, Options, CorrectAnswers], SINGLE;
  SentenceInsertion = "sentence_insertion", "Sentence Insertion", GrammarVocab, [Passage, Options, CorrectAnswers], SINGLE;
  WordFamily = "word_family", "Word Family", GrammarVocab, [Passage, Blanks], None;
  ReadAndSelect = "read_and_select", "Read and Select", GrammarVocab, [Passage, Options, CorrectAnswers], MULTIPLE;
  ReadAndComplete = "read_and_complete", "Read and Complete", GrammarVocab, [Passage, Blanks], None;
  WriteSentenceWithWords = "write_sentence_with_words", "Write a Sentence with Given Words", GrammarVocab, [Prompt, Items], None;
  ShortAnswer = "short_answer", "Short Answer", GrammarVocab, [Prompt, SampleAnswer], None;
}

impl VariantTag {
  /// Total over the closed enum; the table is declared in enum order.
  pub fn descriptor(self) -> &'static VariantDescriptor {
    &DESCRIPTORS[self as usize]
  }

  pub fn category(self) -> Category {
    self.descriptor().category
  }
}

impl fmt::Display for VariantTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for VariantTag {
  type Err = UnknownVariantError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    lookup(s).map(|d| d.tag)
  }
}

fn index() -> &'static HashMap<&'static str, &'static VariantDescriptor> {
  static INDEX: OnceLock<HashMap<&'static str, &'static VariantDescriptor>> = OnceLock::new();
  INDEX.get_or_init(|| DESCRIPTORS.iter().map(|d| (d.tag.as_str(), d)).collect())
}

/// Resolve a wire tag to its descriptor.
pub fn lookup(tag: &str) -> Result<&'static VariantDescriptor, UnknownVariantError> {
  index()
    .get(tag)
    .copied()
    .ok_or_else(|| UnknownVariantError::new(tag))
}

/// All descriptors in catalogue order.
pub fn all() -> &'static [VariantDescriptor] {
  DESCRIPTORS
}
