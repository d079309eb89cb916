//! Runtime configuration composer.
//!
//! A block's runtime behaviour (timing, attempts, scoring, AI evaluation, exam
//! mode) is composed from loosely typed options: omitted fields take their
//! defaults, numbers are range-checked, and the two capture extensions are only
//! accepted for the family that can use them. Every check runs; callers get
//! all problems at once.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::classify::{capability_allowed, classify};
use crate::registry::{Capability, Category, VariantTag};
use crate::util::clean_text;

pub const DEFAULT_TIME_LIMIT_SECONDS: u32 = 0;
pub const DEFAULT_MAX_ATTEMPTS: u8 = 3;
pub const DEFAULT_POINTS: u8 = 10;

const MAX_ATTEMPTS_RANGE: (i64, i64) = (1, 10);
const POINTS_RANGE: (i64, i64) = (1, 100);
const TIME_LIMIT_RANGE: (i64, i64) = (0, u32::MAX as i64);
const PREPARATION_RANGE: (i64, i64) = (0, 300);
const RECORDING_RANGE: (i64, i64) = (10, 600);
const PLAYBACK_RANGE: (i64, i64) = (1, 10);

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Universal options as supplied by an author. `None` means "use the default".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversalOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub time_limit_seconds: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_attempts: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub show_solution_after_exhausted: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ai_evaluation_enabled: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ai_evaluation_prompt: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exam_mode_enabled: Option<bool>,
  #[serde(default)]
  pub scoring: ScoringOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub points: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub partial_credit_allowed: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakingOptions {
  pub preparation_time_seconds: i64,
  pub recording_time_seconds: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListeningOptions {
  pub max_playback_count: i64,
  #[serde(default)]
  pub auto_play_enabled: bool,
}

/// Config as a field map: universal options flattened, capabilities nested.
/// This is both the request shape and the persisted `config` shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDraft {
  #[serde(flatten)]
  pub universal: UniversalOptions,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub speaking: Option<SpeakingOptions>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub listening: Option<ListeningOptions>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scoring {
  pub points: u8,
  pub partial_credit_allowed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakingCapture {
  pub preparation_time_seconds: u16,
  pub recording_time_seconds: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListeningCapture {
  pub max_playback_count: u8,
  pub auto_play_enabled: bool,
}

/// Validated runtime behaviour of a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
  /// 0 means no time limit.
  pub time_limit_seconds: u32,
  pub max_attempts: u8,
  pub show_solution_after_exhausted: bool,
  pub ai_evaluation_enabled: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ai_evaluation_prompt: Option<String>,
  pub exam_mode_enabled: bool,
  pub scoring: Scoring,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub speaking: Option<SpeakingCapture>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub listening: Option<ListeningCapture>,
}

impl RuntimeConfig {
  /// Field-map form with every value spelled out.
  pub fn to_draft(&self) -> ConfigDraft {
    ConfigDraft {
      universal: UniversalOptions {
        time_limit_seconds: Some(self.time_limit_seconds.into()),
        max_attempts: Some(self.max_attempts.into()),
        show_solution_after_exhausted: Some(self.show_solution_after_exhausted),
        ai_evaluation_enabled: Some(self.ai_evaluation_enabled),
        ai_evaluation_prompt: self.ai_evaluation_prompt.clone(),
        exam_mode_enabled: Some(self.exam_mode_enabled),
        scoring: ScoringOptions {
          points: Some(self.scoring.points.into()),
          partial_credit_allowed: Some(self.scoring.partial_credit_allowed),
        },
      },
      speaking: self.speaking.as_ref().map(|s| SpeakingOptions {
        preparation_time_seconds: s.preparation_time_seconds.into(),
        recording_time_seconds: s.recording_time_seconds.into(),
      }),
      listening: self.listening.as_ref().map(|l| ListeningOptions {
        max_playback_count: l.max_playback_count.into(),
        auto_play_enabled: l.auto_play_enabled,
      }),
    }
  }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ConfigField {
  #[serde(rename = "timeLimitSeconds")]
  TimeLimitSeconds,
  #[serde(rename = "maxAttempts")]
  MaxAttempts,
  #[serde(rename = "scoring.points")]
  Points,
  #[serde(rename = "speaking.preparationTimeSeconds")]
  PreparationTimeSeconds,
  #[serde(rename = "speaking.recordingTimeSeconds")]
  RecordingTimeSeconds,
  #[serde(rename = "listening.maxPlaybackCount")]
  MaxPlaybackCount,
}

impl std::fmt::Display for ConfigField {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      ConfigField::TimeLimitSeconds => "timeLimitSeconds",
      ConfigField::MaxAttempts => "maxAttempts",
      ConfigField::Points => "scoring.points",
      ConfigField::PreparationTimeSeconds => "speaking.preparationTimeSeconds",
      ConfigField::RecordingTimeSeconds => "speaking.recordingTimeSeconds",
      ConfigField::MaxPlaybackCount => "listening.maxPlaybackCount",
    };
    f.write_str(name)
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ConfigError {
  #[error("{capability} settings do not apply to {category} blocks")]
  CapabilityNotApplicable { capability: Capability, category: Category },
  #[error("{field} must be between {min} and {max}, got {value}")]
  OutOfRange { field: ConfigField, value: i64, min: i64, max: i64 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("config has {} error(s)", .0.len())]
pub struct ConfigErrors(pub Vec<ConfigError>);

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

fn ranged<T: TryFrom<i64>>(
  field: ConfigField,
  value: i64,
  (min, max): (i64, i64),
  errors: &mut Vec<ConfigError>,
) -> Option<T> {
  if value < min || value > max {
    errors.push(ConfigError::OutOfRange { field, value, min, max });
    return None;
  }
  T::try_from(value).ok()
}

fn gate(variant: VariantTag, capability: Capability, errors: &mut Vec<ConfigError>) -> bool {
  let allowed = capability_allowed(variant, capability);
  if !allowed {
    errors.push(ConfigError::CapabilityNotApplicable { capability, category: classify(variant) });
  }
  allowed
}

/// Compose the runtime config of a `variant` block.
pub fn compose(
  variant: VariantTag,
  universal: &UniversalOptions,
  speaking: Option<&SpeakingOptions>,
  listening: Option<&ListeningOptions>,
) -> Result<RuntimeConfig, ConfigErrors> {
  let mut errors = Vec::new();

  let time_limit = ranged::<u32>(
    ConfigField::TimeLimitSeconds,
    universal.time_limit_seconds.unwrap_or(DEFAULT_TIME_LIMIT_SECONDS.into()),
    TIME_LIMIT_RANGE,
    &mut errors,
  );
  let max_attempts = ranged::<u8>(
    ConfigField::MaxAttempts,
    universal.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS.into()),
    MAX_ATTEMPTS_RANGE,
    &mut errors,
  );
  let points = ranged::<u8>(
    ConfigField::Points,
    universal.scoring.points.unwrap_or(DEFAULT_POINTS.into()),
    POINTS_RANGE,
    &mut errors,
  );

  let speaking = speaking.and_then(|s| {
    let allowed = gate(variant, Capability::SpeakingCapture, &mut errors);
    let prep = ranged::<u16>(
      ConfigField::PreparationTimeSeconds,
      s.preparation_time_seconds,
      PREPARATION_RANGE,
      &mut errors,
    );
    let rec = ranged::<u16>(
      ConfigField::RecordingTimeSeconds,
      s.recording_time_seconds,
      RECORDING_RANGE,
      &mut errors,
    );
    match (allowed, prep, rec) {
      (true, Some(preparation_time_seconds), Some(recording_time_seconds)) => {
        Some(SpeakingCapture { preparation_time_seconds, recording_time_seconds })
      }
      _ => None,
    }
  });

  let listening = listening.and_then(|l| {
    let allowed = gate(variant, Capability::ListeningCapture, &mut errors);
    let plays = ranged::<u8>(
      ConfigField::MaxPlaybackCount,
      l.max_playback_count,
      PLAYBACK_RANGE,
      &mut errors,
    );
    match (allowed, plays) {
      (true, Some(max_playback_count)) => {
        Some(ListeningCapture { max_playback_count, auto_play_enabled: l.auto_play_enabled })
      }
      _ => None,
    }
  });

  let (Some(time_limit_seconds), Some(max_attempts), Some(points)) = (time_limit, max_attempts, points)
  else {
    debug!(target: "authoring", %variant, errors = errors.len(), "Config rejected");
    return Err(ConfigErrors(errors));
  };
  if !errors.is_empty() {
    debug!(target: "authoring", %variant, errors = errors.len(), "Config rejected");
    return Err(ConfigErrors(errors));
  }

  Ok(RuntimeConfig {
    time_limit_seconds,
    max_attempts,
    show_solution_after_exhausted: universal.show_solution_after_exhausted.unwrap_or(true),
    ai_evaluation_enabled: universal.ai_evaluation_enabled.unwrap_or(false),
    ai_evaluation_prompt: clean_text(universal.ai_evaluation_prompt.as_deref()),
    exam_mode_enabled: universal.exam_mode_enabled.unwrap_or(false),
    scoring: Scoring {
      points,
      partial_credit_allowed: universal.scoring.partial_credit_allowed.unwrap_or(false),
    },
    speaking,
    listening,
  })
}

/// Compose from the field-map form.
pub fn compose_draft(variant: VariantTag, draft: &ConfigDraft) -> Result<RuntimeConfig, ConfigErrors> {
  compose(variant, &draft.universal, draft.speaking.as_ref(), draft.listening.as_ref())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn speaking(prep: i64, rec: i64) -> SpeakingOptions {
    SpeakingOptions { preparation_time_seconds: prep, recording_time_seconds: rec }
  }

  #[test]
  fn defaults_apply_when_omitted() {
    let cfg = compose(VariantTag::McqSingle, &UniversalOptions::default(), None, None).unwrap();
    assert_eq!(cfg.max_attempts, 3);
    assert_eq!(cfg.time_limit_seconds, 0);
    assert_eq!(cfg.scoring.points, 10);
    assert!(!cfg.scoring.partial_credit_allowed);
    assert!(cfg.show_solution_after_exhausted);
    assert!(!cfg.ai_evaluation_enabled);
    assert!(!cfg.exam_mode_enabled);
    assert_eq!(cfg.speaking, None);
    assert_eq!(cfg.listening, None);
  }

  #[test]
  fn speaking_capture_rejected_for_writing() {
    let err = compose(
      VariantTag::EssayWriting,
      &UniversalOptions::default(),
      Some(&speaking(30, 60)),
      None,
    )
    .unwrap_err();
    assert_eq!(
      err.0,
      vec![ConfigError::CapabilityNotApplicable {
        capability: Capability::SpeakingCapture,
        category: Category::Writing,
      }]
    );
  }

  #[test]
  fn capture_accepted_for_matching_family() {
    let cfg = compose(VariantTag::CueCard, &UniversalOptions::default(), Some(&speaking(60, 120)), None)
      .unwrap();
    assert_eq!(
      cfg.speaking,
      Some(SpeakingCapture { preparation_time_seconds: 60, recording_time_seconds: 120 })
    );

    let listening = ListeningOptions { max_playback_count: 2, auto_play_enabled: true };
    let cfg = compose(VariantTag::ListenAndType, &UniversalOptions::default(), None, Some(&listening))
      .unwrap();
    assert_eq!(cfg.listening.map(|l| l.max_playback_count), Some(2));

    let err = compose(VariantTag::ListenAndSpeak, &UniversalOptions::default(), None, Some(&listening))
      .unwrap_err();
    assert!(matches!(err.0[0], ConfigError::CapabilityNotApplicable { category: Category::Speaking, .. }));
  }

  #[test]
  fn ranges_are_enforced() {
    let mut opts = UniversalOptions { max_attempts: Some(0), ..Default::default() };
    opts.scoring.points = Some(101);
    let err = compose(VariantTag::TenseChoice, &opts, None, None).unwrap_err();
    assert_eq!(err.0.len(), 2);
    assert!(err.0.iter().any(|e| matches!(e, ConfigError::OutOfRange { field: ConfigField::MaxAttempts, value: 0, .. })));
    assert!(err.0.iter().any(|e| matches!(e, ConfigError::OutOfRange { field: ConfigField::Points, value: 101, .. })));

    let opts = UniversalOptions { time_limit_seconds: Some(-5), ..Default::default() };
    assert!(compose(VariantTag::Text, &opts, None, None).is_err());

    let opts = UniversalOptions { max_attempts: Some(10), ..Default::default() };
    assert_eq!(compose(VariantTag::Text, &opts, None, None).unwrap().max_attempts, 10);
  }

  #[test]
  fn inapplicable_and_out_of_range_reported_together() {
    let err = compose(
      VariantTag::Matching,
      &UniversalOptions::default(),
      Some(&speaking(301, 5)),
      None,
    )
    .unwrap_err();
    assert_eq!(err.0.len(), 3);
    assert!(matches!(err.0[0], ConfigError::CapabilityNotApplicable { .. }));
    assert!(matches!(err.0[1], ConfigError::OutOfRange { field: ConfigField::PreparationTimeSeconds, .. }));
    assert!(matches!(err.0[2], ConfigError::OutOfRange { field: ConfigField::RecordingTimeSeconds, .. }));
  }

  #[test]
  fn blank_ai_prompt_is_dropped() {
    let opts = UniversalOptions {
      ai_evaluation_enabled: Some(true),
      ai_evaluation_prompt: Some("   ".into()),
      ..Default::default()
    };
    let cfg = compose(VariantTag::AiFeedbackWriting, &opts, None, None).unwrap();
    assert!(cfg.ai_evaluation_enabled);
    assert_eq!(cfg.ai_evaluation_prompt, None);
  }

  #[test]
  fn draft_shape_reads_flat_universal_fields() {
    let draft: ConfigDraft = serde_json::from_value(serde_json::json!({
      "maxAttempts": 5,
      "examModeEnabled": true,
      "scoring": { "points": 20, "partialCreditAllowed": true },
      "speaking": { "preparationTimeSeconds": 15, "recordingTimeSeconds": 90 }
    }))
    .unwrap();
    let cfg = compose_draft(VariantTag::ReadAloud, &draft).unwrap();
    assert_eq!(cfg.max_attempts, 5);
    assert!(cfg.exam_mode_enabled);
    assert_eq!(cfg.scoring, Scoring { points: 20, partial_credit_allowed: true });
    assert_eq!(cfg.speaking.as_ref().map(|s| s.recording_time_seconds), Some(90));

    // The spelled-out form composes back to the same config.
    assert_eq!(compose_draft(VariantTag::ReadAloud, &cfg.to_draft()).unwrap(), cfg);
  }

  #[test]
  fn serialized_shape_is_camel_case() {
    let cfg = compose(VariantTag::Video, &UniversalOptions::default(), None, None).unwrap();
    let json = serde_json::to_value(&cfg).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "timeLimitSeconds": 0,
        "maxAttempts": 3,
        "showSolutionAfterExhausted": true,
        "aiEvaluationEnabled": false,
        "examModeEnabled": false,
        "scoring": { "points": 10, "partialCreditAllowed": false }
      })
    );
  }
}
