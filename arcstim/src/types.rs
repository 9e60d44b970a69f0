//! Core data structures: stimulus records, rule contexts and the
//! block/phase/trial hierarchy written to the session document.
//!
//! Everything here is a value type. Records are built once by
//! [`crate::pool::collect_pool`] and only ever borrowed afterwards; trials,
//! phases and blocks are assembled once and serialised once.

use std::fmt;
use std::path::PathBuf;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::constants::*;

// ── Stimuli ──

/// One generated stimulus available for sampling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StimulusRecord {
    pub id: String,
    pub family: String,
    pub sub_rule: String,
    pub seed: Option<u64>,
    /// Absolute location of `<id>.combined.png`.
    pub combined_path: PathBuf,
}

// ── Rule context ──

/// The (family, sub_rule) pair a participant is meant to track.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Context {
    pub family: String,
    pub sub_rule: String,
}

impl Context {
    pub fn new(family: impl Into<String>, sub_rule: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            sub_rule: sub_rule.into(),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.family, self.sub_rule)
    }
}

// ── Ground truth ──

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Correctness {
    Same,
    Different,
}

// ── Trials ──

/// One presentation of two stimuli drawn from the same sub-rule.
///
/// `correct` is `None` for phase_start exposure trials.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trial {
    /// Image paths relative to the output document's directory.
    pub imgs: [String; 2],
    pub family: String,
    pub sub_rule: String,
    pub ids: [String; 2],
    pub seeds: [Option<u64>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<Correctness>,
}

impl Trial {
    pub fn context(&self) -> Context {
        Context::new(&self.family, &self.sub_rule)
    }
}

// ── Phases ──

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    PhaseStart,
    Inference,
    Application,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::PhaseStart => "phase_start",
            PhaseKind::Inference => "inference",
            PhaseKind::Application => "application",
        }
    }

    pub fn is_decision(&self) -> bool {
        !matches!(self, PhaseKind::PhaseStart)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Phase {
    pub kind: PhaseKind,
    pub bg: String,
    pub hint: String,
    pub tip: String,
    pub trials: Vec<Trial>,
}

// Exposure phases list their single trial under "trial", decision phases
// under "trials"; the stimulus runner keys on that distinction.
impl Serialize for Phase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Phase", 5)?;
        s.serialize_field("phase", self.kind.as_str())?;
        s.serialize_field("bg", &self.bg)?;
        s.serialize_field("hint", &self.hint)?;
        s.serialize_field("tip", &self.tip)?;
        if self.kind.is_decision() {
            s.serialize_field("trials", &self.trials)?;
        } else {
            s.serialize_field("trial", &self.trials)?;
        }
        s.end()
    }
}

// ── Blocks ──

/// phase_start(inference), inference, phase_start(application), application.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Block {
    pub block_id: u32,
    /// Restricted family name, or [`MIX_FAMILY`].
    pub family: String,
    pub phases: [Phase; 4],
}

impl Block {
    pub fn is_mix(&self) -> bool {
        self.family == MIX_FAMILY
    }

    /// Total trials across all phases (exposure trials included).
    pub fn item_count(&self) -> usize {
        self.phases.iter().map(|p| p.trials.len()).sum()
    }

    pub fn trials(&self) -> impl Iterator<Item = &Trial> {
        self.phases.iter().flat_map(|p| p.trials.iter())
    }
}

// ── Document ──

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub same: String,
    pub different: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            same: DEFAULT_KEY_SAME.to_string(),
            different: DEFAULT_KEY_DIFFERENT.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmriConfig {
    #[serde(rename = "use")]
    pub use_scanner: bool,
    pub trigger_key: String,
    /// Dummy scans discarded before the first stimulus.
    pub disdaq: u32,
}

impl Default for FmriConfig {
    fn default() -> Self {
        Self {
            use_scanner: false,
            trigger_key: DEFAULT_TRIGGER_KEY.to_string(),
            disdaq: DEFAULT_DISDAQ,
        }
    }
}

/// The serialised session (or manifest, when `fmri` is present).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionDocument {
    pub participant: String,
    pub keys: KeyBindings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fmri: Option<FmriConfig>,
    pub blocks: Vec<Block>,
}
