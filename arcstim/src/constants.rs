//! Corpus layout names, document labels and configuration defaults.
//!
//! Corpus layout on disk:
//! - `<root>/<rule_dir>/`[`METADATA_LOG`]: one JSON record per line
//! - `<root>/<rule_dir>/<id>`[`COMBINED_SUFFIX`]: rendered input/output pair
//!
//! Defaults mirror the parameters the experiment was run with.

/// Append-only metadata log inside each sub-rule directory.
pub const METADATA_LOG: &str = "stimuli.jsonl";

/// Suffix of the combined input/output image written per stimulus id.
pub const COMBINED_SUFFIX: &str = ".combined.png";

/// Separator between family prefix and sub-rule name (`expansion.star_full`).
pub const FAMILY_SEPARATOR: char = '.';

/// Family used when neither the record nor the sub-rule prefix names one.
pub const UNKNOWN_FAMILY: &str = "unknown";

/// Block family label for blocks that sample across all families.
pub const MIX_FAMILY: &str = "mix";

/// Spaces between the left and right halves of a key tip.
pub const TIP_GAP: usize = 10;

// ── Session defaults ──

pub const DEFAULT_CORPUS_ROOT: &str = "out";
pub const DEFAULT_PARTICIPANT: &str = "p001";
pub const DEFAULT_SESSION_PATH: &str = "session.json";
pub const DEFAULT_MANIFEST_PATH: &str = "manifest.json";
pub const DEFAULT_PRACTICE_PATH: &str = "practice.json";
pub const DEFAULT_SESSION_SEED: u64 = 2;
pub const DEFAULT_PRACTICE_SEED: u64 = 123;
pub const DEFAULT_KEY_SAME: &str = "LeftArrow";
pub const DEFAULT_KEY_DIFFERENT: &str = "RightArrow";
pub const DEFAULT_FAMILY_BLOCKS: usize = 6;
pub const DEFAULT_MIX_BLOCKS: usize = 2;
pub const DEFAULT_DECISIONS_PER_PHASE: usize = 8;
pub const DEFAULT_P_SAME: f64 = 0.5;

// ── Phase display ──

pub const INFERENCE_BG: &str = "green";
pub const INFERENCE_HINT: &str = "Previous rule";
pub const INFERENCE_START_HINT: &str = "First rule";
pub const APPLICATION_BG: &str = "red";
pub const APPLICATION_HINT: &str = "Memorized rule";
pub const APPLICATION_START_HINT: &str = "Memorize this rule";

// ── fMRI ──

pub const DEFAULT_TRIGGER_KEY: &str = "5%";
pub const DEFAULT_DISDAQ: u32 = 4;

// ── Practice manifest ──

pub const PRACTICE_PHASE_NAME: &str = "train";
pub const PRACTICE_BG: &str = "green";
pub const PRACTICE_TIP: &str = "Same = left, Different = right";
pub const PRACTICE_EXAMPLES_PER_BLOCK: usize = 2;
pub const PRACTICE_TRIALS_PER_BLOCK: usize = 20;
