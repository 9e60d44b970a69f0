//! Block builder: phase_start + inference, then phase_start + application.
//!
//! Each block owns a fresh [`UsedSet`], so no stimulus appears twice inside a
//! block while blocks may coincidentally share stimuli. A block either builds
//! completely or returns the first sampling error; partial blocks never leave
//! this module.

use std::path::Path;

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::*;
use crate::display::tip_pair;
use crate::error::Result;
use crate::phase::{make_decision_phase, make_phase_start, DecisionPhaseSpec, PhaseText, SamplingScope};
use crate::pool::StimulusPool;
use crate::sampling::{pick_any, ContextQuery, UsedSet};
use crate::types::{Block, KeyBindings, PhaseKind};

/// Background and hint text for one decision phase and its phase_start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDisplay {
    pub bg: String,
    pub hint: String,
    pub start_hint: String,
}

impl PhaseDisplay {
    pub fn inference() -> Self {
        Self {
            bg: INFERENCE_BG.to_string(),
            hint: INFERENCE_HINT.to_string(),
            start_hint: INFERENCE_START_HINT.to_string(),
        }
    }

    pub fn application() -> Self {
        Self {
            bg: APPLICATION_BG.to_string(),
            hint: APPLICATION_HINT.to_string(),
            start_hint: APPLICATION_START_HINT.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    pub n_decisions_per_phase: usize,
    pub p_same_inference: f64,
    pub p_same_application: f64,
    pub inference: PhaseDisplay,
    pub application: PhaseDisplay,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            n_decisions_per_phase: DEFAULT_DECISIONS_PER_PHASE,
            p_same_inference: DEFAULT_P_SAME,
            p_same_application: DEFAULT_P_SAME,
            inference: PhaseDisplay::inference(),
            application: PhaseDisplay::application(),
        }
    }
}

/// Key tips for the four phases of a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTips {
    pub inference_start: String,
    pub application_start: String,
    pub decide: String,
}

impl BlockTips {
    /// Behavioural sessions: exposure trials are acknowledged with a key.
    pub fn session(keys: &KeyBindings) -> Self {
        Self {
            inference_start: tip_pair(&keys.same, "Ready", &keys.different, "Ready"),
            application_start: tip_pair(&keys.same, "Memorized", &keys.different, "Memorized"),
            decide: tip_pair(&keys.same, "Same", &keys.different, "Different"),
        }
    }

    /// Scanner runs: exposure trials are trigger-paced and carry no key tip.
    pub fn manifest(keys: &KeyBindings) -> Self {
        Self {
            inference_start: String::new(),
            application_start: String::new(),
            decide: tip_pair(&keys.same, "Same", &keys.different, "Different"),
        }
    }
}

pub struct BlockBuilder<'a> {
    pub pool: &'a StimulusPool,
    pub base_dir: &'a Path,
    pub config: &'a BlockConfig,
    pub tips: &'a BlockTips,
}

impl BlockBuilder<'_> {
    /// Build block `block_id`, restricted to one family or mixed (`None`).
    pub fn build(&self, block_id: u32, restrict_family: Option<&str>, rng: &mut SmallRng) -> Result<Block> {
        let scope = SamplingScope {
            pool: self.pool,
            base_dir: self.base_dir,
            restrict_family,
        };
        let cfg = self.config;
        let mut used = UsedSet::new();

        // phase_start + inference (context follows each trial)
        let first = pick_any(self.pool, &used, &ContextQuery::within(restrict_family), rng)?;
        let inference_start = make_phase_start(
            &scope,
            &first,
            PhaseText {
                bg: cfg.inference.bg.clone(),
                hint: cfg.inference.start_hint.clone(),
                tip: self.tips.inference_start.clone(),
            },
            &mut used,
            rng,
        )?;
        let (inference, last) = make_decision_phase(
            &scope,
            DecisionPhaseSpec {
                kind: PhaseKind::Inference,
                n_trials: cfg.n_decisions_per_phase,
                p_same: cfg.p_same_inference,
                text: PhaseText {
                    bg: cfg.inference.bg.clone(),
                    hint: cfg.inference.hint.clone(),
                    tip: self.tips.decide.clone(),
                },
                context: first,
                swap_context: true,
            },
            &mut used,
            rng,
        )?;
        debug!("block {}: inference ended on {}", block_id, last);

        // phase_start + application (memorized context held fixed)
        let memorized = pick_any(self.pool, &used, &ContextQuery::within(restrict_family), rng)?;
        let application_start = make_phase_start(
            &scope,
            &memorized,
            PhaseText {
                bg: cfg.application.bg.clone(),
                hint: cfg.application.start_hint.clone(),
                tip: self.tips.application_start.clone(),
            },
            &mut used,
            rng,
        )?;
        let (application, _) = make_decision_phase(
            &scope,
            DecisionPhaseSpec {
                kind: PhaseKind::Application,
                n_trials: cfg.n_decisions_per_phase,
                p_same: cfg.p_same_application,
                text: PhaseText {
                    bg: cfg.application.bg.clone(),
                    hint: cfg.application.hint.clone(),
                    tip: self.tips.decide.clone(),
                },
                context: memorized,
                swap_context: false,
            },
            &mut used,
            rng,
        )?;

        Ok(Block {
            block_id,
            family: restrict_family.unwrap_or(MIX_FAMILY).to_string(),
            phases: [inference_start, inference, application_start, application],
        })
    }
}
