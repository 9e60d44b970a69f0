//! Practice manifest: per-family example images followed by unscored trials.
//!
//! One block per family with enough stimuli. Families are visited in sorted
//! order; each family's records are shuffled with the run's rng before the
//! examples and trials are cut from the front.

use std::path::{Path, PathBuf};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::*;
use crate::error::Result;
use crate::paths::relative_to;
use crate::pool::{collect_pool, StimulusPool};
use crate::session::{prepare_output, write_document};
use crate::types::{FmriConfig, KeyBindings, StimulusRecord};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    pub corpus_root: PathBuf,
    pub participant: String,
    pub output: PathBuf,
    pub seed: u64,
    pub keys: KeyBindings,
    pub fmri: FmriConfig,
    pub phase_name: String,
    pub bg: String,
    pub tip: String,
    pub n_examples_per_block: usize,
    pub n_trials_per_block: usize,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            corpus_root: PathBuf::from(DEFAULT_CORPUS_ROOT),
            participant: DEFAULT_PARTICIPANT.to_string(),
            output: PathBuf::from(DEFAULT_PRACTICE_PATH),
            seed: DEFAULT_PRACTICE_SEED,
            keys: KeyBindings::default(),
            fmri: FmriConfig::default(),
            phase_name: PRACTICE_PHASE_NAME.to_string(),
            bg: PRACTICE_BG.to_string(),
            tip: PRACTICE_TIP.to_string(),
            n_examples_per_block: PRACTICE_EXAMPLES_PER_BLOCK,
            n_trials_per_block: PRACTICE_TRIALS_PER_BLOCK,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PracticeTrial {
    pub img: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PracticePhase {
    pub phase: String,
    pub bg: String,
    pub tip: String,
    pub example_images: Vec<String>,
    pub trials: Vec<PracticeTrial>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PracticeBlock {
    pub block_id: u32,
    pub family: String,
    pub phases: Vec<PracticePhase>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PracticeManifest {
    pub participant: String,
    pub keys: KeyBindings,
    pub fmri: FmriConfig,
    pub blocks: Vec<PracticeBlock>,
}

/// Cut example and trial images for every family with at least
/// `n_examples + 1` stimuli.
pub fn assemble_practice_blocks(
    pool: &StimulusPool,
    base_dir: &Path,
    config: &PracticeConfig,
    rng: &mut SmallRng,
) -> Vec<PracticeBlock> {
    let n_examples = config.n_examples_per_block;
    let mut blocks = Vec::new();
    let mut next_id: u32 = 1;

    for (family, family_pool) in pool.iter() {
        let mut items: Vec<&StimulusRecord> = family_pool.values().flatten().collect();
        if items.len() < n_examples + 1 {
            warn!("family {} has {} stimuli, skipping practice block", family, items.len());
            continue;
        }
        items.shuffle(rng);

        let rel = |r: &StimulusRecord| relative_to(&r.combined_path, base_dir);
        let example_images: Vec<String> = items[..n_examples].iter().map(|&r| rel(r)).collect();
        let trials: Vec<PracticeTrial> = items[n_examples..]
            .iter()
            .take(config.n_trials_per_block)
            .map(|&r| PracticeTrial { img: rel(r) })
            .collect();

        blocks.push(PracticeBlock {
            block_id: next_id,
            family: family.clone(),
            phases: vec![PracticePhase {
                phase: config.phase_name.clone(),
                bg: config.bg.clone(),
                tip: config.tip.clone(),
                example_images,
                trials,
            }],
        });
        next_id += 1;
    }
    blocks
}

/// Load the pool and build the practice manifest without writing it.
pub fn build_practice_manifest(config: &PracticeConfig, base_dir: &Path) -> Result<PracticeManifest> {
    let pool = collect_pool(&config.corpus_root)?;
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let blocks = assemble_practice_blocks(&pool, base_dir, config, &mut rng);
    info!("practice manifest: {} blocks", blocks.len());

    Ok(PracticeManifest {
        participant: config.participant.clone(),
        keys: config.keys.clone(),
        fmri: config.fmri.clone(),
        blocks,
    })
}

/// Build and write the practice manifest, printing a summary.
pub fn run_practice(config: &PracticeConfig) -> Result<(PracticeManifest, PathBuf)> {
    let (base_dir, doc_path) = prepare_output(&config.output)?;
    let manifest = build_practice_manifest(config, &base_dir)?;
    write_document(&manifest, &doc_path)?;

    println!("Wrote: {}", doc_path.display());
    println!("Blocks: {}", manifest.blocks.len());
    for b in &manifest.blocks {
        let n: usize = b.phases.iter().map(|p| p.trials.len()).sum();
        println!("  block {:02} family={} trials={}", b.block_id, b.family, n);
    }
    Ok((manifest, doc_path))
}
