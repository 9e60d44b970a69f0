//! Session assembler: family blocks, then mix blocks, into one document.
//!
//! The run is a single deterministic pass driven by one `SmallRng`:
//!
//! 1. Load the [`StimulusPool`] once.
//! 2. Shuffle the sorted family names; try one restricted block for each of the
//!    first `n_family_blocks`, skipping families that run out of stimuli.
//! 3. Try `n_mix_blocks` unrestricted blocks, stopping at the first failure.
//! 4. Number the surviving blocks 1.. and write the document.
//!
//! Only capacity errors are recovered (block skipped or mix loop stopped);
//! file-system errors end the run.

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::block::{BlockBuilder, BlockConfig, BlockTips};
use crate::constants::*;
use crate::error::{BuildError, Result};
use crate::pool::{collect_pool, StimulusPool};
use crate::types::{Block, FmriConfig, KeyBindings, SessionDocument};

/// Output flavour: a behavioural session or an fMRI manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionVariant {
    Session,
    Manifest(FmriConfig),
}

impl SessionVariant {
    fn tips(&self, keys: &KeyBindings) -> BlockTips {
        match self {
            SessionVariant::Session => BlockTips::session(keys),
            SessionVariant::Manifest(_) => BlockTips::manifest(keys),
        }
    }

    fn fmri(&self) -> Option<FmriConfig> {
        match self {
            SessionVariant::Session => None,
            SessionVariant::Manifest(fmri) => Some(fmri.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub corpus_root: PathBuf,
    pub participant: String,
    pub output: PathBuf,
    /// `None` derives the seed from the participant id.
    pub seed: Option<u64>,
    pub keys: KeyBindings,
    pub n_family_blocks: usize,
    pub n_mix_blocks: usize,
    pub block: BlockConfig,
    pub variant: SessionVariant,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            corpus_root: PathBuf::from(DEFAULT_CORPUS_ROOT),
            participant: DEFAULT_PARTICIPANT.to_string(),
            output: PathBuf::from(DEFAULT_SESSION_PATH),
            seed: Some(DEFAULT_SESSION_SEED),
            keys: KeyBindings::default(),
            n_family_blocks: DEFAULT_FAMILY_BLOCKS,
            n_mix_blocks: DEFAULT_MIX_BLOCKS,
            block: BlockConfig::default(),
            variant: SessionVariant::Session,
        }
    }
}

impl SessionConfig {
    /// Defaults for an fMRI manifest.
    pub fn manifest(fmri: FmriConfig) -> Self {
        Self {
            output: PathBuf::from(DEFAULT_MANIFEST_PATH),
            variant: SessionVariant::Manifest(fmri),
            ..Self::default()
        }
    }

    /// Parse a manifest configuration. Fields the JSON leaves out take
    /// manifest defaults: output [`DEFAULT_MANIFEST_PATH`] and a
    /// [`SessionVariant::Manifest`] variant.
    pub fn manifest_from_json(text: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let has_output = value.get("output").is_some();
        let mut cfg: Self = serde_json::from_value(value)?;
        if !has_output {
            cfg.output = PathBuf::from(DEFAULT_MANIFEST_PATH);
        }
        if cfg.variant == SessionVariant::Session {
            cfg.variant = SessionVariant::Manifest(FmriConfig::default());
        }
        Ok(cfg)
    }

    pub fn target_blocks(&self) -> usize {
        self.n_family_blocks + self.n_mix_blocks
    }
}

/// Explicit seed, or the first 8 bytes of SHA-256(participant).
pub fn resolve_seed(seed: Option<u64>, participant: &str) -> u64 {
    seed.unwrap_or_else(|| {
        let digest = Sha256::digest(participant.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(bytes)
    })
}

/// What an exhausted block attempt does to the rest of its loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnExhaustion {
    /// Drop the block and try the next label.
    Skip,
    /// Drop the block and every later attempt.
    Stop,
}

/// Try one block per label, appending successes to `blocks` with ids that
/// continue from `blocks.len() + 1`. Non-capacity errors end the run.
pub fn attempt_blocks<'l>(
    labels: impl IntoIterator<Item = &'l str>,
    on_exhaustion: OnExhaustion,
    blocks: &mut Vec<Block>,
    mut build: impl FnMut(u32, &'l str) -> Result<Block>,
) -> Result<()> {
    for label in labels {
        let block_id = blocks.len() as u32 + 1;
        match build(block_id, label) {
            Ok(block) => {
                info!("block {:02}: {} ({} items)", block_id, label, block.item_count());
                blocks.push(block);
            }
            Err(e) if e.is_exhaustion() => match on_exhaustion {
                OnExhaustion::Skip => warn!("skipping {} block: {}", label, e),
                OnExhaustion::Stop => {
                    warn!("stopping {} blocks: {}", label, e);
                    break;
                }
            },
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Build the block sequence from an already loaded pool.
pub fn assemble_blocks(
    pool: &StimulusPool,
    base_dir: &Path,
    config: &SessionConfig,
    rng: &mut SmallRng,
) -> Result<Vec<Block>> {
    let tips = config.variant.tips(&config.keys);
    let builder = BlockBuilder {
        pool,
        base_dir,
        config: &config.block,
        tips: &tips,
    };

    let mut families = pool.families();
    families.shuffle(rng);

    let mut blocks: Vec<Block> = Vec::with_capacity(config.target_blocks());
    attempt_blocks(
        families.iter().take(config.n_family_blocks).map(String::as_str),
        OnExhaustion::Skip,
        &mut blocks,
        |block_id, family| builder.build(block_id, Some(family), rng),
    )?;
    attempt_blocks(
        std::iter::repeat(MIX_FAMILY).take(config.n_mix_blocks),
        OnExhaustion::Stop,
        &mut blocks,
        |block_id, _| builder.build(block_id, None, rng),
    )?;

    if blocks.len() < config.target_blocks() {
        warn!(
            "built {} of {} requested blocks",
            blocks.len(),
            config.target_blocks()
        );
    }
    Ok(blocks)
}

/// Create the output directory and return its absolute path together with the
/// absolute document path.
pub fn prepare_output(output: &Path) -> Result<(PathBuf, PathBuf)> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| BuildError::fs(&parent, e))?;
    let base_dir = fs::canonicalize(&parent).map_err(|e| BuildError::fs(&parent, e))?;
    let file_name = output
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_PATH));
    let doc_path = base_dir.join(file_name);
    Ok((base_dir, doc_path))
}

/// Load the pool and build the full document without writing it.
pub fn build_session(config: &SessionConfig, base_dir: &Path) -> Result<SessionDocument> {
    let pool = collect_pool(&config.corpus_root)?;
    let seed = resolve_seed(config.seed, &config.participant);
    info!("participant {} seed {}", config.participant, seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    let blocks = assemble_blocks(&pool, base_dir, config, &mut rng)?;
    Ok(SessionDocument {
        participant: config.participant.clone(),
        keys: config.keys.clone(),
        fmri: config.variant.fmri(),
        blocks,
    })
}

/// Pretty-printed JSON (two-space indent, non-ASCII kept).
pub fn encode_document<T: Serialize>(doc: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

pub fn write_document<T: Serialize>(doc: &T, path: &Path) -> Result<()> {
    let text = encode_document(doc)?;
    fs::write(path, text).map_err(|e| BuildError::fs(path, e))
}

/// Build, write and summarise. Returns the document and where it was written.
pub fn run_session(config: &SessionConfig) -> Result<(SessionDocument, PathBuf)> {
    let (base_dir, doc_path) = prepare_output(&config.output)?;
    let doc = build_session(config, &base_dir)?;
    write_document(&doc, &doc_path)?;
    print_summary(&doc, &doc_path, config.target_blocks());
    Ok((doc, doc_path))
}

pub fn print_summary(doc: &SessionDocument, path: &Path, target: usize) {
    println!("Wrote: {}", path.display());
    println!("Blocks: {} (target: {})", doc.blocks.len(), target);
    if doc.blocks.len() < target {
        println!(
            "  {} requested block(s) skipped: stimulus pools exhausted",
            target - doc.blocks.len()
        );
    }
    for block in &doc.blocks {
        println!(
            "  block {:02} family={} items={}",
            block.block_id,
            block.family,
            block.item_count()
        );
    }
}
