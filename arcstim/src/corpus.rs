//! Append-only corpus writer.
//!
//! Produces the layout [`crate::pool::collect_pool`] reads: one directory per
//! sub-rule holding `stimuli.jsonl` and a `<id>.combined.png` per stimulus.
//! Content generation and image rendering are supplied by the caller through
//! [`StimulusGenerator`] and [`CombinedRenderer`].

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::constants::*;
use crate::error::{BuildError, Result};
use crate::grid::Grid;
use crate::pool::derive_family;

/// Output of one generator call.
#[derive(Clone, Debug)]
pub struct GeneratedStimulus {
    pub input: Grid,
    pub output: Grid,
    pub params: serde_json::Value,
}

/// Procedural content for one sub-rule.
pub trait StimulusGenerator {
    /// Sub-rule name, e.g. `expansion.star_full`.
    fn rule(&self) -> &str;

    fn generate(&self, rng: &mut SmallRng) -> GeneratedStimulus;
}

/// Writes the side-by-side input/output image for a stimulus.
pub trait CombinedRenderer {
    fn render_combined(&self, input: &Grid, output: &Grid, path: &Path) -> std::io::Result<()>;
}

#[derive(Serialize)]
struct RecordPaths<'a> {
    combined: &'a str,
}

#[derive(Serialize)]
struct MetadataRecord<'a> {
    id: &'a str,
    rule: &'a str,
    family: &'a str,
    seed: u64,
    params: &'a serde_json::Value,
    paths: RecordPaths<'a>,
}

/// Result of one append.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenStimulus {
    pub id: String,
    pub seed: u64,
    pub combined_path: PathBuf,
}

pub struct CorpusWriter {
    root: PathBuf,
}

impl CorpusWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generate, render and log one stimulus for `generator.rule()`.
    ///
    /// The per-stimulus seed is drawn from `rng`; the generator runs on its own
    /// rng seeded with it, so any single stimulus can be regenerated.
    pub fn append(
        &self,
        generator: &dyn StimulusGenerator,
        renderer: &dyn CombinedRenderer,
        rng: &mut SmallRng,
    ) -> Result<WrittenStimulus> {
        let rule = generator.rule();
        let dir = self.root.join(rule);
        fs::create_dir_all(&dir).map_err(|e| BuildError::fs(&dir, e))?;
        let log_path = dir.join(METADATA_LOG);

        let index = next_index(&log_path)?;
        let seed = rng.random::<u32>() as u64;
        let mut stim_rng = SmallRng::seed_from_u64(seed);
        let produced = generator.generate(&mut stim_rng);

        let id = format!("{}.t{}", rule, index);
        let combined_path = dir.join(format!("{}{}", id, COMBINED_SUFFIX));
        renderer
            .render_combined(&produced.input, &produced.output, &combined_path)
            .map_err(|e| BuildError::fs(&combined_path, e))?;

        let family = derive_family(None, rule);
        let combined = combined_path.to_string_lossy();
        let record = MetadataRecord {
            id: &id,
            rule,
            family: &family,
            seed,
            params: &produced.params,
            paths: RecordPaths {
                combined: &combined,
            },
        };
        let line = serde_json::to_string(&record)?;

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| BuildError::fs(&log_path, e))?;
        writeln!(log, "{}", line).map_err(|e| BuildError::fs(&log_path, e))?;
        debug!("appended {} (seed {})", id, seed);

        Ok(WrittenStimulus {
            id,
            seed,
            combined_path,
        })
    }
}

/// 1-based index of the next record in an append-only log.
fn next_index(log_path: &Path) -> Result<usize> {
    if !log_path.exists() {
        return Ok(1);
    }
    let text = fs::read_to_string(log_path).map_err(|e| BuildError::fs(log_path, e))?;
    Ok(text.lines().count() + 1)
}
