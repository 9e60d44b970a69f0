//! Stimulus pool: every usable stimulus in a corpus, indexed by family and
//! sub-rule.
//!
//! Built once per run by [`collect_pool`] and read-only afterwards. Families
//! and sub-rules iterate in sorted order and records keep their log order, so
//! every seeded draw downstream is reproducible regardless of how the file
//! system enumerates directories.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::constants::*;
use crate::error::{BuildError, Result};
use crate::types::StimulusRecord;

/// Records of one family, keyed by sub-rule.
pub type FamilyPool = BTreeMap<String, Vec<StimulusRecord>>;

#[derive(Clone, Debug, Default)]
pub struct StimulusPool {
    families: BTreeMap<String, FamilyPool>,
}

impl StimulusPool {
    /// Index records in the order given.
    pub fn from_records(records: impl IntoIterator<Item = StimulusRecord>) -> Self {
        let mut families: BTreeMap<String, FamilyPool> = BTreeMap::new();
        for rec in records {
            families
                .entry(rec.family.clone())
                .or_default()
                .entry(rec.sub_rule.clone())
                .or_default()
                .push(rec);
        }
        Self { families }
    }

    /// Family names in sorted order.
    pub fn families(&self) -> Vec<String> {
        self.families.keys().cloned().collect()
    }

    pub fn family(&self, family: &str) -> Option<&FamilyPool> {
        self.families.get(family)
    }

    /// Records for one (family, sub_rule); empty if either is unknown.
    pub fn records(&self, family: &str, sub_rule: &str) -> &[StimulusRecord] {
        self.families
            .get(family)
            .and_then(|fp| fp.get(sub_rule))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FamilyPool)> {
        self.families.iter()
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.families
            .values()
            .flat_map(|fp| fp.values())
            .map(|v| v.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One line of a sub-rule's metadata log. Unknown fields are ignored.
#[derive(Deserialize)]
struct MetadataLine {
    id: Option<String>,
    rule: Option<String>,
    family: Option<String>,
    seed: Option<serde_json::Value>,
}

/// Seed of a metadata record. Seeds are written as unsigned integers; any
/// other non-null value is reported and dropped.
pub fn parse_seed(raw: Option<&serde_json::Value>, id: &str) -> Option<u64> {
    let value = raw.filter(|v| !v.is_null())?;
    let seed = value.as_u64();
    if seed.is_none() {
        warn!("{}: seed {} is not an unsigned integer, dropping it", id, value);
    }
    seed
}

/// Family for a record: explicit field, else the sub-rule prefix, else
/// [`UNKNOWN_FAMILY`].
pub fn derive_family(explicit: Option<&str>, sub_rule: &str) -> String {
    if let Some(f) = explicit.filter(|f| !f.is_empty()) {
        return f.to_string();
    }
    let prefix = sub_rule.split(FAMILY_SEPARATOR).next().unwrap_or("");
    if prefix.is_empty() {
        UNKNOWN_FAMILY.to_string()
    } else {
        prefix.to_string()
    }
}

/// Scan `root/<rule_dir>/stimuli.jsonl` logs and index every record whose
/// combined image exists.
///
/// Fails if the root (or a metadata log) cannot be read, or a log line is not
/// JSON. Records without `id`/`rule`, or whose image is missing, are skipped.
pub fn collect_pool(root: &Path) -> Result<StimulusPool> {
    let root = fs::canonicalize(root).map_err(|e| BuildError::fs(root, e))?;
    let read_dir = fs::read_dir(&root).map_err(|e| BuildError::fs(&root, e))?;

    let mut rule_dirs: Vec<PathBuf> = read_dir
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_dir())
        .collect();
    rule_dirs.sort();

    let mut records: Vec<StimulusRecord> = Vec::new();
    let mut skipped = 0usize;

    for rule_dir in &rule_dirs {
        let log_path = rule_dir.join(METADATA_LOG);
        if !log_path.exists() {
            continue;
        }
        let text = fs::read_to_string(&log_path).map_err(|e| BuildError::fs(&log_path, e))?;

        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let meta: MetadataLine =
                serde_json::from_str(line).map_err(|source| BuildError::Metadata {
                    path: log_path.clone(),
                    line: i + 1,
                    source,
                })?;

            let (id, sub_rule) = match (meta.id, meta.rule) {
                (Some(id), Some(rule)) if !id.is_empty() && !rule.is_empty() => (id, rule),
                _ => {
                    warn!("{}:{}: record without id or rule, skipping", log_path.display(), i + 1);
                    skipped += 1;
                    continue;
                }
            };

            let combined_path = rule_dir.join(format!("{}{}", id, COMBINED_SUFFIX));
            if !combined_path.is_file() {
                debug!("no combined image for {}, skipping", id);
                skipped += 1;
                continue;
            }

            let family = derive_family(meta.family.as_deref(), &sub_rule);
            let seed = parse_seed(meta.seed.as_ref(), &id);
            records.push(StimulusRecord {
                id,
                family,
                sub_rule,
                seed,
                combined_path,
            });
        }
    }

    let pool = StimulusPool::from_records(records);
    info!(
        "pool: {} stimuli in {} families from {} ({} records skipped)",
        pool.len(),
        pool.families.len(),
        root.display(),
        skipped
    );
    Ok(pool)
}
