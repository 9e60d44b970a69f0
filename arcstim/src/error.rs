//! Error taxonomy for pool loading, sampling and document output.
//!
//! Sampling errors ([`BuildError::InsufficientStimuli`], [`BuildError::NoCandidate`])
//! are recovered at block granularity by the session assembler. Everything else
//! aborts the run.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Context;

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("not enough unused stimuli for a pair in {family}/{sub_rule} ({remaining} left)")]
    InsufficientStimuli {
        family: String,
        sub_rule: String,
        remaining: usize,
    },
    #[error("no (family, sub_rule) has a remaining pair (restrict={restrict_family:?}, avoid={avoid:?})")]
    NoCandidate {
        restrict_family: Option<String>,
        avoid: Option<Context>,
    },
    #[error("file system error at `{}`: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid metadata record in `{}` at line {line}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    #[error("failed to encode document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BuildError {
    /// True for the capacity errors a block builder may hit; these abandon a
    /// block but never the run.
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            BuildError::InsufficientStimuli { .. } | BuildError::NoCandidate { .. }
        )
    }

    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::FileSystem {
            path: path.into(),
            source,
        }
    }
}
