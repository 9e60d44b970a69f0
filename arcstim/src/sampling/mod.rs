//! Sampling primitives shared by every phase builder.
//!
//! - [`pair`]: draw two unused records from one sub-rule, consuming them
//! - [`context`]: choose a (family, sub_rule) that still has a pair left
//!
//! All randomness comes from the caller's `SmallRng`; the [`UsedSet`] scopes
//! consumption to one block.

pub mod context;
pub mod pair;

use std::collections::HashSet;

pub use context::{candidate_contexts, pick_any, pick_subrule, ContextQuery};
pub use pair::{available_pairs, pick_pair};

/// Stimulus ids consumed so far within one block.
#[derive(Clone, Debug, Default)]
pub struct UsedSet {
    ids: HashSet<String>,
}

impl UsedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Mark `id` consumed. Returns false if it already was.
    pub fn insert(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
