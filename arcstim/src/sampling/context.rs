//! Context selector: one filter-then-choose over the pool.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::error::{BuildError, Result};
use crate::pool::StimulusPool;
use crate::sampling::pair::available_pairs;
use crate::sampling::UsedSet;
use crate::types::Context;

/// Which contexts qualify for a draw.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContextQuery<'a> {
    /// Only consider sub-rules of this family.
    pub restrict_family: Option<&'a str>,
    /// Never return this context.
    pub avoid: Option<&'a Context>,
}

impl<'a> ContextQuery<'a> {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn within(restrict_family: Option<&'a str>) -> Self {
        Self {
            restrict_family,
            avoid: None,
        }
    }

    pub fn avoiding(mut self, avoid: &'a Context) -> Self {
        self.avoid = Some(avoid);
        self
    }

    fn error(&self) -> BuildError {
        BuildError::NoCandidate {
            restrict_family: self.restrict_family.map(str::to_string),
            avoid: self.avoid.cloned(),
        }
    }
}

/// Every context matching `query` with at least one pair left, in pool order.
pub fn candidate_contexts(pool: &StimulusPool, used: &UsedSet, query: &ContextQuery) -> Vec<Context> {
    pool.iter()
        .filter(|(family, _)| query.restrict_family.map_or(true, |f| f == family.as_str()))
        .flat_map(move |(family, family_pool)| {
            family_pool
                .iter()
                .filter(move |(_, records)| available_pairs(records, used) >= 1)
                .map(move |(sub_rule, _)| Context::new(family.as_str(), sub_rule.as_str()))
        })
        .filter(|ctx| query.avoid != Some(ctx))
        .collect()
}

/// Uniformly random qualifying context across the pool.
pub fn pick_any(
    pool: &StimulusPool,
    used: &UsedSet,
    query: &ContextQuery,
    rng: &mut SmallRng,
) -> Result<Context> {
    let mut candidates = candidate_contexts(pool, used, query);
    if candidates.is_empty() {
        return Err(query.error());
    }
    let idx = rng.random_range(0..candidates.len());
    Ok(candidates.swap_remove(idx))
}

/// Uniformly random sub-rule of `family` with a pair left, other than `avoid`.
pub fn pick_subrule(
    pool: &StimulusPool,
    family: &str,
    used: &UsedSet,
    avoid: Option<&str>,
    rng: &mut SmallRng,
) -> Result<String> {
    let avoid_ctx = avoid.map(|sub_rule| Context::new(family, sub_rule));
    let query = ContextQuery {
        restrict_family: Some(family),
        avoid: avoid_ctx.as_ref(),
    };
    pick_any(pool, used, &query, rng).map(|ctx| ctx.sub_rule)
}
