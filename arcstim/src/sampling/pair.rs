//! Pair picker: two never-used records from one sub-rule.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::error::{BuildError, Result};
use crate::pool::StimulusPool;
use crate::sampling::UsedSet;
use crate::types::{Context, StimulusRecord};

/// Number of disjoint pairs still drawable from `records`.
pub fn available_pairs(records: &[StimulusRecord], used: &UsedSet) -> usize {
    records.iter().filter(|r| !used.contains(&r.id)).count() / 2
}

/// Shuffle the unused records of `context` and take the first two, marking
/// both consumed.
///
/// For a given rng state and used set the result is always the same pair.
pub fn pick_pair<'p>(
    pool: &'p StimulusPool,
    context: &Context,
    used: &mut UsedSet,
    rng: &mut SmallRng,
) -> Result<(&'p StimulusRecord, &'p StimulusRecord)> {
    let records = pool.records(&context.family, &context.sub_rule);
    let mut unused: Vec<&StimulusRecord> = records.iter().filter(|r| !used.contains(&r.id)).collect();
    if unused.len() < 2 {
        return Err(BuildError::InsufficientStimuli {
            family: context.family.clone(),
            sub_rule: context.sub_rule.clone(),
            remaining: unused.len(),
        });
    }

    unused.shuffle(rng);
    let (first, second) = (unused[0], unused[1]);
    used.insert(&first.id);
    used.insert(&second.id);
    Ok((first, second))
}
