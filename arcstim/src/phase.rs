//! Phase builders: single-trial exposure phases and scored same/different
//! decision phases.
//!
//! A decision phase carries a current context. Each trial either reuses it
//! (`same`) or draws any other context with capacity (`different`). With
//! `swap_context` the drawn context becomes the current one for the next trial
//! (inference); without it the entry context is held for the whole phase
//! (application).

use std::path::Path;

use rand::rngs::SmallRng;
use rand::Rng;
use tracing::debug;

use crate::error::Result;
use crate::paths::relative_to;
use crate::pool::StimulusPool;
use crate::sampling::{available_pairs, pick_any, pick_pair, ContextQuery, UsedSet};
use crate::types::{Context, Correctness, Phase, PhaseKind, StimulusRecord, Trial};

/// What the sampler may draw from, and where the document will live.
#[derive(Clone, Copy, Debug)]
pub struct SamplingScope<'a> {
    pub pool: &'a StimulusPool,
    /// Directory of the output document; trial image paths are relative to it.
    pub base_dir: &'a Path,
    /// `Some(family)` for family blocks, `None` for mix blocks.
    pub restrict_family: Option<&'a str>,
}

/// Background colour, hint and key tip shown during a phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseText {
    pub bg: String,
    pub hint: String,
    pub tip: String,
}

/// Parameters for one decision phase.
#[derive(Clone, Debug)]
pub struct DecisionPhaseSpec {
    pub kind: PhaseKind,
    pub n_trials: usize,
    /// Probability of attempting a `same` trial.
    pub p_same: f64,
    pub text: PhaseText,
    /// Context at phase entry.
    pub context: Context,
    pub swap_context: bool,
}

pub fn trial_entry(
    context: &Context,
    pair: (&StimulusRecord, &StimulusRecord),
    base_dir: &Path,
    correct: Option<Correctness>,
) -> Trial {
    let (first, second) = pair;
    Trial {
        imgs: [
            relative_to(&first.combined_path, base_dir),
            relative_to(&second.combined_path, base_dir),
        ],
        family: context.family.clone(),
        sub_rule: context.sub_rule.clone(),
        ids: [first.id.clone(), second.id.clone()],
        seeds: [first.seed, second.seed],
        correct,
    }
}

/// One unscored trial from `context`, establishing it before a decision phase.
pub fn make_phase_start(
    scope: &SamplingScope,
    context: &Context,
    text: PhaseText,
    used: &mut UsedSet,
    rng: &mut SmallRng,
) -> Result<Phase> {
    let pair = pick_pair(scope.pool, context, used, rng)?;
    Ok(Phase {
        kind: PhaseKind::PhaseStart,
        bg: text.bg,
        hint: text.hint,
        tip: text.tip,
        trials: vec![trial_entry(context, pair, scope.base_dir, None)],
    })
}

/// Build `spec.n_trials` labelled trials and return the phase with the context
/// in effect at its end.
///
/// A `same` attempt on an exhausted (or out-of-family) current context is
/// relabelled `different` instead of failing, so the realised same ratio
/// drifts below `p_same` as pools run low.
pub fn make_decision_phase(
    scope: &SamplingScope,
    spec: DecisionPhaseSpec,
    used: &mut UsedSet,
    rng: &mut SmallRng,
) -> Result<(Phase, Context)> {
    let mut current = spec.context;
    let mut trials = Vec::with_capacity(spec.n_trials);

    for _ in 0..spec.n_trials {
        let want_same = rng.random::<f64>() < spec.p_same;

        let (resolved, correct) = if want_same && can_repeat(scope, &current, used) {
            (current.clone(), Correctness::Same)
        } else {
            if want_same {
                debug!("{}: {} exhausted, drawing a different context", spec.kind.as_str(), current);
            }
            let query = ContextQuery::within(scope.restrict_family).avoiding(&current);
            (pick_any(scope.pool, used, &query, rng)?, Correctness::Different)
        };

        let pair = pick_pair(scope.pool, &resolved, used, rng)?;
        trials.push(trial_entry(&resolved, pair, scope.base_dir, Some(correct)));

        if spec.swap_context {
            current = resolved;
        }
    }

    let phase = Phase {
        kind: spec.kind,
        bg: spec.text.bg,
        hint: spec.text.hint,
        tip: spec.text.tip,
        trials,
    };
    Ok((phase, current))
}

fn can_repeat(scope: &SamplingScope, current: &Context, used: &UsedSet) -> bool {
    let in_family = scope
        .restrict_family
        .map_or(true, |f| f == current.family);
    in_family && available_pairs(scope.pool.records(&current.family, &current.sub_rule), used) >= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use rand::SeedableRng;
    use std::path::PathBuf;

    fn pool(groups: &[(&str, &str, usize)]) -> StimulusPool {
        let mut recs = Vec::new();
        for &(family, sub_rule, n) in groups {
            for i in 1..=n {
                recs.push(StimulusRecord {
                    id: format!("{sub_rule}.t{i}"),
                    family: family.into(),
                    sub_rule: sub_rule.into(),
                    seed: Some(i as u64),
                    combined_path: PathBuf::from(format!("/exp/out/{sub_rule}/{sub_rule}.t{i}.combined.png")),
                });
            }
        }
        StimulusPool::from_records(recs)
    }

    fn text() -> PhaseText {
        PhaseText {
            bg: "green".into(),
            hint: "Previous rule".into(),
            tip: "tip".into(),
        }
    }

    fn decision(context: Context, n: usize, p_same: f64, swap: bool) -> DecisionPhaseSpec {
        DecisionPhaseSpec {
            kind: if swap { PhaseKind::Inference } else { PhaseKind::Application },
            n_trials: n,
            p_same,
            text: text(),
            context,
            swap_context: swap,
        }
    }

    #[test]
    fn test_phase_start_paths_are_relative() {
        let pool = pool(&[("a", "a.x", 4)]);
        let scope = SamplingScope {
            pool: &pool,
            base_dir: Path::new("/exp"),
            restrict_family: None,
        };
        let mut used = UsedSet::new();
        let mut rng = SmallRng::seed_from_u64(0);
        let phase = make_phase_start(&scope, &Context::new("a", "a.x"), text(), &mut used, &mut rng).unwrap();
        assert_eq!(phase.kind, PhaseKind::PhaseStart);
        assert_eq!(phase.trials.len(), 1);
        let t = &phase.trials[0];
        assert!(t.correct.is_none());
        assert!(t.imgs[0].starts_with("out/a.x/"), "{}", t.imgs[0]);
        assert_eq!(used.len(), 2);
    }

    #[test]
    fn test_fixed_context_labels() {
        let pool = pool(&[("a", "a.x", 20), ("a", "a.y", 20), ("b", "b.z", 20)]);
        let scope = SamplingScope {
            pool: &pool,
            base_dir: Path::new("/exp"),
            restrict_family: None,
        };
        let entry = Context::new("a", "a.x");
        let mut used = UsedSet::new();
        let mut rng = SmallRng::seed_from_u64(17);
        let (phase, end) =
            make_decision_phase(&scope, decision(entry.clone(), 12, 0.5, false), &mut used, &mut rng).unwrap();
        assert_eq!(end, entry);
        assert_eq!(phase.trials.len(), 12);
        for t in &phase.trials {
            let same = t.context() == entry;
            assert_eq!(t.correct, Some(if same { Correctness::Same } else { Correctness::Different }));
        }
    }

    #[test]
    fn test_evolving_context_labels() {
        let pool = pool(&[("a", "a.x", 20), ("a", "a.y", 20), ("b", "b.z", 20)]);
        let scope = SamplingScope {
            pool: &pool,
            base_dir: Path::new("/exp"),
            restrict_family: None,
        };
        let entry = Context::new("b", "b.z");
        let mut used = UsedSet::new();
        let mut rng = SmallRng::seed_from_u64(99);
        let (phase, end) =
            make_decision_phase(&scope, decision(entry.clone(), 10, 0.5, true), &mut used, &mut rng).unwrap();

        let mut prev = entry;
        for t in &phase.trials {
            let expected = if t.context() == prev { Correctness::Same } else { Correctness::Different };
            assert_eq!(t.correct, Some(expected));
            prev = t.context();
        }
        assert_eq!(end, prev);
    }

    #[test]
    fn test_exhausted_same_falls_back_to_different() {
        let pool = pool(&[("a", "a.x", 2), ("a", "a.y", 4)]);
        let scope = SamplingScope {
            pool: &pool,
            base_dir: Path::new("/exp"),
            restrict_family: Some("a"),
        };
        let mut used = UsedSet::new();
        used.insert("a.x.t1");
        used.insert("a.x.t2");
        let mut rng = SmallRng::seed_from_u64(5);

        let (phase, _) =
            make_decision_phase(&scope, decision(Context::new("a", "a.x"), 1, 1.0, false), &mut used, &mut rng)
                .unwrap();
        let t = &phase.trials[0];
        assert_eq!(t.correct, Some(Correctness::Different));
        assert_eq!(t.sub_rule, "a.y");
    }

    #[test]
    fn test_out_of_family_context_never_repeats() {
        let pool = pool(&[("a", "a.x", 10), ("b", "b.z", 10)]);
        let scope = SamplingScope {
            pool: &pool,
            base_dir: Path::new("/exp"),
            restrict_family: Some("a"),
        };
        let mut used = UsedSet::new();
        let mut rng = SmallRng::seed_from_u64(5);
        let (phase, _) =
            make_decision_phase(&scope, decision(Context::new("b", "b.z"), 3, 1.0, false), &mut used, &mut rng)
                .unwrap();
        for t in &phase.trials {
            assert_eq!(t.family, "a");
            assert_eq!(t.correct, Some(Correctness::Different));
        }
    }

    #[test]
    fn test_no_other_context_is_an_error() {
        let pool = pool(&[("a", "a.x", 4)]);
        let scope = SamplingScope {
            pool: &pool,
            base_dir: Path::new("/exp"),
            restrict_family: None,
        };
        let mut used = UsedSet::new();
        let mut rng = SmallRng::seed_from_u64(5);
        let err = make_decision_phase(&scope, decision(Context::new("a", "a.x"), 1, 0.0, false), &mut used, &mut rng)
            .unwrap_err();
        assert!(matches!(err, BuildError::NoCandidate { .. }));
    }

    #[test]
    fn test_zero_trials() {
        let pool = pool(&[("a", "a.x", 4)]);
        let scope = SamplingScope {
            pool: &pool,
            base_dir: Path::new("/exp"),
            restrict_family: None,
        };
        let mut used = UsedSet::new();
        let mut rng = SmallRng::seed_from_u64(5);
        let entry = Context::new("a", "a.x");
        let (phase, end) =
            make_decision_phase(&scope, decision(entry.clone(), 0, 0.5, true), &mut used, &mut rng).unwrap();
        assert!(phase.trials.is_empty());
        assert_eq!(end, entry);
        assert!(used.is_empty());
    }
}
