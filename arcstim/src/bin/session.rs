//! Build a behavioural session JSON from a stimulus corpus.
//!
//! Usage:
//!   arcstim-session --root out --participant p001 --out sessions/p001.json
//!   arcstim-session --config session.json --seed 7

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use arcstim::env_config;
use arcstim::session::{run_session, SessionConfig};

#[derive(Parser, Debug)]
#[command(name = "arcstim-session", version, about = "Build a same/different session document")]
struct Args {
    /// JSON file with any subset of the session configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Corpus root holding one directory per sub-rule
    #[arg(long)]
    root: Option<PathBuf>,

    #[arg(long)]
    participant: Option<String>,

    /// Output document path
    #[arg(long)]
    out: Option<PathBuf>,

    /// Rng seed; derived from the participant id with --participant-seed
    #[arg(long, conflicts_with = "participant_seed")]
    seed: Option<u64>,

    #[arg(long)]
    participant_seed: bool,

    #[arg(long)]
    family_blocks: Option<usize>,

    #[arg(long)]
    mix_blocks: Option<usize>,

    /// Decision trials per inference/application phase
    #[arg(long)]
    decisions: Option<usize>,

    #[arg(long)]
    p_same_inference: Option<f64>,

    #[arg(long)]
    p_same_application: Option<f64>,

    #[arg(long)]
    key_same: Option<String>,

    #[arg(long)]
    key_different: Option<String>,
}

fn load_config(args: &Args) -> Result<SessionConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let path = env_config::resolve(path);
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SessionConfig::default(),
    };

    if let Some(root) = &args.root {
        cfg.corpus_root = root.clone();
    }
    if let Some(p) = &args.participant {
        cfg.participant = p.clone();
    }
    if let Some(out) = &args.out {
        cfg.output = out.clone();
    }
    if args.participant_seed {
        cfg.seed = None;
    } else if let Some(seed) = args.seed {
        cfg.seed = Some(seed);
    }
    if let Some(n) = args.family_blocks {
        cfg.n_family_blocks = n;
    }
    if let Some(n) = args.mix_blocks {
        cfg.n_mix_blocks = n;
    }
    if let Some(n) = args.decisions {
        cfg.block.n_decisions_per_phase = n;
    }
    if let Some(p) = args.p_same_inference {
        cfg.block.p_same_inference = p;
    }
    if let Some(p) = args.p_same_application {
        cfg.block.p_same_application = p;
    }
    if let Some(k) = &args.key_same {
        cfg.keys.same = k.clone();
    }
    if let Some(k) = &args.key_different {
        cfg.keys.different = k.clone();
    }

    cfg.corpus_root = env_config::resolve(&cfg.corpus_root);
    cfg.output = env_config::resolve(&cfg.output);
    Ok(cfg)
}

fn main() -> Result<()> {
    env_config::init_tracing();
    let args = Args::parse();
    let cfg = load_config(&args)?;
    run_session(&cfg).context("building session")?;
    Ok(())
}
