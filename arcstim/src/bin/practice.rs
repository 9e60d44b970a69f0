//! Build the practice manifest: example images plus unscored trials per family.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use arcstim::env_config;
use arcstim::practice::{run_practice, PracticeConfig};

#[derive(Parser, Debug)]
#[command(name = "arcstim-practice", version, about = "Build a practice manifest")]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    root: Option<PathBuf>,

    #[arg(long)]
    participant: Option<String>,

    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Example images shown before each block's trials
    #[arg(long)]
    examples: Option<usize>,

    #[arg(long)]
    trials: Option<usize>,

    #[arg(long)]
    use_fmri: bool,
}

fn main() -> Result<()> {
    env_config::init_tracing();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => {
            let path = env_config::resolve(path);
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<PracticeConfig>(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => PracticeConfig::default(),
    };
    if let Some(root) = args.root {
        cfg.corpus_root = root;
    }
    if let Some(p) = args.participant {
        cfg.participant = p;
    }
    if let Some(out) = args.out {
        cfg.output = out;
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(n) = args.examples {
        cfg.n_examples_per_block = n;
    }
    if let Some(n) = args.trials {
        cfg.n_trials_per_block = n;
    }
    if args.use_fmri {
        cfg.fmri.use_scanner = true;
    }
    cfg.corpus_root = env_config::resolve(&cfg.corpus_root);
    cfg.output = env_config::resolve(&cfg.output);

    run_practice(&cfg).context("building practice manifest")?;
    Ok(())
}
