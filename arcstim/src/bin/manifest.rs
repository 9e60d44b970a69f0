//! Build an fMRI manifest: a session document with scanner settings and
//! trigger-paced phase_start exposures.
//!
//! Usage:
//!   arcstim-manifest --root out --participant p001 --use-fmri --disdaq 4

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use arcstim::env_config;
use arcstim::session::{run_session, SessionConfig, SessionVariant};
use arcstim::types::FmriConfig;

#[derive(Parser, Debug)]
#[command(name = "arcstim-manifest", version, about = "Build an fMRI run manifest")]
struct Args {
    /// JSON file with any subset of the session configuration
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

    #[arg(long)]
    family_blocks: Option<usize>,

    #[arg(long)]
    mix_blocks: Option<usize>,

    #[arg(long)]
    decisions: Option<usize>,

    /// Mark the run as scanner-paced
    #[arg(long)]
    use_fmri: bool,

    /// Key the scanner sends on every volume
    #[arg(long)]
    trigger_key: Option<String>,

    /// Dummy scans to discard before the first stimulus
    #[arg(long)]
    disdaq: Option<u32>,
}

fn load_config(args: &Args) -> Result<SessionConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let path = env_config::resolve(path);
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SessionConfig::manifest_from_json(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SessionConfig::manifest(FmriConfig::default()),
    };

    let mut fmri = match &cfg.variant {
        SessionVariant::Manifest(f) => f.clone(),
        SessionVariant::Session => FmriConfig::default(),
    };
    if args.use_fmri {
        fmri.use_scanner = true;
    }
    if let Some(k) = &args.trigger_key {
        fmri.trigger_key = k.clone();
    }
    if let Some(n) = args.disdaq {
        fmri.disdaq = n;
    }
    cfg.variant = SessionVariant::Manifest(fmri);

    if let Some(root) = &args.root {
        cfg.corpus_root = root.clone();
    }
    if let Some(p) = &args.participant {
        cfg.participant = p.clone();
    }
    if let Some(out) = &args.out {
        cfg.output = out.clone();
    }
    if let Some(seed) = args.seed {
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

    cfg.corpus_root = env_config::resolve(&cfg.corpus_root);
    cfg.output = env_config::resolve(&cfg.output);
    Ok(cfg)
}

fn main() -> Result<()> {
    env_config::init_tracing();
    let args = Args::parse();
    let cfg = load_config(&args)?;
    run_session(&cfg).context("building manifest")?;
    Ok(())
}
