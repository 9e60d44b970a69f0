//! End-to-end session, manifest and practice runs against on-disk corpora.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tempfile::TempDir;

use arcstim::constants::*;
use arcstim::error::BuildError;
use arcstim::practice::{run_practice, PracticeConfig};
use arcstim::session::{build_session, prepare_output, run_session, SessionConfig};
use arcstim::types::FmriConfig;

/// Write `n` records (and their images) for each sub-rule under `root`.
fn write_corpus(root: &Path, sub_rules: &[(&str, usize)]) {
    for &(sub_rule, n) in sub_rules {
        let dir = root.join(sub_rule);
        fs::create_dir_all(&dir).unwrap();
        let mut log = File::create(dir.join(METADATA_LOG)).unwrap();
        for i in 1..=n {
            let id = format!("{sub_rule}.t{i}");
            let line = serde_json::json!({
                "id": id,
                "rule": sub_rule,
                "seed": 1000 + i,
                "params": {},
            });
            writeln!(log, "{}", line).unwrap();
            File::create(dir.join(format!("{id}{COMBINED_SUFFIX}"))).unwrap();
        }
    }
}

fn session_config(tmp: &TempDir, n_family: usize, n_mix: usize, n_decisions: usize, seed: u64) -> SessionConfig {
    let mut cfg = SessionConfig {
        corpus_root: tmp.path().join("out"),
        participant: "p042".to_string(),
        output: tmp.path().join("sessions").join("p042.json"),
        seed: Some(seed),
        n_family_blocks: n_family,
        n_mix_blocks: n_mix,
        ..SessionConfig::default()
    };
    cfg.block.n_decisions_per_phase = n_decisions;
    cfg
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Structural check of a written session document.
fn assert_session_schema(doc: &Value, n_decisions: usize) {
    assert!(doc["participant"].is_string());
    assert!(doc["keys"]["same"].is_string());
    assert!(doc["keys"]["different"].is_string());

    for (i, block) in doc["blocks"].as_array().unwrap().iter().enumerate() {
        assert_eq!(block["block_id"], i as u64 + 1);
        assert!(block["family"].is_string());
        let phases = block["phases"].as_array().unwrap();
        let names: Vec<&str> = phases.iter().map(|p| p["phase"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["phase_start", "inference", "phase_start", "application"]);

        for phase in phases {
            for key in ["bg", "hint", "tip"] {
                assert!(phase[key].is_string(), "missing {key}");
            }
            let (trials, decision) = if phase["phase"] == "phase_start" {
                assert!(phase.get("trials").is_none());
                (phase["trial"].as_array().unwrap(), false)
            } else {
                assert!(phase.get("trial").is_none());
                (phase["trials"].as_array().unwrap(), true)
            };
            assert_eq!(trials.len(), if decision { n_decisions } else { 1 });

            for t in trials {
                assert_eq!(t["imgs"].as_array().unwrap().len(), 2);
                assert_eq!(t["ids"].as_array().unwrap().len(), 2);
                assert_eq!(t["seeds"].as_array().unwrap().len(), 2);
                assert!(t["family"].is_string() && t["sub_rule"].is_string());
                if decision {
                    let c = t["correct"].as_str().unwrap();
                    assert!(c == "same" || c == "different");
                } else {
                    assert!(t.get("correct").is_none());
                }
            }
        }
    }
}

#[test]
fn test_end_to_end_session() {
    let tmp = TempDir::new().unwrap();
    write_corpus(
        &tmp.path().join("out"),
        &[
            ("expansion.star_full", 20),
            ("expansion.star_cross", 20),
            ("attraction.gravity", 20),
            ("attraction.magnet", 20),
        ],
    );
    let cfg = session_config(&tmp, 2, 1, 3, 42);
    let (doc, path) = run_session(&cfg).unwrap();

    assert_eq!(doc.blocks.len(), 3);
    assert_eq!(doc.blocks.iter().map(|b| b.block_id).collect::<Vec<_>>(), vec![1, 2, 3]);
    let families: HashSet<&str> = doc.blocks[..2].iter().map(|b| b.family.as_str()).collect();
    assert_eq!(families, HashSet::from(["expansion", "attraction"]));
    assert!(doc.blocks[2].is_mix());

    let json = read_json(&path);
    assert!(json.get("fmri").is_none());
    assert_session_schema(&json, 3);

    // Images are relative to the document's directory.
    let img = json["blocks"][0]["phases"][0]["trial"][0]["imgs"][0].as_str().unwrap();
    assert!(img.starts_with("../out/"), "{img}");
    assert!(img.ends_with(COMBINED_SUFFIX));
    assert!(path.parent().unwrap().join(img).is_file());
}

#[test]
fn test_single_subrule_families_degrade_without_errors() {
    // One sub-rule of 10 per family cannot fill a restricted block (8 pairs are
    // needed and no in-family "different" context exists), so only the mix
    // block can survive.
    let tmp = TempDir::new().unwrap();
    write_corpus(
        &tmp.path().join("out"),
        &[("expansion.star_full", 10), ("attraction.gravity", 10)],
    );
    let cfg = session_config(&tmp, 2, 1, 3, 42);
    let (doc, path) = run_session(&cfg).unwrap();

    assert!(doc.blocks.len() <= 3);
    assert!(doc.blocks.iter().all(|b| b.is_mix()));
    let ids: Vec<u32> = doc.blocks.iter().map(|b| b.block_id).collect();
    assert_eq!(ids, (1..=doc.blocks.len() as u32).collect::<Vec<_>>());
    assert_session_schema(&read_json(&path), 3);
}

#[test]
fn test_skip_on_exhaustion() {
    let tmp = TempDir::new().unwrap();
    write_corpus(&tmp.path().join("out"), &[("color.swap", 3)]);
    let cfg = session_config(&tmp, 5, 0, 2, 1);
    let (doc, _) = run_session(&cfg).unwrap();
    assert!(doc.blocks.len() <= 1);
}

#[test]
fn test_same_seed_is_byte_identical() {
    let tmp = TempDir::new().unwrap();
    write_corpus(
        &tmp.path().join("out"),
        &[("color.swap", 30), ("color.shift", 30), ("gravity.down", 30), ("gravity.up", 30)],
    );
    let cfg = session_config(&tmp, 2, 2, 4, 9);
    let (_, path) = run_session(&cfg).unwrap();
    let first = fs::read(&path).unwrap();
    let (_, path) = run_session(&cfg).unwrap();
    assert_eq!(first, fs::read(&path).unwrap());

    let other = SessionConfig {
        seed: Some(10),
        ..cfg.clone()
    };
    let (_, path) = run_session(&other).unwrap();
    assert_ne!(first, fs::read(&path).unwrap());
}

#[test]
fn test_participant_seed_is_stable() {
    let tmp = TempDir::new().unwrap();
    write_corpus(&tmp.path().join("out"), &[("color.swap", 30), ("color.shift", 30)]);
    let mut cfg = session_config(&tmp, 1, 1, 2, 0);
    cfg.seed = None;
    let (base_dir, _) = prepare_output(&cfg.output).unwrap();
    let a = build_session(&cfg, &base_dir).unwrap();
    let b = build_session(&cfg, &base_dir).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_no_stimulus_reused_within_block() {
    let tmp = TempDir::new().unwrap();
    write_corpus(
        &tmp.path().join("out"),
        &[("color.swap", 20), ("color.shift", 20), ("gravity.down", 20)],
    );
    let cfg = session_config(&tmp, 2, 2, 4, 5);
    let (doc, _) = run_session(&cfg).unwrap();
    assert!(!doc.blocks.is_empty());
    for block in &doc.blocks {
        let mut seen = HashSet::new();
        for id in block.trials().flat_map(|t| t.ids.iter()) {
            assert!(seen.insert(id.clone()), "{id} reused in block {}", block.block_id);
        }
    }
}

#[test]
fn test_missing_corpus_root_is_file_system_error() {
    let tmp = TempDir::new().unwrap();
    let cfg = session_config(&tmp, 1, 1, 2, 1);
    match run_session(&cfg) {
        Err(BuildError::FileSystem { path, .. }) => assert!(path.ends_with("out")),
        other => panic!("expected FileSystem error, got {other:?}"),
    }
}

#[test]
fn test_malformed_metadata_line_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    write_corpus(&out, &[("color.swap", 4)]);
    let mut log = fs::OpenOptions::new()
        .append(true)
        .open(out.join("color.swap").join(METADATA_LOG))
        .unwrap();
    writeln!(log, "{{not json").unwrap();

    let cfg = session_config(&tmp, 1, 0, 1, 1);
    match run_session(&cfg) {
        Err(BuildError::Metadata { line, .. }) => assert_eq!(line, 5),
        other => panic!("expected Metadata error, got {other:?}"),
    }
}

#[test]
fn test_manifest_carries_fmri_and_trigger_paced_starts() {
    let tmp = TempDir::new().unwrap();
    write_corpus(
        &tmp.path().join("out"),
        &[("color.swap", 20), ("color.shift", 20)],
    );
    let fmri = FmriConfig {
        use_scanner: true,
        disdaq: 6,
        ..FmriConfig::default()
    };
    let mut cfg = SessionConfig {
        corpus_root: tmp.path().join("out"),
        output: tmp.path().join("manifests").join("p001_run1.json"),
        ..SessionConfig::manifest(fmri)
    };
    cfg.n_family_blocks = 1;
    cfg.n_mix_blocks = 0;
    cfg.block.n_decisions_per_phase = 3;

    let (_, path) = run_session(&cfg).unwrap();
    let json = read_json(&path);
    assert_eq!(json["fmri"]["use"], true);
    assert_eq!(json["fmri"]["trigger_key"], DEFAULT_TRIGGER_KEY);
    assert_eq!(json["fmri"]["disdaq"], 6);
    assert_session_schema(&json, 3);

    let phases = json["blocks"][0]["phases"].as_array().unwrap();
    assert_eq!(phases[0]["tip"], "");
    assert_eq!(phases[2]["tip"], "");
    assert!(phases[1]["tip"].as_str().unwrap().contains("Same"));
}

#[test]
fn test_practice_manifest() {
    let tmp = TempDir::new().unwrap();
    write_corpus(
        &tmp.path().join("out"),
        &[("color.swap", 10), ("color.shift", 10), ("arith.add", 2)],
    );
    let cfg = PracticeConfig {
        corpus_root: tmp.path().join("out"),
        output: tmp.path().join("practice").join("p001.json"),
        ..PracticeConfig::default()
    };
    let (manifest, path) = run_practice(&cfg).unwrap();
    assert_eq!(manifest.blocks.len(), 1);
    assert_eq!(manifest.blocks[0].family, "color");

    let json = read_json(&path);
    let phase = &json["blocks"][0]["phases"][0];
    assert_eq!(phase["phase"], PRACTICE_PHASE_NAME);
    assert_eq!(phase["example_images"].as_array().unwrap().len(), PRACTICE_EXAMPLES_PER_BLOCK);
    assert_eq!(phase["trials"].as_array().unwrap().len(), PRACTICE_TRIALS_PER_BLOCK.min(18));
    assert!(json["fmri"]["use"].is_boolean());
}
