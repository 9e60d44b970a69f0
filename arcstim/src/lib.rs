//! # arcstim — session builder for ARC-style same/different experiments
//!
//! Draws pairs of rule stimuli from a generated corpus into a
//! block/phase/trial hierarchy and labels every decision trial `same` or
//! `different` relative to an evolving (or fixed) rule context.
//!
//! ## Pipeline
//!
//! | Stage | Module | Description |
//! |-------|--------|-------------|
//! | 1 | [`pool`] | Index `<root>/<rule>/stimuli.jsonl` records by family and sub-rule |
//! | 2 | [`sampling::pair`] | Draw two unused records from one sub-rule |
//! | 2 | [`sampling::context`] | Choose a (family, sub_rule) with a pair left |
//! | 3 | [`phase`] | phase_start exposures and labelled decision phases |
//! | 4 | [`block`] | phase_start + inference, phase_start + application |
//! | 5 | [`session`] | Family blocks then mix blocks, serialised to JSON |
//!
//! [`practice`] builds the simpler example/trial practice manifest from the
//! same pool, and [`corpus`] with [`grid`] writes corpora in the layout
//! [`pool`] reads.
//!
//! ## Determinism
//!
//! One `SmallRng`, seeded once per run, is passed by `&mut` through every
//! draw. Pool iteration order is sorted, so a fixed seed, corpus and
//! configuration always yield a byte-identical document.
//!
//! ## Ground truth
//!
//! - **inference** (`swap_context = true`): a trial is `same` iff its context
//!   equals the previous trial's (the phase_start's for the first trial).
//! - **application** (`swap_context = false`): a trial is `same` iff its
//!   context equals the memorized phase_start context.
//!
//! A `same` attempt on an exhausted context silently becomes `different`.

pub mod block;
pub mod constants;
pub mod corpus;
pub mod display;
pub mod env_config;
pub mod error;
pub mod grid;
pub mod paths;
pub mod phase;
pub mod pool;
pub mod practice;
pub mod sampling;
pub mod session;
pub mod types;

pub use error::{BuildError, Result};
