//! # stanblocks core
//!
//! Assembles Stan programs from reusable text fragments. A model is described
//! by four required fragments (`data`, `hyperparameters`, `parameters`,
//! `model`) and an optional `extra` fragment; the assembler writes two
//! programs from them:
//!
//! - a baseline model, with hyperparameters declared as data
//! - a sensitivity model, with hyperparameters moved into `parameters { }`
//!
//! Fragment content is never parsed or validated.

pub mod assembler;
pub mod document;
pub mod error;
pub mod fragment;

// Re-export key types at crate root for ergonomics
pub use assembler::{
    AssemblerOptions, AssemblyPlan, AssemblyReport, ModelAssembler, PlannedInput, PlannedOutput,
    WrittenDocument,
};
pub use document::{Document, Section, Variant};
pub use error::{Error, Result};
pub use fragment::{FragmentSet, FragmentSource, FsFragmentSource, InMemoryFragmentSource, Role};
