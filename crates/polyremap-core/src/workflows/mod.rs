//! # Workflows Module
//!
//! High-level entry points that sequence the engine into complete procedures.
//!
//! - **Pipeline** ([`pipeline`]) - Mapping acquisition (build a representative chain, type
//!   it under the target force field, derive and cache the atom mapping) and system
//!   creation (build, convert, remap, assemble, correct the box, write the data file).
//!
//! Both flows report progress through [`crate::engine::progress::ProgressReporter`] and
//! fail with a [`crate::engine::error::WorkflowError`] naming the stage they reached.

pub mod pipeline;
