//! # polyremap Core Library
//!
//! Preparation of simulation-ready polymer systems under a force field the structure
//! builder does not support natively.
//!
//! A small representative chain is built and typed twice, once by the builder's own force
//! field and once by an atom-typing tool for the target force field. The name-keyed
//! correspondence between the two is cached and then applied to a full-size system, which
//! is parameterized and written out as a LAMMPS data file with the builder's periodic cell.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Stateless data models (`MoleculeSystem`, `BoxMetadata`),
//!   the atom mapping and force-field catalog, and file codecs.
//!
//! - **[`engine`]: The Machinery.** Tool invocation behind the `ToolRunner` trait, per-tool
//!   wrappers, pipeline configuration, stage tracking and progress reporting.
//!
//! - **[`workflows`]: The Public API.** The `Pipeline` orchestrator tying the other layers
//!   together into mapping acquisition and system creation.

pub mod core;
pub mod engine;
pub mod workflows;
