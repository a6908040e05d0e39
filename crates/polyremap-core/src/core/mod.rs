//! # Core Module
//!
//! Stateless building blocks of the remapping pipeline.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, periodic cells and systems
//! - **Force Fields** ([`forcefield`]) - Name-keyed atom mappings and the force-field catalog
//! - **File I/O** ([`io`]) - Codecs for the formats exchanged with external tools
//!
//! Nothing in this layer spawns processes or keeps state between calls; that is the
//! job of [`crate::engine`].

pub mod forcefield;
pub mod io;
pub mod models;
