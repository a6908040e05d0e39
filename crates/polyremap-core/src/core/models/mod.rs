//! # Core Models Module
//!
//! Data structures describing the molecular systems that flow between pipeline stages.
//!
//! - [`atom`] - Atom with name, force-field type, partial charge, coordinates and residue
//! - [`topology`] - Bonds and MOL2 bond orders
//! - [`system`] - Ordered atom/bond collection produced by a single stage
//! - [`cell`] - Periodic cell geometry recovered from the builder

pub mod atom;
pub mod cell;
pub mod system;
pub mod topology;
