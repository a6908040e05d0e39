//! # Force Field Module
//!
//! Translation of atom types and partial charges between force fields.
//!
//! - [`mapping`] - The name-keyed [`mapping::AtomMapping`]: creation from a pair of
//!   differently typed representative chains, persistence, and application to full systems
//! - [`catalog`] - Static tables of the force fields the builder and the typing tool know

pub mod catalog;
pub mod mapping;
