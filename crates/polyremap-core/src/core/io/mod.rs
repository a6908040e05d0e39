//! Provides input/output functionality for the file formats the pipeline touches.
//!
//! Structure formats exchanged with external tools (MOL2, PSF) implement the
//! trait-based interface in [`traits`]. The remaining modules cover the narrower
//! contracts: the builder's periodic cell record ([`pdb`]), its compressed output
//! ([`compress`]), the assembler's parameterized topology ([`amber`]) and the final
//! simulation data file ([`lammps`]).

pub mod amber;
pub mod compress;
pub mod lammps;
pub mod mol2;
pub mod pdb;
pub mod psf;
pub mod traits;
