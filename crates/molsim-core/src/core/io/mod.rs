//! Provides input/output functionality for molecular structure files.
//!
//! A trait-based interface ([`traits::StructureFile`]) is implemented by the legacy PDB
//! reader/writer in [`pdb`], which can also write trajectories as multi-model files.
//! [`resolve`] validates PDB identifiers and turns downloaded entries into molecules.

pub mod pdb;
pub mod resolve;
pub mod traits;
