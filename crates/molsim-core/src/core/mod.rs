//! # Core Module
//!
//! Fundamental building blocks of MolSim: physical units, the molecular data model, energy
//! models and structure file I/O.
//!
//! ## Architecture
//!
//! - **Physical Quantities** ([`units`]) - Dimensions, units and unit-bearing values
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, residues, chains and molecules
//! - **Energy Models** ([`forcefield`]) - The energy model capability and its implementations
//! - **File I/O** ([`io`]) - Structure readers/writers and structure identifiers
//!
//! Every numeric value crossing the public API is a [`units::Quantity`]; internally, numeric
//! kernels operate on raw `f64` values expressed in the canonical
//! [`units::system::UnitSystem::MOLECULAR`] unit system.

pub mod forcefield;
pub mod io;
pub mod models;
pub mod units;
