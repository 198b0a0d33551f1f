//! # Force Field Module
//!
//! Energy models: the capability that turns a geometry into a potential energy and a force
//! on every atom.
//!
//! ## Overview
//!
//! An energy model is attached to a molecule, bound once to its topology, and then queried
//! by an integrator at every step. Models work on raw positions in Å and report energies in
//! kcal/mol and forces in kcal/mol/Å; the [`model::EnergyEvaluation`] accessors attach
//! those units for callers outside the numeric kernels.
//!
//! ## Key Components
//!
//! - [`model`] - The [`EnergyModel`] trait, evaluation results and errors
//! - [`harmonic`] - Harmonic springs, either tethering atoms to an anchor or along bonds
//!
//! ## Usage
//!
//! ```ignore
//! use molsim::core::forcefield::harmonic::HarmonicOscillator;
//!
//! let k = "1.0 kcal/mol/angstrom^2".parse()?;
//! molecule.set_energy_model(HarmonicOscillator::new(&k)?)?;
//! let energy = molecule.calculate_energy()?;
//! ```

pub mod harmonic;
pub mod model;
pub(crate) mod potentials;

pub use model::{EnergyEvaluation, EnergyModel, ForcefieldError};
