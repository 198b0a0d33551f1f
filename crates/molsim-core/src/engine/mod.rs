//! # Engine Module
//!
//! Time integration of molecular systems: the numerical machinery that advances a molecule's
//! positions and velocities using forces from an attached energy model.
//!
//! ## Overview
//!
//! A simulation pairs an [`crate::core::forcefield::EnergyModel`] with an
//! [`integrators::Integrator`] on a molecule. `Molecule::run` hands the molecule to the
//! integrator, which steps the raw state, samples frames into a [`trajectory::Trajectory`]
//! and writes the final state back only once the run has succeeded.
//!
//! ## Architecture
//!
//! - **Integrators** ([`integrators`]) - The integrator capability and velocity Verlet
//! - **Trajectories** ([`trajectory`]) - Sampled frames and their analysis
//! - **Configuration** ([`config`]) - Simulation parameters and their builder
//! - **Initial Conditions** ([`velocities`]) - Maxwell-Boltzmann velocity assignment
//! - **Progress Monitoring** ([`progress`]) - Progress callbacks for long runs
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! The `Molecule` methods for attaching models and running live in `simulation`.

pub mod config;
pub mod error;
pub mod integrators;
pub mod progress;
mod simulation;
pub mod trajectory;
pub mod velocities;
