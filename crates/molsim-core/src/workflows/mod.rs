//! # Workflows Module
//!
//! End-to-end procedures built on the core model and the engine.
//!
//! ## Overview
//!
//! Workflows are the top-level entry points for library users. They take a molecule and a
//! [`crate::engine::config::SimulationConfig`], build and attach the configured energy
//! model and integrator, prepare initial conditions and run the integration, reporting
//! progress along the way.
//!
//! ## Architecture
//!
//! - **Single Simulation** ([`simulate`]) - Configure, attach and run one molecule
//! - **Replica Ensembles** ([`ensemble`]) - Independent copies of a template molecule, each
//!   with its own seeded initial velocities, integrated in parallel

pub mod ensemble;
pub mod simulate;
