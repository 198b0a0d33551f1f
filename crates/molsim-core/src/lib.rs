//! # MolSim Core Library
//!
//! A molecular structure model with unit-checked physical quantities and a pluggable
//! molecular dynamics engine.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that each concern can be tested in
//! isolation and extended without touching the others.
//!
//! - **[`core`]: The Foundation.** The quantity system (`units`), the molecular object model
//!   (`Molecule`, `Chain`, `Residue`, `Atom`), energy models (`forcefield`) and structure I/O.
//!
//! - **[`engine`]: The Dynamics Core.** Integrators, trajectories, simulation configuration,
//!   progress reporting and the `Molecule::run` entry point that ties an energy model and an
//!   integrator together.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built on the two layers below, such
//!   as configuring and running a simulation or integrating an ensemble of independent
//!   replicas in parallel.

pub mod core;
pub mod engine;
pub mod workflows;
