//! Numerical integrators that advance a molecule's positions and velocities in time.

pub mod verlet;

use super::error::EngineError;
use super::progress::ProgressReporter;
use super::trajectory::Trajectory;
use crate::core::forcefield::EnergyModel;
use crate::core::models::molecule::Molecule;
use crate::core::units::Quantity;
use std::fmt::Debug;

/// A time-stepping scheme.
///
/// An integrator is configuration only: it holds no per-run state, so one instance can be
/// shared between molecules and runs.
pub trait Integrator: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn timestep(&self) -> Quantity<f64>;

    /// A frame is recorded every `frame_interval` steps, in addition to the initial state.
    fn frame_interval(&self) -> usize;

    /// Advances `molecule` by `n_steps` steps under `model` and returns the sampled frames.
    ///
    /// On success the molecule holds the final state and its clock has advanced by
    /// `n_steps * timestep`. On failure the molecule is left unchanged.
    fn run(
        &self,
        molecule: &mut Molecule,
        model: &dyn EnergyModel,
        n_steps: usize,
        reporter: &ProgressReporter,
    ) -> Result<Trajectory, EngineError>;
}
