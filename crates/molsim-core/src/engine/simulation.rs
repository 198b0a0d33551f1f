use super::error::EngineError;
use super::integrators::Integrator;
use super::progress::ProgressReporter;
use super::trajectory::Trajectory;
use crate::core::forcefield::{EnergyEvaluation, EnergyModel};
use crate::core::models::molecule::Molecule;
use std::sync::Arc;
use tracing::{info, instrument};

impl Molecule {
    /// Binds `model` to this molecule's current topology and geometry and attaches it.
    ///
    /// A model is immutable once attached; attach a new one after changing the topology.
    pub fn set_energy_model<M: EnergyModel + 'static>(&mut self, model: M) -> Result<(), EngineError> {
        self.set_boxed_energy_model(Box::new(model))
    }

    pub fn set_boxed_energy_model(&mut self, mut model: Box<dyn EnergyModel>) -> Result<(), EngineError> {
        model.bind(self)?;
        self.energy_model = Some(Arc::from(model));
        Ok(())
    }

    pub fn set_integrator<I: Integrator + 'static>(&mut self, integrator: I) {
        self.set_boxed_integrator(Box::new(integrator));
    }

    pub fn set_boxed_integrator(&mut self, integrator: Box<dyn Integrator>) {
        self.integrator = Some(Arc::from(integrator));
    }

    pub fn energy_model(&self) -> Option<&dyn EnergyModel> {
        self.energy_model.as_deref()
    }

    pub fn integrator(&self) -> Option<&dyn Integrator> {
        self.integrator.as_deref()
    }

    /// Evaluates the attached energy model at the current geometry.
    pub fn calculate_energy(&self) -> Result<EnergyEvaluation, EngineError> {
        let model = self.energy_model.as_ref().ok_or_else(|| EngineError::NoEnergyModel {
            molecule: self.name().to_string(),
        })?;
        Ok(model.evaluate(&self.raw_positions())?)
    }

    /// Advances the molecule by `n_steps` integration steps and returns the sampled frames.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoIntegrator`] or [`EngineError::NoEnergyModel`] when either is
    /// missing; otherwise whatever the integrator reports. The molecule is unchanged on error.
    pub fn run(&mut self, n_steps: usize) -> Result<Trajectory, EngineError> {
        self.run_with_progress(n_steps, &ProgressReporter::new())
    }

    #[instrument(skip_all, name = "molecule_run", fields(molecule = self.name(), n_steps = n_steps))]
    pub fn run_with_progress(
        &mut self,
        n_steps: usize,
        reporter: &ProgressReporter,
    ) -> Result<Trajectory, EngineError> {
        let integrator = self.integrator.clone().ok_or_else(|| EngineError::NoIntegrator {
            molecule: self.name().to_string(),
        })?;
        let model = self.energy_model.clone().ok_or_else(|| EngineError::NoEnergyModel {
            molecule: self.name().to_string(),
        })?;
        info!(
            integrator = integrator.name(),
            model = model.name(),
            "Running simulation."
        );
        integrator.run(self, model.as_ref(), n_steps, reporter)
    }
}
