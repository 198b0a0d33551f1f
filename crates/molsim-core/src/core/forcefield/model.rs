use crate::core::models::molecule::Molecule;
use crate::core::units::{Quantity, UnitError, UnitSystem};
use nalgebra::{MatrixXx3, Point3, Vector3};
use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForcefieldError {
    #[error(transparent)]
    Units(#[from] UnitError),

    #[error("Energy model expects {expected} atoms, got {found}")]
    AtomCountMismatch { expected: usize, found: usize },

    #[error("Energy model '{0}' has not been bound to a molecule")]
    NotBound(String),

    #[error("Energy model error: {0}")]
    Model(String),
}

/// Potential energy and per-atom forces for one geometry.
///
/// Raw values are in [`UnitSystem::MOLECULAR`] units: kcal/mol for the energy and kcal/mol/Å
/// for the forces, one force per atom in atom order.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyEvaluation {
    potential_energy: f64,
    forces: Vec<Vector3<f64>>,
}

impl EnergyEvaluation {
    pub fn new(potential_energy: f64, forces: Vec<Vector3<f64>>) -> Self {
        Self {
            potential_energy,
            forces,
        }
    }

    pub fn potential_energy(&self) -> Quantity<f64> {
        Quantity::new(self.potential_energy, UnitSystem::MOLECULAR.energy)
    }

    pub fn forces(&self) -> Quantity<MatrixXx3<f64>> {
        let forces = &self.forces;
        Quantity::new(
            MatrixXx3::from_fn(forces.len(), |i, j| forces[i][j]),
            UnitSystem::MOLECULAR.force(),
        )
    }

    pub fn energy_value(&self) -> f64 {
        self.potential_energy
    }

    pub fn force_vectors(&self) -> &[Vector3<f64>] {
        &self.forces
    }

    pub fn is_finite(&self) -> bool {
        self.potential_energy.is_finite() && self.forces.iter().all(|f| f.iter().all(|v| v.is_finite()))
    }
}

/// A source of potential energy and forces for a molecule's geometry.
///
/// A model is bound once to the molecule it is attached to, where it may capture
/// topology-dependent state (for instance bond rest lengths). After binding it must be
/// stateless between evaluations: the same positions always give the same result.
pub trait EnergyModel: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Captures whatever the model needs from the molecule's topology and current geometry.
    fn bind(&mut self, molecule: &Molecule) -> Result<(), ForcefieldError>;

    /// Evaluates energy and forces for positions given in Å, in atom order.
    fn evaluate(&self, positions: &[Point3<f64>]) -> Result<EnergyEvaluation, ForcefieldError>;

    /// Looks up a named model parameter.
    fn parameter(&self, name: &str) -> Option<Quantity<f64>>;
}
