use thiserror::Error;

use super::config::ConfigError;
use crate::core::forcefield::ForcefieldError;
use crate::core::models::error::ModelError;
use crate::core::units::UnitError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Molecule '{molecule}' has no integrator attached")]
    NoIntegrator { molecule: String },

    #[error("Molecule '{molecule}' has no energy model attached")]
    NoEnergyModel { molecule: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Energy evaluation failed: {source}")]
    Forcefield {
        #[from]
        source: ForcefieldError,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Units(#[from] UnitError),

    #[error("Simulation produced a non-finite state at step {step}")]
    NonFiniteState { step: usize },

    #[error("Frame {index} does not exist (trajectory has {len} frames)")]
    FrameNotFound { index: usize, len: usize },

    #[error("Trajectory has {expected} atoms but the molecule has {found}")]
    TopologyMismatch { expected: usize, found: usize },

    #[error("Replica {index} failed: {source}")]
    Replica {
        index: usize,
        #[source]
        source: Box<EngineError>,
    },
}
