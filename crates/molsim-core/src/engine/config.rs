use super::integrators::Integrator;
use super::integrators::verlet::VelocityVerlet;
use crate::core::forcefield::{EnergyModel, ForcefieldError};
use crate::core::forcefield::harmonic::HarmonicOscillator;
use crate::core::units::{Quantity, UnitError};
use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(transparent)]
    Units(#[from] UnitError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntegratorConfig {
    VelocityVerlet {
        timestep: Quantity<f64>,
        frame_interval: usize,
    },
}

impl IntegratorConfig {
    pub fn build(&self) -> Result<Box<dyn Integrator>, ConfigError> {
        match self {
            Self::VelocityVerlet {
                timestep,
                frame_interval,
            } => Ok(Box::new(VelocityVerlet::new(timestep, *frame_interval)?)),
        }
    }
}

/// What the springs of a harmonic model pull towards.
#[derive(Debug, Clone, PartialEq)]
pub enum HarmonicTarget {
    /// Every atom is tethered to this point.
    Anchor(Quantity<Vector3<f64>>),
    /// One spring per bond.
    Bonds,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnergyModelConfig {
    Harmonic {
        spring_constant: Quantity<f64>,
        target: HarmonicTarget,
        rest_length: Option<Quantity<f64>>,
    },
}

impl EnergyModelConfig {
    /// Builds an unbound model; it is bound when attached to a molecule.
    pub fn build(&self) -> Result<Box<dyn EnergyModel>, ConfigError> {
        match self {
            Self::Harmonic {
                spring_constant,
                target,
                rest_length,
            } => {
                let model = match target {
                    HarmonicTarget::Anchor(point) => HarmonicOscillator::with_anchor(spring_constant, point),
                    HarmonicTarget::Bonds => HarmonicOscillator::bonded(spring_constant),
                }
                .map_err(|e| rejected("spring_constant", e))?;
                let model = match rest_length {
                    Some(r0) => model.with_rest_length(r0).map_err(|e| rejected("rest_length", e))?,
                    None => model,
                };
                Ok(Box::new(model))
            }
        }
    }
}

fn rejected(name: &'static str, error: ForcefieldError) -> ConfigError {
    match error {
        ForcefieldError::Units(e) => ConfigError::Units(e),
        other => ConfigError::InvalidParameter {
            name,
            reason: other.to_string(),
        },
    }
}

/// Everything needed to run one simulation of a molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub integrator: IntegratorConfig,
    pub energy_model: EnergyModelConfig,
    pub n_steps: usize,
    /// When set, velocities are drawn from a Maxwell-Boltzmann distribution before the run.
    pub initial_temperature: Option<Quantity<f64>>,
    pub seed: u64,
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    integrator: Option<IntegratorConfig>,
    energy_model: Option<EnergyModelConfig>,
    n_steps: Option<usize>,
    initial_temperature: Option<Quantity<f64>>,
    seed: Option<u64>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn integrator(mut self, integrator: IntegratorConfig) -> Self {
        self.integrator = Some(integrator);
        self
    }
    pub fn energy_model(mut self, model: EnergyModelConfig) -> Self {
        self.energy_model = Some(model);
        self
    }
    pub fn n_steps(mut self, n: usize) -> Self {
        self.n_steps = Some(n);
        self
    }
    pub fn initial_temperature(mut self, temperature: Quantity<f64>) -> Self {
        self.initial_temperature = Some(temperature);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        Ok(SimulationConfig {
            integrator: self
                .integrator
                .ok_or(ConfigError::MissingParameter("integrator"))?,
            energy_model: self
                .energy_model
                .ok_or(ConfigError::MissingParameter("energy_model"))?,
            n_steps: self.n_steps.ok_or(ConfigError::MissingParameter("n_steps"))?,
            initial_temperature: self.initial_temperature,
            seed: self.seed.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::{ANGSTROM, FEMTOSECOND, KELVIN, UnitSystem};

    fn verlet() -> IntegratorConfig {
        IntegratorConfig::VelocityVerlet {
            timestep: Quantity::new(0.5, FEMTOSECOND),
            frame_interval: 10,
        }
    }

    fn harmonic() -> EnergyModelConfig {
        EnergyModelConfig::Harmonic {
            spring_constant: Quantity::new(1.0, UnitSystem::MOLECULAR.spring_constant()),
            target: HarmonicTarget::Bonds,
            rest_length: None,
        }
    }

    #[test]
    fn builder_reports_first_missing_parameter() {
        let err = SimulationConfigBuilder::new().n_steps(10).build().unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("integrator"));
        let err = SimulationConfigBuilder::new().integrator(verlet()).build().unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("energy_model"));
    }

    #[test]
    fn builder_fills_optional_fields() {
        let config = SimulationConfigBuilder::new()
            .integrator(verlet())
            .energy_model(harmonic())
            .n_steps(100)
            .initial_temperature(Quantity::new(300.0, KELVIN))
            .build()
            .unwrap();
        assert_eq!(config.n_steps, 100);
        assert_eq!(config.seed, 0);
        assert_eq!(config.initial_temperature, Some(Quantity::new(300.0, KELVIN)));
    }

    #[test]
    fn integrator_config_builds_velocity_verlet() {
        let integrator = verlet().build().unwrap();
        assert_eq!(integrator.name(), "velocity-verlet");
        assert_eq!(integrator.frame_interval(), 10);
        assert_eq!(integrator.timestep(), Quantity::new(0.5, FEMTOSECOND));
    }

    #[test]
    fn energy_model_config_rejects_wrong_dimensions() {
        let config = EnergyModelConfig::Harmonic {
            spring_constant: Quantity::new(1.0, ANGSTROM),
            target: HarmonicTarget::Bonds,
            rest_length: None,
        };
        assert!(matches!(config.build(), Err(ConfigError::Units(_))));

        let negative = EnergyModelConfig::Harmonic {
            spring_constant: Quantity::new(-1.0, UnitSystem::MOLECULAR.spring_constant()),
            target: HarmonicTarget::Bonds,
            rest_length: None,
        };
        assert!(matches!(
            negative.build(),
            Err(ConfigError::InvalidParameter { name: "spring_constant", .. })
        ));
    }

    #[test]
    fn energy_model_config_applies_rest_length() {
        let config = EnergyModelConfig::Harmonic {
            spring_constant: Quantity::new(2.0, UnitSystem::MOLECULAR.spring_constant()),
            target: HarmonicTarget::Anchor(Quantity::new(Vector3::zeros(), ANGSTROM)),
            rest_length: Some(Quantity::new(0.25, ANGSTROM)),
        };
        let model = config.build().unwrap();
        assert_eq!(model.name(), "harmonic");
        assert_eq!(model.parameter("r0"), Some(Quantity::new(0.25, ANGSTROM)));
    }
}
