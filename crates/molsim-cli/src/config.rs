mod defaults;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use defaults::DefaultsConfig;
use molsim::core::units::{ANGSTROM, FEMTOSECOND, KELVIN, Quantity};
use molsim::engine::config as core_config;
use molsim::workflows::ensemble::ReplicaSettings;
use nalgebra::Vector3;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case")]
enum IntegratorMethod {
    VelocityVerlet,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case")]
enum EnergyModelKind {
    Harmonic,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case")]
enum TargetKind {
    Bonds,
    Anchor,
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "bonds" => Ok(Self::Bonds),
            "anchor" => Ok(Self::Anchor),
            other => Err(format!("unknown harmonic target '{other}'")),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialIntegratorConfig {
    method: Option<IntegratorMethod>,
    timestep: Option<Quantity<f64>>,
    #[serde(rename = "frame-interval")]
    frame_interval: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialEnergyModelConfig {
    #[serde(rename = "type")]
    kind: Option<EnergyModelKind>,
    #[serde(rename = "spring-constant")]
    spring_constant: Option<Quantity<f64>>,
    target: Option<TargetKind>,
    /// Anchor point in angstroms.
    anchor: Option<[f64; 3]>,
    #[serde(rename = "rest-length")]
    rest_length: Option<Quantity<f64>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialRunSection {
    #[serde(rename = "n-steps")]
    n_steps: Option<usize>,
    #[serde(rename = "initial-temperature")]
    initial_temperature: Option<Quantity<f64>>,
    seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialEnsembleConfig {
    replicas: Option<usize>,
    temperature: Option<Quantity<f64>>,
    seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialSimulationConfig {
    integrator: Option<PartialIntegratorConfig>,
    #[serde(rename = "energy-model")]
    energy_model: Option<PartialEnergyModelConfig>,
    simulation: Option<PartialRunSection>,
    ensemble: Option<PartialEnsembleConfig>,
}

/// A fully resolved `run` request.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub simulation: core_config::SimulationConfig,
    /// Present when the run is a replica ensemble.
    pub ensemble: Option<ReplicaSettings>,
}

impl PartialSimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(mut self, args: &RunArgs) -> Result<RunConfig> {
        self.apply_set_values(&args.set_values)?;

        let defaults = DefaultsConfig::default();
        let integrator = self.integrator.take().unwrap_or_default();
        let energy_model = self.energy_model.take().unwrap_or_default();
        let run = self.simulation.take().unwrap_or_default();
        let ensemble = self.ensemble.take();

        let integrator = Self::merge_integrator(integrator, args.timestep, &defaults);
        let energy_model = Self::merge_energy_model(energy_model)?;

        let cli_temperature = args.temperature.map(|t| Quantity::new(t, KELVIN));
        let replicas = args
            .replicas
            .or(ensemble.as_ref().and_then(|e| e.replicas));

        let mut builder = core_config::SimulationConfigBuilder::new()
            .integrator(integrator)
            .energy_model(energy_model)
            .n_steps(args.steps.or(run.n_steps).unwrap_or(defaults.n_steps));

        let ensemble_settings = match replicas {
            Some(replicas) => {
                let ensemble = ensemble.unwrap_or_default();
                let temperature = cli_temperature
                    .or(ensemble.temperature)
                    .or(run.initial_temperature)
                    .ok_or_else(|| {
                        CliError::Config(
                            "A replica ensemble requires a temperature (`ensemble.temperature` or --temperature)."
                                .to_string(),
                        )
                    })?;
                let seed = args
                    .seed
                    .or(ensemble.seed)
                    .or(run.seed)
                    .unwrap_or(defaults.seed);
                builder = builder.seed(seed);
                Some(ReplicaSettings {
                    replicas,
                    temperature,
                    seed,
                })
            }
            None => {
                if let Some(temperature) = cli_temperature.or(run.initial_temperature) {
                    builder = builder.initial_temperature(temperature);
                }
                builder = builder.seed(args.seed.or(run.seed).unwrap_or(defaults.seed));
                None
            }
        };

        let simulation = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(RunConfig {
            simulation,
            ensemble: ensemble_settings,
        })
    }

    fn merge_integrator(
        partial: PartialIntegratorConfig,
        cli_timestep_fs: Option<f64>,
        defaults: &DefaultsConfig,
    ) -> core_config::IntegratorConfig {
        let timestep = match cli_timestep_fs {
            Some(fs) => Quantity::new(fs, FEMTOSECOND),
            None => partial
                .timestep
                .unwrap_or_else(|| Quantity::new(defaults.timestep_fs, FEMTOSECOND)),
        };
        let frame_interval = partial.frame_interval.unwrap_or(defaults.frame_interval);
        match partial.method.unwrap_or(IntegratorMethod::VelocityVerlet) {
            IntegratorMethod::VelocityVerlet => core_config::IntegratorConfig::VelocityVerlet {
                timestep,
                frame_interval,
            },
        }
    }

    fn merge_energy_model(
        partial: PartialEnergyModelConfig,
    ) -> Result<core_config::EnergyModelConfig> {
        let spring_constant = partial.spring_constant.ok_or_else(|| {
            CliError::Config("`energy-model.spring-constant` is required.".to_string())
        })?;

        let target = match partial.target.unwrap_or(TargetKind::Bonds) {
            TargetKind::Bonds => {
                if partial.anchor.is_some() {
                    return Err(CliError::Config(
                        "`energy-model.anchor` is only valid with `target = \"anchor\"`."
                            .to_string(),
                    ));
                }
                core_config::HarmonicTarget::Bonds
            }
            TargetKind::Anchor => {
                let [x, y, z] = partial.anchor.unwrap_or([0.0; 3]);
                core_config::HarmonicTarget::Anchor(Quantity::new(Vector3::new(x, y, z), ANGSTROM))
            }
        };

        match partial.kind.unwrap_or(EnergyModelKind::Harmonic) {
            EnergyModelKind::Harmonic => Ok(core_config::EnergyModelConfig::Harmonic {
                spring_constant,
                target,
                rest_length: partial.rest_length,
            }),
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "integrator.timestep" => {
                    self.integrator
                        .get_or_insert_with(Default::default)
                        .timestep = Some(parse_value(key, value_str)?);
                }
                "integrator.frame-interval" => {
                    self.integrator
                        .get_or_insert_with(Default::default)
                        .frame_interval = Some(parse_value(key, value_str)?);
                }
                "energy-model.spring-constant" => {
                    self.energy_model
                        .get_or_insert_with(Default::default)
                        .spring_constant = Some(parse_value(key, value_str)?);
                }
                "energy-model.rest-length" => {
                    self.energy_model
                        .get_or_insert_with(Default::default)
                        .rest_length = Some(parse_value(key, value_str)?);
                }
                "energy-model.target" => {
                    self.energy_model
                        .get_or_insert_with(Default::default)
                        .target = Some(parse_value(key, value_str)?);
                }
                "simulation.n-steps" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .n_steps = Some(parse_value(key, value_str)?);
                }
                "simulation.initial-temperature" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .initial_temperature = Some(parse_value(key, value_str)?);
                }
                "simulation.seed" => {
                    self.simulation.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value_str)?);
                }
                "ensemble.replicas" => {
                    self.ensemble.get_or_insert_with(Default::default).replicas =
                        Some(parse_value(key, value_str)?);
                }
                "ensemble.temperature" => {
                    self.ensemble
                        .get_or_insert_with(Default::default)
                        .temperature = Some(parse_value(key, value_str)?);
                }
                "ensemble.seed" => {
                    self.ensemble.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| CliError::Config(format!("Invalid value for {}: '{}' ({})", key, value, e)))
}
