use super::simulate;
use crate::core::models::molecule::Molecule;
use crate::core::units::Quantity;
use crate::engine::config::{ConfigError, SimulationConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::trajectory::Trajectory;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, instrument};

/// How many replicas to run and how to draw their initial velocities.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaSettings {
    pub replicas: usize,
    pub temperature: Quantity<f64>,
    /// Replica `i` uses seed `seed + i`.
    pub seed: u64,
}

#[derive(Debug)]
pub struct ReplicaResult {
    pub index: usize,
    pub seed: u64,
    /// The replica's copy of the template in its final state.
    pub molecule: Molecule,
    pub trajectory: Trajectory,
}

/// Runs one replica: copies `template`, assigns velocities at the replica's seed and
/// integrates it. Replicas never share mutable state, so any subset may run concurrently.
pub fn run_replica(
    template: &Molecule,
    config: &SimulationConfig,
    settings: &ReplicaSettings,
    index: usize,
) -> Result<ReplicaResult, EngineError> {
    let seed = settings.seed.wrapping_add(index as u64);
    let replica_config = SimulationConfig {
        initial_temperature: Some(settings.temperature.clone()),
        seed,
        ..config.clone()
    };
    let mut molecule = Molecule::from_molecule(template);
    molecule.set_name(format!("{}#{index}", template.name()));
    let trajectory = simulate::run(&mut molecule, &replica_config, &ProgressReporter::new())?;
    debug!(index, seed, frames = trajectory.len(), "Replica finished.");
    Ok(ReplicaResult {
        index,
        seed,
        molecule,
        trajectory,
    })
}

/// Integrates `settings.replicas` independent copies of `template`, in parallel when the
/// `parallel` feature is enabled. Results are returned in replica order.
///
/// # Errors
///
/// The first failing replica, by index, is reported as [`EngineError::Replica`].
#[instrument(skip_all, name = "ensemble_workflow", fields(replicas = settings.replicas))]
pub fn run_replicas(
    template: &Molecule,
    config: &SimulationConfig,
    settings: &ReplicaSettings,
    reporter: &ProgressReporter,
) -> Result<Vec<ReplicaResult>, EngineError> {
    if settings.replicas == 0 {
        return Err(ConfigError::InvalidParameter {
            name: "replicas",
            reason: "must be at least 1".to_string(),
        }
        .into());
    }

    reporter.report(Progress::PhaseStart { name: "Replicas" });
    reporter.report(Progress::TaskStart {
        total_steps: settings.replicas as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = 0..settings.replicas;

    #[cfg(feature = "parallel")]
    let iterator = (0..settings.replicas).into_par_iter();

    let results: Vec<Result<ReplicaResult, EngineError>> = iterator
        .map(|index| {
            let result = run_replica(template, config, settings, index);
            reporter.report(Progress::TaskIncrement);
            result
        })
        .collect();

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let replicas = results
        .into_iter()
        .enumerate()
        .map(|(index, result)| {
            result.map_err(|e| EngineError::Replica {
                index,
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        replicas = replicas.len(),
        temperature = %settings.temperature,
        "Replica ensemble complete."
    );
    Ok(replicas)
}
