use crate::core::models::molecule::Molecule;
use crate::engine::config::SimulationConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::trajectory::Trajectory;
use crate::engine::velocities::assign_maxwell_boltzmann_seeded;
use tracing::{info, instrument};

/// Builds the configured energy model and integrator, attaches them to `molecule`, assigns
/// initial velocities when a temperature is configured, and runs `config.n_steps` steps.
#[instrument(skip_all, name = "simulation_workflow", fields(molecule = molecule.name()))]
pub fn run(
    molecule: &mut Molecule,
    config: &SimulationConfig,
    reporter: &ProgressReporter,
) -> Result<Trajectory, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let integrator = config.integrator.build()?;
    let model = config.energy_model.build()?;
    molecule.set_boxed_energy_model(model)?;
    molecule.set_boxed_integrator(integrator);

    if let Some(temperature) = &config.initial_temperature {
        assign_maxwell_boltzmann_seeded(molecule, temperature, config.seed)?;
        info!(
            temperature = %temperature,
            seed = config.seed,
            "Assigned initial velocities."
        );
    }
    reporter.report(Progress::PhaseFinish);

    let trajectory = molecule.run_with_progress(config.n_steps, reporter)?;

    if let Some(last) = trajectory.last() {
        info!(
            frames = trajectory.len(),
            final_time = %last.time(),
            final_total_energy = %last.total_energy(),
            "Simulation workflow complete."
        );
    }
    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::units::{ANGSTROM, FEMTOSECOND, KELVIN, Quantity, UnitSystem};
    use crate::engine::config::{
        EnergyModelConfig, HarmonicTarget, IntegratorConfig, SimulationConfigBuilder,
    };
    use nalgebra::{Point3, Vector3};

    fn config(temperature: Option<f64>) -> SimulationConfig {
        let mut builder = SimulationConfigBuilder::new()
            .integrator(IntegratorConfig::VelocityVerlet {
                timestep: Quantity::new(1.0, FEMTOSECOND),
                frame_interval: 10,
            })
            .energy_model(EnergyModelConfig::Harmonic {
                spring_constant: Quantity::new(1.0, UnitSystem::MOLECULAR.spring_constant()),
                target: HarmonicTarget::Anchor(Quantity::new(Vector3::zeros(), ANGSTROM)),
                rest_length: None,
            })
            .n_steps(50)
            .seed(9);
        if let Some(t) = temperature {
            builder = builder.initial_temperature(Quantity::new(t, KELVIN));
        }
        builder.build().unwrap()
    }

    fn pair() -> Molecule {
        Molecule::from_atoms(
            "pair",
            vec![
                Atom::from_symbol("O").unwrap().with_coords(Point3::new(0.5, 0.0, 0.0)),
                Atom::from_symbol("N").unwrap().with_coords(Point3::new(0.0, 0.5, 0.0)),
            ],
        )
    }

    #[test]
    fn run_attaches_configured_model_and_integrator() {
        let mut molecule = pair();
        let trajectory = run(&mut molecule, &config(None), &ProgressReporter::new()).unwrap();
        assert_eq!(trajectory.len(), 6);
        assert_eq!(molecule.energy_model().unwrap().name(), "harmonic");
        assert_eq!(molecule.integrator().unwrap().name(), "velocity-verlet");
        assert_eq!(*trajectory.frame(0).unwrap().kinetic_energy().value(), 0.0);
    }

    #[test]
    fn initial_temperature_gives_reproducible_velocities() {
        let mut a = pair();
        let mut b = pair();
        let ta = run(&mut a, &config(Some(300.0)), &ProgressReporter::new()).unwrap();
        let tb = run(&mut b, &config(Some(300.0)), &ProgressReporter::new()).unwrap();
        assert!(*ta.frame(0).unwrap().kinetic_energy().value() > 0.0);
        assert_eq!(ta.frames(), tb.frames());
    }
}
