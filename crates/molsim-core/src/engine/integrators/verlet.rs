use super::Integrator;
use crate::core::forcefield::{EnergyEvaluation, EnergyModel};
use crate::core::models::molecule::Molecule;
use crate::core::units::{FEMTOSECOND, Quantity, UnitSystem};
use crate::engine::config::ConfigError;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::trajectory::{Frame, Trajectory};
use nalgebra::{Point3, Vector3};
use tracing::{info, instrument, trace};

/// Velocity Verlet integrator.
///
/// Each step updates positions with the current accelerations, re-evaluates forces at the new
/// geometry and then updates velocities with the mean of the old and new accelerations:
///
/// ```text
/// x(t + dt) = x(t) + v(t) dt + ½ a(t) dt²
/// v(t + dt) = v(t) + ½ (a(t) + a(t + dt)) dt
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityVerlet {
    /// fs
    timestep: f64,
    frame_interval: usize,
}

impl VelocityVerlet {
    pub const NAME: &'static str = "velocity-verlet";

    /// # Errors
    ///
    /// [`ConfigError::Units`] when `timestep` is not a time, and
    /// [`ConfigError::InvalidParameter`] when it is not positive or `frame_interval` is zero.
    pub fn new(timestep: &Quantity<f64>, frame_interval: usize) -> Result<Self, ConfigError> {
        let timestep = timestep.value_in(&FEMTOSECOND)?;
        if !timestep.is_finite() || timestep <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "timestep",
                reason: format!("must be a positive time, got {timestep} fs"),
            });
        }
        if frame_interval == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "frame_interval",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            timestep,
            frame_interval,
        })
    }
}

fn accelerations(evaluation: &EnergyEvaluation, masses: &[f64]) -> Vec<Vector3<f64>> {
    let factor = UnitSystem::MOLECULAR.force_to_acceleration();
    evaluation
        .force_vectors()
        .iter()
        .zip(masses)
        .map(|(f, m)| f * (factor / m))
        .collect()
}

fn state_is_finite(evaluation: &EnergyEvaluation, positions: &[Point3<f64>], velocities: &[Vector3<f64>]) -> bool {
    evaluation.is_finite()
        && positions.iter().all(|p| p.coords.iter().all(|c| c.is_finite()))
        && velocities.iter().all(|v| v.iter().all(|c| c.is_finite()))
}

impl Integrator for VelocityVerlet {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn timestep(&self) -> Quantity<f64> {
        Quantity::new(self.timestep, FEMTOSECOND)
    }

    fn frame_interval(&self) -> usize {
        self.frame_interval
    }

    #[instrument(skip_all, name = "velocity_verlet", fields(molecule = molecule.name(), n_steps = n_steps))]
    fn run(
        &self,
        molecule: &mut Molecule,
        model: &dyn EnergyModel,
        n_steps: usize,
        reporter: &ProgressReporter,
    ) -> Result<Trajectory, EngineError> {
        let dt = self.timestep;
        let t0 = molecule.time_raw();
        let masses = molecule.raw_masses();
        let mut positions = molecule.raw_positions();
        let mut velocities = molecule.raw_velocities();
        let mut trajectory = Trajectory::new(molecule, self.name(), dt);

        info!(
            atoms = positions.len(),
            model = model.name(),
            timestep_fs = dt,
            frame_interval = self.frame_interval,
            "Starting velocity Verlet run."
        );

        let mut evaluation = model.evaluate(&positions)?;
        if !state_is_finite(&evaluation, &positions, &velocities) {
            return Err(EngineError::NonFiniteState { step: 0 });
        }
        let mut current = accelerations(&evaluation, &masses);
        trajectory.push(Frame::new(
            0,
            t0,
            positions.clone(),
            velocities.clone(),
            evaluation.energy_value(),
            Molecule::raw_kinetic_energy(&velocities, &masses),
        ));

        reporter.report(Progress::PhaseStart {
            name: "Velocity Verlet",
        });
        reporter.report(Progress::TaskStart {
            total_steps: n_steps as u64,
        });

        for step in 1..=n_steps {
            for ((x, v), a) in positions.iter_mut().zip(&velocities).zip(&current) {
                *x += v * dt + a * (0.5 * dt * dt);
            }
            evaluation = model.evaluate(&positions)?;
            let next = accelerations(&evaluation, &masses);
            for ((v, a), a_next) in velocities.iter_mut().zip(&current).zip(&next) {
                *v += (a + a_next) * (0.5 * dt);
            }
            current = next;

            if !state_is_finite(&evaluation, &positions, &velocities) {
                return Err(EngineError::NonFiniteState { step });
            }

            if step % self.frame_interval == 0 {
                let kinetic = Molecule::raw_kinetic_energy(&velocities, &masses);
                trace!(
                    step,
                    potential_energy = evaluation.energy_value(),
                    kinetic_energy = kinetic,
                    "Recorded frame."
                );
                trajectory.push(Frame::new(
                    step,
                    t0 + step as f64 * dt,
                    positions.clone(),
                    velocities.clone(),
                    evaluation.energy_value(),
                    kinetic,
                ));
            }
            reporter.report(Progress::TaskIncrement);
        }

        reporter.report(Progress::TaskFinish);
        reporter.report(Progress::PhaseFinish);

        molecule.set_raw_state(&positions, &velocities);
        molecule.advance_time(n_steps as f64 * dt);

        info!(
            frames = trajectory.len(),
            energy_drift = *trajectory.max_energy_drift().value(),
            "Velocity Verlet run complete."
        );
        Ok(trajectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::ForcefieldError;
    use crate::core::forcefield::harmonic::HarmonicOscillator;
    use crate::core::models::atom::Atom;
    use crate::core::units::{ANGSTROM, KELVIN, SECOND};
    use std::sync::Mutex;

    fn oscillator_molecule() -> (Molecule, HarmonicOscillator) {
        let atom = Atom::from_symbol("C")
            .unwrap()
            .with_coords(Point3::new(1.0, 0.0, 0.0));
        let molecule = Molecule::from_atoms("carbon", vec![atom]);
        let mut model =
            HarmonicOscillator::new(&Quantity::new(1.0, UnitSystem::MOLECULAR.spring_constant())).unwrap();
        model.bind(&molecule).unwrap();
        (molecule, model)
    }

    fn verlet(dt: f64, interval: usize) -> VelocityVerlet {
        VelocityVerlet::new(&Quantity::new(dt, FEMTOSECOND), interval).unwrap()
    }

    #[derive(Debug)]
    struct Exploding;

    impl EnergyModel for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }
        fn bind(&mut self, _: &Molecule) -> Result<(), ForcefieldError> {
            Ok(())
        }
        fn evaluate(&self, positions: &[Point3<f64>]) -> Result<EnergyEvaluation, ForcefieldError> {
            let energy = if positions[0].x > 1.0 { f64::NAN } else { 0.0 };
            Ok(EnergyEvaluation::new(energy, vec![Vector3::new(1e6, 0.0, 0.0); positions.len()]))
        }
        fn parameter(&self, _: &str) -> Option<Quantity<f64>> {
            None
        }
    }

    #[test]
    fn new_validates_timestep_and_interval() {
        assert!(matches!(
            VelocityVerlet::new(&Quantity::new(1.0, ANGSTROM), 1),
            Err(ConfigError::Units(_))
        ));
        assert!(matches!(
            VelocityVerlet::new(&Quantity::new(-1.0, FEMTOSECOND), 1),
            Err(ConfigError::InvalidParameter { name: "timestep", .. })
        ));
        assert!(matches!(
            VelocityVerlet::new(&Quantity::new(1.0, FEMTOSECOND), 0),
            Err(ConfigError::InvalidParameter { name: "frame_interval", .. })
        ));
        let converted = VelocityVerlet::new(&Quantity::new(2e-15, SECOND), 1).unwrap();
        assert_eq!(converted.timestep(), Quantity::new(2.0, FEMTOSECOND));
        assert!(VelocityVerlet::new(&Quantity::new(1.0, KELVIN), 1).is_err());
    }

    #[test]
    fn frames_are_sampled_at_the_interval_including_the_initial_state() {
        let (mut molecule, model) = oscillator_molecule();
        let trajectory = verlet(0.5, 4).run(&mut molecule, &model, 10, &ProgressReporter::new()).unwrap();
        let steps: Vec<usize> = trajectory.frames().iter().map(Frame::step).collect();
        assert_eq!(steps, vec![0, 4, 8]);
        assert_eq!(trajectory.frame(2).unwrap().time(), Quantity::new(4.0, FEMTOSECOND));
        assert_eq!(molecule.time(), Quantity::new(5.0, FEMTOSECOND));
        assert_eq!(trajectory.frame(0).unwrap().position_vectors()[0], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn atom_released_from_rest_moves_towards_the_anchor() {
        let (mut molecule, model) = oscillator_molecule();
        verlet(0.5, 1).run(&mut molecule, &model, 20, &ProgressReporter::new()).unwrap();
        let x = molecule.atom_at(0).unwrap().x().value_in(&ANGSTROM).unwrap();
        assert!(x < 1.0);
        assert!(molecule.velocities().get(0, 0).unwrap().value() < &0.0);
    }

    #[test]
    fn energy_is_conserved_for_a_small_timestep() {
        let (mut molecule, model) = oscillator_molecule();
        let trajectory = verlet(0.5, 10).run(&mut molecule, &model, 2000, &ProgressReporter::new()).unwrap();
        let initial = *trajectory.frame(0).unwrap().total_energy().value();
        assert!((initial - 0.5).abs() < 1e-12);
        assert!(*trajectory.max_energy_drift().value() < 1e-3 * initial);
    }

    #[test]
    fn non_finite_state_aborts_and_leaves_molecule_unchanged() {
        let atom = Atom::from_symbol("H").unwrap();
        let mut molecule = Molecule::from_atoms("h", vec![atom]);
        let before = molecule.positions();
        let err = verlet(1.0, 1)
            .run(&mut molecule, &Exploding, 5, &ProgressReporter::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::NonFiniteState { step: 1 }));
        assert_eq!(molecule.positions(), before);
        assert_eq!(molecule.time(), Quantity::new(0.0, FEMTOSECOND));
    }

    #[test]
    fn progress_reports_one_increment_per_step() {
        let (mut molecule, model) = oscillator_molecule();
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| events.lock().unwrap().push(event)));
        verlet(1.0, 1).run(&mut molecule, &model, 3, &reporter).unwrap();
        drop(reporter);
        let events = events.into_inner().unwrap();
        assert_eq!(events.first(), Some(&Progress::PhaseStart { name: "Velocity Verlet" }));
        assert_eq!(events[1], Progress::TaskStart { total_steps: 3 });
        assert_eq!(events.iter().filter(|e| **e == Progress::TaskIncrement).count(), 3);
        assert_eq!(events.last(), Some(&Progress::PhaseFinish));
    }
}
