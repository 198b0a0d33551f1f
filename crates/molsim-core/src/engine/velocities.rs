use super::config::ConfigError;
use crate::core::models::molecule::Molecule;
use crate::core::units::{KELVIN, Quantity, UnitSystem};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::{debug, instrument};

/// Draws velocities from the Maxwell-Boltzmann distribution at `temperature`.
///
/// Each Cartesian component of atom `i` is normal with variance `k_B T / m_i`. With two or
/// more atoms the centre-of-mass velocity is removed afterwards so the molecule does not
/// drift. Atoms without a positive mass are left at rest.
#[instrument(level = "debug", skip_all, fields(molecule = molecule.name()))]
pub fn assign_maxwell_boltzmann(
    molecule: &mut Molecule,
    temperature: &Quantity<f64>,
    rng: &mut impl Rng,
) -> Result<(), ConfigError> {
    let temperature = temperature.value_in(&KELVIN)?;
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(ConfigError::InvalidParameter {
            name: "temperature",
            reason: format!("must be a non-negative temperature, got {temperature} K"),
        });
    }

    let system = UnitSystem::MOLECULAR;
    let thermal_energy = system.boltzmann() * temperature * system.force_to_acceleration();
    let masses = molecule.raw_masses();

    let mut velocities: Vec<Vector3<f64>> = masses
        .iter()
        .map(|&m| {
            if m <= 0.0 {
                return Vector3::zeros();
            }
            let sigma = (thermal_energy / m).sqrt();
            Vector3::from_fn(|_, _| sigma * rng.sample::<f64, _>(StandardNormal))
        })
        .collect();

    if velocities.len() >= 2 {
        remove_center_of_mass_velocity(&mut velocities, &masses);
    }

    let positions = molecule.raw_positions();
    molecule.set_raw_state(&positions, &velocities);
    debug!(temperature_k = temperature, atoms = velocities.len(), "Assigned Maxwell-Boltzmann velocities.");
    Ok(())
}

/// [`assign_maxwell_boltzmann`] with a [`StdRng`] seeded from `seed`.
pub fn assign_maxwell_boltzmann_seeded(
    molecule: &mut Molecule,
    temperature: &Quantity<f64>,
    seed: u64,
) -> Result<(), ConfigError> {
    let mut rng = StdRng::seed_from_u64(seed);
    assign_maxwell_boltzmann(molecule, temperature, &mut rng)
}

fn remove_center_of_mass_velocity(velocities: &mut [Vector3<f64>], masses: &[f64]) {
    let total_mass: f64 = masses.iter().filter(|m| **m > 0.0).sum();
    if total_mass <= 0.0 {
        return;
    }
    let momentum: Vector3<f64> = velocities.iter().zip(masses).map(|(v, m)| v * *m).sum();
    let drift = momentum / total_mass;
    for (v, m) in velocities.iter_mut().zip(masses) {
        if *m > 0.0 {
            *v -= drift;
        }
    }
}

/// Temperature implied by the molecule's kinetic energy, `2 KE / (n_dof k_B)`.
///
/// `n_dof` is `3N - 3` for two or more atoms (centre of mass fixed) and `3` for a single atom.
pub fn instantaneous_temperature(molecule: &Molecule) -> Quantity<f64> {
    let n = molecule.num_atoms();
    let dof = match n {
        0 => return Quantity::new(0.0, KELVIN),
        1 => 3.0,
        _ => (3 * n - 3) as f64,
    };
    let kinetic = Molecule::raw_kinetic_energy(&molecule.raw_velocities(), &molecule.raw_masses());
    Quantity::new(2.0 * kinetic / (dof * UnitSystem::MOLECULAR.boltzmann()), KELVIN)
}
