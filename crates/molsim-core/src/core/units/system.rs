use super::defs::*;
use super::quantity::Quantity;
use super::unit::Unit;

/// A coherent set of units in which raw numeric kernels operate.
///
/// Every `f64` stored inside the model (positions, velocities, masses, energies) is a
/// magnitude in [`UnitSystem::MOLECULAR`]; public accessors attach these units on the way out.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSystem {
    pub length: Unit,
    pub mass: Unit,
    pub time: Unit,
    pub energy: Unit,
    pub charge: Unit,
    pub temperature: Unit,
}

impl UnitSystem {
    /// Ångström, atomic mass unit, femtosecond, kcal/mol, elementary charge, kelvin.
    pub const MOLECULAR: UnitSystem = UnitSystem {
        length: ANGSTROM,
        mass: AMU,
        time: FEMTOSECOND,
        energy: KCAL_PER_MOL,
        charge: ELEMENTARY_CHARGE,
        temperature: KELVIN,
    };

    pub fn velocity(&self) -> Unit {
        &self.length / &self.time
    }

    pub fn momentum(&self) -> Unit {
        &self.mass * &self.velocity()
    }

    pub fn force(&self) -> Unit {
        &self.energy / &self.length
    }

    pub fn acceleration(&self) -> Unit {
        &self.length / &self.time.powi(2)
    }

    pub fn spring_constant(&self) -> Unit {
        &self.energy / &self.length.powi(2)
    }

    /// Multiplier turning `force / mass` (energy per length per mass) into an acceleration in
    /// this system's length and time units.
    pub fn force_to_acceleration(&self) -> f64 {
        let force_per_mass = self.force().scale() / self.mass.scale();
        force_per_mass / self.acceleration().scale()
    }

    /// Multiplier turning `mass * velocity^2` into this system's energy unit.
    pub fn kinetic_to_energy(&self) -> f64 {
        (&self.mass * &self.velocity().powi(2)).scale() / self.energy.scale()
    }

    /// Boltzmann constant in energy per kelvin of this system.
    pub fn boltzmann(&self) -> f64 {
        BOLTZMANN_SI / self.energy.scale()
    }
}

pub fn boltzmann_constant() -> Quantity<f64> {
    Quantity::new(BOLTZMANN_SI, &JOULE / &KELVIN)
}
