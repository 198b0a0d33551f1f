use super::element::Element;
use super::error::ModelError;
use crate::core::units::{
    ANGSTROM, AMU, ELEMENTARY_CHARGE, Quantity, UnitError, UnitSystem,
};
use nalgebra::{Point3, Vector3};

/// A single atom: identity, static properties and dynamic state.
///
/// Internally every magnitude is stored in [`UnitSystem::MOLECULAR`] units (Å, Å/fs, amu, e);
/// the public accessors return [`Quantity`] values and setters accept any compatible unit.
/// A standalone atom is a plain value. Moving it into a molecule hands it over, and cloning
/// it produces an independent copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atom name, e.g. "CA" or "H1".
    pub name: String,
    /// Serial number from the source file, 0 when the atom was built in memory.
    pub serial: usize,
    element: Element,
    mass: f64,
    charge: f64,
    position: Point3<f64>,
    velocity: Vector3<f64>,
}

impl Atom {
    /// Creates an atom at the origin, at rest, with the mass of the element's most abundant
    /// isotope and the element symbol as its name.
    pub fn new(element: Element) -> Self {
        Self {
            name: element.symbol().to_string(),
            serial: 0,
            element,
            mass: element.isotope_mass(),
            charge: 0.0,
            position: Point3::origin(),
            velocity: Vector3::zeros(),
        }
    }

    pub fn from_symbol(symbol: &str) -> Result<Self, ModelError> {
        let element: Element = symbol
            .parse()
            .map_err(|_| ModelError::UnknownElement(symbol.to_string()))?;
        Ok(Self::new(element))
    }

    pub fn from_atomic_number(number: u8) -> Result<Self, ModelError> {
        Element::from_atomic_number(number)
            .map(Self::new)
            .ok_or_else(|| ModelError::UnknownElement(format!("atomic number {}", number)))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_serial(mut self, serial: usize) -> Self {
        self.serial = serial;
        self
    }

    /// Places the atom at `coords`, given in Å.
    pub fn with_coords(mut self, coords: Point3<f64>) -> Self {
        self.position = coords;
        self
    }

    pub fn with_position(mut self, position: &Quantity<Vector3<f64>>) -> Result<Self, UnitError> {
        self.set_position(position)?;
        Ok(self)
    }

    /// Overrides the isotope mass. The mass must be positive and finite.
    pub fn with_mass(mut self, mass: &Quantity<f64>) -> Result<Self, ModelError> {
        let amu = mass.value_in(&AMU)?;
        if !(amu.is_finite() && amu > 0.0) {
            return Err(ModelError::NonPositiveMass(amu));
        }
        self.mass = amu;
        Ok(self)
    }

    /// Sets the partial charge, given in elementary charges.
    pub fn with_partial_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn symbol(&self) -> &'static str {
        self.element.symbol()
    }

    pub fn atomic_number(&self) -> u8 {
        self.element.atomic_number()
    }

    pub fn mass(&self) -> Quantity<f64> {
        Quantity::new(self.mass, AMU)
    }

    pub fn charge(&self) -> Quantity<f64> {
        Quantity::new(self.charge, ELEMENTARY_CHARGE)
    }

    pub fn set_charge(&mut self, charge: &Quantity<f64>) -> Result<(), UnitError> {
        self.charge = charge.value_in(&ELEMENTARY_CHARGE)?;
        Ok(())
    }

    /// Cartesian coordinates in Å.
    pub fn coords(&self) -> Point3<f64> {
        self.position
    }

    pub fn position(&self) -> Quantity<Vector3<f64>> {
        Quantity::new(self.position.coords, ANGSTROM)
    }

    pub fn set_position(&mut self, position: &Quantity<Vector3<f64>>) -> Result<(), UnitError> {
        self.position = Point3::from(position.value_in(&ANGSTROM)?);
        Ok(())
    }

    pub fn x(&self) -> Quantity<f64> {
        Quantity::new(self.position.x, ANGSTROM)
    }

    pub fn y(&self) -> Quantity<f64> {
        Quantity::new(self.position.y, ANGSTROM)
    }

    pub fn z(&self) -> Quantity<f64> {
        Quantity::new(self.position.z, ANGSTROM)
    }

    pub fn set_x(&mut self, x: &Quantity<f64>) -> Result<(), UnitError> {
        self.position.x = x.value_in(&ANGSTROM)?;
        Ok(())
    }

    pub fn set_y(&mut self, y: &Quantity<f64>) -> Result<(), UnitError> {
        self.position.y = y.value_in(&ANGSTROM)?;
        Ok(())
    }

    pub fn set_z(&mut self, z: &Quantity<f64>) -> Result<(), UnitError> {
        self.position.z = z.value_in(&ANGSTROM)?;
        Ok(())
    }

    pub fn velocity(&self) -> Quantity<Vector3<f64>> {
        Quantity::new(self.velocity, UnitSystem::MOLECULAR.velocity())
    }

    pub fn set_velocity(&mut self, velocity: &Quantity<Vector3<f64>>) -> Result<(), UnitError> {
        self.velocity = velocity.value_in(&UnitSystem::MOLECULAR.velocity())?;
        Ok(())
    }

    pub fn momentum(&self) -> Quantity<Vector3<f64>> {
        Quantity::new(self.velocity * self.mass, UnitSystem::MOLECULAR.momentum())
    }

    pub fn set_momentum(&mut self, momentum: &Quantity<Vector3<f64>>) -> Result<(), ModelError> {
        let momentum = momentum.value_in(&UnitSystem::MOLECULAR.momentum())?;
        self.velocity = momentum / self.checked_mass()?;
        Ok(())
    }

    pub fn distance(&self, other: &Atom) -> Quantity<f64> {
        Quantity::new(nalgebra::distance(&self.position, &other.position), ANGSTROM)
    }

    pub fn kinetic_energy(&self) -> Quantity<f64> {
        let system = UnitSystem::MOLECULAR;
        Quantity::new(
            0.5 * self.mass * self.velocity.norm_squared() * system.kinetic_to_energy(),
            system.energy,
        )
    }

    pub(crate) fn mass_raw(&self) -> f64 {
        self.mass
    }

    #[cfg(test)]
    pub(crate) fn set_mass_raw(&mut self, mass: f64) {
        self.mass = mass;
    }

    /// The mass to divide a momentum by.
    pub(crate) fn checked_mass(&self) -> Result<f64, ModelError> {
        if self.mass.is_finite() && self.mass > 0.0 {
            Ok(self.mass)
        } else {
            Err(ModelError::NonPositiveMass(self.mass))
        }
    }

    pub(crate) fn velocity_raw(&self) -> Vector3<f64> {
        self.velocity
    }

    pub(crate) fn set_coords(&mut self, coords: Point3<f64>) {
        self.position = coords;
    }

    pub(crate) fn set_velocity_raw(&mut self, velocity: Vector3<f64>) {
        self.velocity = velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::{FEMTOSECOND, KCAL_PER_MOL, NANOMETER};

    fn length(value: f64) -> Quantity<f64> {
        Quantity::new(value, ANGSTROM)
    }

    #[test]
    fn new_atom_uses_isotope_mass_and_symbol_name() {
        let carbon = Atom::from_symbol("C").unwrap();
        assert_eq!(carbon.name, "C");
        assert_eq!(carbon.mass(), Quantity::new(12.0, AMU));
        assert_eq!(carbon.atomic_number(), 6);
        assert_eq!(carbon.coords(), Point3::origin());
    }

    #[test]
    fn constructors_reject_unknown_elements() {
        assert!(matches!(
            Atom::from_symbol("Qq"),
            Err(ModelError::UnknownElement(s)) if s == "Qq"
        ));
        assert!(matches!(
            Atom::from_atomic_number(0),
            Err(ModelError::UnknownElement(_))
        ));
        assert_eq!(Atom::from_atomic_number(1).unwrap().element(), Element::H);
    }

    #[test]
    fn coordinate_setters_convert_units() {
        let mut atom = Atom::from_symbol("H").unwrap();
        atom.set_x(&Quantity::new(0.05, NANOMETER)).unwrap();
        atom.set_y(&length(-0.5)).unwrap();
        assert_eq!(atom.x(), length(0.5));
        assert_eq!(atom.y(), length(-0.5));
        assert_eq!(atom.z(), length(0.0));
    }

    #[test]
    fn setters_reject_wrong_dimensions_and_leave_state_untouched() {
        let mut atom = Atom::from_symbol("O").unwrap().with_coords(Point3::new(1.0, 2.0, 3.0));
        let err = atom.set_x(&Quantity::new(1.0, FEMTOSECOND)).unwrap_err();
        assert!(matches!(err, UnitError::Dimensionality { .. }));
        assert_eq!(atom.coords(), Point3::new(1.0, 2.0, 3.0));

        let bad_velocity = Quantity::new(Vector3::new(1.0, 0.0, 0.0), ANGSTROM);
        assert!(atom.set_velocity(&bad_velocity).is_err());
        assert_eq!(atom.velocity_raw(), Vector3::zeros());
    }

    #[test]
    fn momentum_is_mass_times_velocity() {
        let mut atom = Atom::from_symbol("C").unwrap();
        let velocity = Quantity::new(Vector3::new(0.01, 0.0, -0.02), UnitSystem::MOLECULAR.velocity());
        atom.set_velocity(&velocity).unwrap();
        assert_eq!(
            atom.momentum(),
            Quantity::new(Vector3::new(0.12, 0.0, -0.24), UnitSystem::MOLECULAR.momentum())
        );

        let momentum = Quantity::new(Vector3::new(1.2, 0.0, 0.0), UnitSystem::MOLECULAR.momentum());
        atom.set_momentum(&momentum).unwrap();
        assert_eq!(
            atom.velocity(),
            Quantity::new(Vector3::new(0.1, 0.0, 0.0), UnitSystem::MOLECULAR.velocity())
        );
    }

    #[test]
    fn mass_override_converts_units() {
        let heavy = Atom::from_symbol("H")
            .unwrap()
            .with_mass(&Quantity::new(2.0141017778, AMU))
            .unwrap();
        assert!((heavy.mass_raw() - 2.0141017778).abs() < 1e-12);
        assert!(Atom::from_symbol("H").unwrap().with_mass(&length(1.0)).is_err());
    }

    #[test]
    fn massless_atoms_are_rejected() {
        let hydrogen = Atom::from_symbol("H").unwrap();
        for mass in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                hydrogen.clone().with_mass(&Quantity::new(mass, AMU)),
                Err(ModelError::NonPositiveMass(_))
            ));
        }

        let mut dummy = hydrogen.clone();
        dummy.set_mass_raw(0.0);
        let momentum = Quantity::new(Vector3::new(1.0, 0.0, 0.0), UnitSystem::MOLECULAR.momentum());
        assert_eq!(dummy.set_momentum(&momentum), Err(ModelError::NonPositiveMass(0.0)));
        assert_eq!(dummy.velocity_raw(), Vector3::zeros());
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Atom::from_symbol("H").unwrap().with_coords(Point3::new(0.5, 0.0, 0.0));
        let b = Atom::from_symbol("H").unwrap().with_coords(Point3::new(-0.5, 0.0, 0.0));
        assert_eq!(a.distance(&b), length(1.0));
    }

    #[test]
    fn kinetic_energy_is_reported_in_molar_units() {
        let mut atom = Atom::from_symbol("C").unwrap();
        atom.set_velocity_raw(Vector3::new(0.01, 0.0, 0.0));
        let expected = 0.5 * 12.0 * 1e-4 * UnitSystem::MOLECULAR.kinetic_to_energy();
        let energy = atom.kinetic_energy();
        assert_eq!(energy.unit(), &KCAL_PER_MOL);
        assert!((energy.value() - expected).abs() < 1e-12);
    }

    #[test]
    fn clones_are_independent() {
        let original = Atom::from_symbol("N").unwrap();
        let mut copy = original.clone();
        copy.set_x(&length(3.0)).unwrap();
        copy.name = "N2".to_string();
        assert_eq!(original.x(), length(0.0));
        assert_eq!(original.name, "N");
    }
}
