use super::dimension::Dimension;
use super::unit::Unit;
use phf::phf_map;

pub const AVOGADRO: f64 = 6.02214076e23;
pub const BOLTZMANN_SI: f64 = 1.380649e-23;
pub const ELEMENTARY_CHARGE_SI: f64 = 1.602176634e-19;

pub const DIMENSIONLESS: Unit = Unit::named("", 1.0, Dimension::DIMENSIONLESS);

pub const METER: Unit = Unit::named("m", 1.0, Dimension::LENGTH);
pub const NANOMETER: Unit = Unit::named("nm", 1e-9, Dimension::LENGTH);
pub const ANGSTROM: Unit = Unit::named("Å", 1e-10, Dimension::LENGTH);
pub const PICOMETER: Unit = Unit::named("pm", 1e-12, Dimension::LENGTH);
pub const BOHR: Unit = Unit::named("bohr", 5.29177210903e-11, Dimension::LENGTH);

pub const SECOND: Unit = Unit::named("s", 1.0, Dimension::TIME);
pub const NANOSECOND: Unit = Unit::named("ns", 1e-9, Dimension::TIME);
pub const PICOSECOND: Unit = Unit::named("ps", 1e-12, Dimension::TIME);
pub const FEMTOSECOND: Unit = Unit::named("fs", 1e-15, Dimension::TIME);

pub const KILOGRAM: Unit = Unit::named("kg", 1.0, Dimension::MASS);
pub const GRAM: Unit = Unit::named("g", 1e-3, Dimension::MASS);
pub const AMU: Unit = Unit::named("amu", 1.66053906660e-27, Dimension::MASS);

pub const JOULE: Unit = Unit::named("J", 1.0, Dimension::ENERGY);
pub const KILOJOULE: Unit = Unit::named("kJ", 1e3, Dimension::ENERGY);
pub const CALORIE: Unit = Unit::named("cal", 4.184, Dimension::ENERGY);
pub const KILOCALORIE: Unit = Unit::named("kcal", 4184.0, Dimension::ENERGY);
pub const ELECTRONVOLT: Unit = Unit::named("eV", ELEMENTARY_CHARGE_SI, Dimension::ENERGY);
pub const HARTREE: Unit = Unit::named("hartree", 4.3597447222071e-18, Dimension::ENERGY);

pub const MOLE: Unit = Unit::named("mol", AVOGADRO, Dimension::DIMENSIONLESS);
pub const KCAL_PER_MOL: Unit = Unit::named("kcal/mol", 4184.0 / AVOGADRO, Dimension::ENERGY);
pub const KJ_PER_MOL: Unit = Unit::named("kJ/mol", 1e3 / AVOGADRO, Dimension::ENERGY);

pub const COULOMB: Unit = Unit::named("C", 1.0, Dimension::CHARGE);
pub const ELEMENTARY_CHARGE: Unit = Unit::named("e", ELEMENTARY_CHARGE_SI, Dimension::CHARGE);

pub const KELVIN: Unit = Unit::named("K", 1.0, Dimension::TEMPERATURE);

pub const RADIAN: Unit = Unit::named("rad", 1.0, Dimension::DIMENSIONLESS);
pub const DEGREE: Unit = Unit::named("deg", std::f64::consts::PI / 180.0, Dimension::DIMENSIONLESS);
pub const FINE_STRUCTURE: Unit = Unit::named("alpha", 7.2973525693e-3, Dimension::DIMENSIONLESS);

/// Symbols accepted by the unit-expression parser, including common aliases.
static SYMBOLS: phf::Map<&'static str, &'static Unit> = phf_map! {
    "m" => &METER,
    "meter" => &METER,
    "nm" => &NANOMETER,
    "nanometer" => &NANOMETER,
    "Å" => &ANGSTROM,
    "ang" => &ANGSTROM,
    "angstrom" => &ANGSTROM,
    "pm" => &PICOMETER,
    "bohr" => &BOHR,
    "a0" => &BOHR,
    "s" => &SECOND,
    "second" => &SECOND,
    "ns" => &NANOSECOND,
    "ps" => &PICOSECOND,
    "fs" => &FEMTOSECOND,
    "femtosecond" => &FEMTOSECOND,
    "kg" => &KILOGRAM,
    "g" => &GRAM,
    "amu" => &AMU,
    "dalton" => &AMU,
    "Da" => &AMU,
    "J" => &JOULE,
    "kJ" => &KILOJOULE,
    "cal" => &CALORIE,
    "kcal" => &KILOCALORIE,
    "eV" => &ELECTRONVOLT,
    "hartree" => &HARTREE,
    "Eh" => &HARTREE,
    "mol" => &MOLE,
    "e" => &ELEMENTARY_CHARGE,
    "C" => &COULOMB,
    "K" => &KELVIN,
    "kelvin" => &KELVIN,
    "rad" => &RADIAN,
    "deg" => &DEGREE,
    "degree" => &DEGREE,
    "alpha" => &FINE_STRUCTURE,
};

pub fn lookup(symbol: &str) -> Option<&'static Unit> {
    SYMBOLS.get(symbol).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_the_same_unit() {
        assert_eq!(lookup("ang"), Some(&ANGSTROM));
        assert_eq!(lookup("angstrom"), Some(&ANGSTROM));
        assert_eq!(lookup("Å"), Some(&ANGSTROM));
        assert_eq!(lookup("Da"), Some(&AMU));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(lookup("K").is_some());
        assert!(lookup("k").is_none());
        assert!(lookup("furlong").is_none());
    }

    #[test]
    fn molar_energy_is_per_particle_energy() {
        let per_particle_joules = KCAL_PER_MOL.scale();
        assert!((per_particle_joules * AVOGADRO - 4184.0).abs() < 1e-9);
    }
}
