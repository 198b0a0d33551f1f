use super::ids::AtomId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid bond order: '{0}'")]
pub struct ParseBondOrderError(pub String);

impl BondOrder {
    /// Numeric bond order; aromatic bonds count as 1.5.
    pub fn value(&self) -> f64 {
        match self {
            Self::Single => 1.0,
            Self::Double => 2.0,
            Self::Triple => 3.0,
            Self::Aromatic => 1.5,
        }
    }
}

impl TryFrom<u8> for BondOrder {
    type Error = ParseBondOrderError;

    fn try_from(order: u8) -> Result<Self, Self::Error> {
        match order {
            1 => Ok(Self::Single),
            2 => Ok(Self::Double),
            3 => Ok(Self::Triple),
            other => Err(ParseBondOrderError(other.to_string())),
        }
    }
}

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError(s.to_string())),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Single => "Single",
            Self::Double => "Double",
            Self::Triple => "Triple",
            Self::Aromatic => "Aromatic",
        };
        f.write_str(name)
    }
}

/// An undirected bond. The molecule stores each bond once; `atom1_id`/`atom2_id` order
/// carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1_id: AtomId,
    pub atom2_id: AtomId,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom1_id: AtomId, atom2_id: AtomId, order: BondOrder) -> Self {
        Self {
            atom1_id,
            atom2_id,
            order,
        }
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        self.atom1_id == atom_id || self.atom2_id == atom_id
    }

    pub fn connects(&self, a: AtomId, b: AtomId) -> bool {
        (self.atom1_id == a && self.atom2_id == b) || (self.atom1_id == b && self.atom2_id == a)
    }

    /// The other endpoint, or `None` if `atom_id` is not part of this bond.
    pub fn partner(&self, atom_id: AtomId) -> Option<AtomId> {
        if self.atom1_id == atom_id {
            Some(self.atom2_id)
        } else if self.atom2_id == atom_id {
            Some(self.atom1_id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn bond_order_parses_names_abbreviations_and_integers() {
        assert_eq!("1".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("S".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("double".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("3".parse::<BondOrder>().unwrap(), BondOrder::Triple);
        assert_eq!("AR".parse::<BondOrder>().unwrap(), BondOrder::Aromatic);
        assert!("4".parse::<BondOrder>().is_err());
        assert!("".parse::<BondOrder>().is_err());
    }

    #[test]
    fn bond_order_from_integer_accepts_one_to_three() {
        assert_eq!(BondOrder::try_from(2).unwrap(), BondOrder::Double);
        assert!(BondOrder::try_from(0).is_err());
        assert!(BondOrder::try_from(4).is_err());
    }

    #[test]
    fn bond_order_defaults_to_single() {
        assert_eq!(BondOrder::default(), BondOrder::Single);
        assert_eq!(BondOrder::Aromatic.value(), 1.5);
    }

    #[test]
    fn bond_is_visible_from_both_ends() {
        let a = dummy_atom_id(1);
        let b = dummy_atom_id(2);
        let c = dummy_atom_id(3);
        let bond = Bond::new(a, b, BondOrder::Double);
        assert!(bond.contains(a) && bond.contains(b));
        assert!(!bond.contains(c));
        assert!(bond.connects(b, a));
        assert_eq!(bond.partner(a), Some(b));
        assert_eq!(bond.partner(b), Some(a));
        assert_eq!(bond.partner(c), None);
    }
}
