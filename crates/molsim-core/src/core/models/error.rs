use super::ids::{AtomId, ChainId, ResidueId};
use super::topology::BondOrder;
use crate::core::units::UnitError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Unknown element: {0}")]
    UnknownElement(String),

    #[error("Atoms are already bonded with order {existing}; requested {requested}")]
    ConflictingBondOrder {
        existing: BondOrder,
        requested: BondOrder,
    },

    #[error("An atom cannot be bonded to itself")]
    SelfBond,

    #[error("No bond between atoms {0:?} and {1:?}")]
    BondNotFound(AtomId, AtomId),

    #[error("Atom {0:?} does not belong to this molecule")]
    AtomNotFound(AtomId),

    #[error("Atom index {index} is out of range for {len} atoms")]
    AtomIndexOutOfRange { index: usize, len: usize },

    #[error("Atom mass must be positive and finite, found {0} amu")]
    NonPositiveMass(f64),

    #[error("Atom {0:?} appears more than once in the selection")]
    DuplicateAtomInView(AtomId),

    #[error("Chain '{0}' not found")]
    ChainNotFound(String),

    #[error("Residue {0:?} does not belong to this molecule")]
    ResidueNotFound(ResidueId),

    #[error("Residue index {index} is out of range for {len} residues")]
    ResidueIndexOutOfRange { index: usize, len: usize },

    #[error("Residue {number} (insertion code {insertion_code:?}) already exists in chain {chain:?}")]
    DuplicateResidue {
        chain: ChainId,
        number: isize,
        insertion_code: Option<char>,
    },

    #[error("Unknown residue query key '{0}' (expected 'type', 'name' or 'number')")]
    UnknownQueryKey(String),

    #[error("Invalid value '{value}' for residue query key '{key}'")]
    InvalidQueryValue { key: String, value: String },

    #[error("Builder error: {0}")]
    Builder(&'static str),

    #[error(transparent)]
    Units(#[from] UnitError),
}
