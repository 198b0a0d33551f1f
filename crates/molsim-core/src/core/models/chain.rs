use super::ids::{ChainId, ResidueId};
use super::residue::ResidueType;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChainType {
    Protein,
    Dna,
    Rna,
    Ligand,
    Water,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid chain type: '{0}'")]
pub struct ParseChainTypeError(pub String);

impl ChainType {
    /// Derives a chain type from the types of its residues: the first polymer type wins,
    /// an all-water chain is `Water`, unclassified small molecules make a `Ligand` chain.
    pub fn infer<I: IntoIterator<Item = ResidueType>>(residue_types: I) -> Self {
        let mut saw_water = false;
        let mut saw_unknown = false;
        let mut saw_any = false;
        for residue_type in residue_types {
            saw_any = true;
            match residue_type {
                ResidueType::Protein => return Self::Protein,
                ResidueType::Dna => return Self::Dna,
                ResidueType::Rna => return Self::Rna,
                ResidueType::Water => saw_water = true,
                ResidueType::Unknown => saw_unknown = true,
                ResidueType::Ion => {}
            }
        }
        match (saw_any, saw_unknown, saw_water) {
            (false, _, _) => Self::Other,
            (true, true, _) => Self::Ligand,
            (true, false, true) => Self::Water,
            (true, false, false) => Self::Other,
        }
    }
}

impl FromStr for ChainType {
    type Err = ParseChainTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "protein" => Ok(Self::Protein),
            "dna" => Ok(Self::Dna),
            "rna" => Ok(Self::Rna),
            "ligand" => Ok(Self::Ligand),
            "water" => Ok(Self::Water),
            "other" => Ok(Self::Other),
            _ => Err(ParseChainTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Protein => "Protein",
            Self::Dna => "DNA",
            Self::Rna => "RNA",
            Self::Ligand => "Ligand",
            Self::Water => "Water",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub(crate) id: ChainId,
    pub name: String,
    pub chain_type: ChainType,
    pub(crate) residues: Vec<ResidueId>,
}

impl Chain {
    pub(crate) fn new(id: ChainId, name: &str, chain_type: ChainType) -> Self {
        Self {
            id,
            name: name.to_string(),
            chain_type,
            residues: Vec::new(),
        }
    }

    pub fn id(&self) -> ChainId {
        self.id
    }

    pub fn residues(&self) -> &[ResidueId] {
        &self.residues
    }

    pub fn num_residues(&self) -> usize {
        self.residues.len()
    }
}
