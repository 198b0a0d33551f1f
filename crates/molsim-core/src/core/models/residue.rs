use super::ids::{AtomId, ChainId, ResidueId};
use phf::phf_map;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResidueType {
    Protein,
    Dna,
    Rna,
    Water,
    Ion,
    #[default]
    Unknown,
}

static RESIDUE_TYPES: phf::Map<&'static str, ResidueType> = phf_map! {
    "ALA" => ResidueType::Protein, "ARG" => ResidueType::Protein, "ASN" => ResidueType::Protein,
    "ASP" => ResidueType::Protein, "CYS" => ResidueType::Protein, "GLN" => ResidueType::Protein,
    "GLU" => ResidueType::Protein, "GLY" => ResidueType::Protein, "HIS" => ResidueType::Protein,
    "ILE" => ResidueType::Protein, "LEU" => ResidueType::Protein, "LYS" => ResidueType::Protein,
    "MET" => ResidueType::Protein, "PHE" => ResidueType::Protein, "PRO" => ResidueType::Protein,
    "SER" => ResidueType::Protein, "THR" => ResidueType::Protein, "TRP" => ResidueType::Protein,
    "TYR" => ResidueType::Protein, "VAL" => ResidueType::Protein, "HID" => ResidueType::Protein,
    "HIE" => ResidueType::Protein, "HIP" => ResidueType::Protein, "HSD" => ResidueType::Protein,
    "HSE" => ResidueType::Protein, "HSP" => ResidueType::Protein, "CYX" => ResidueType::Protein,
    "ASH" => ResidueType::Protein, "GLH" => ResidueType::Protein, "LYN" => ResidueType::Protein,
    "MSE" => ResidueType::Protein, "SEC" => ResidueType::Protein, "PYL" => ResidueType::Protein,
    "ACE" => ResidueType::Protein, "NME" => ResidueType::Protein,
    "DA" => ResidueType::Dna, "DC" => ResidueType::Dna, "DG" => ResidueType::Dna,
    "DT" => ResidueType::Dna, "DI" => ResidueType::Dna,
    "A" => ResidueType::Rna, "C" => ResidueType::Rna, "G" => ResidueType::Rna,
    "U" => ResidueType::Rna, "I" => ResidueType::Rna,
    "HOH" => ResidueType::Water, "WAT" => ResidueType::Water, "H2O" => ResidueType::Water,
    "SOL" => ResidueType::Water, "TIP" => ResidueType::Water, "TIP3" => ResidueType::Water,
    "DOD" => ResidueType::Water,
    "NA" => ResidueType::Ion, "K" => ResidueType::Ion, "CL" => ResidueType::Ion,
    "MG" => ResidueType::Ion, "CA" => ResidueType::Ion, "ZN" => ResidueType::Ion,
    "FE" => ResidueType::Ion, "FE2" => ResidueType::Ion, "MN" => ResidueType::Ion,
    "CU" => ResidueType::Ion, "CO" => ResidueType::Ion, "NI" => ResidueType::Ion,
    "CD" => ResidueType::Ion, "LI" => ResidueType::Ion, "RB" => ResidueType::Ion,
    "CS" => ResidueType::Ion, "BR" => ResidueType::Ion, "IOD" => ResidueType::Ion,
    "SOD" => ResidueType::Ion, "POT" => ResidueType::Ion, "CLA" => ResidueType::Ion,
};

impl ResidueType {
    /// Classifies a residue by its (case-insensitive) three-letter name. Anything not
    /// recognised as a polymer unit, water or ion is `Unknown`.
    pub fn classify(name: &str) -> Self {
        RESIDUE_TYPES
            .get(name.trim().to_ascii_uppercase().as_str())
            .copied()
            .unwrap_or_default()
    }

    pub fn is_polymer(&self) -> bool {
        matches!(self, Self::Protein | Self::Dna | Self::Rna)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid residue type: '{0}'")]
pub struct ParseResidueTypeError(pub String);

impl FromStr for ResidueType {
    type Err = ParseResidueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "protein" => Ok(Self::Protein),
            "dna" => Ok(Self::Dna),
            "rna" => Ok(Self::Rna),
            "water" => Ok(Self::Water),
            "ion" => Ok(Self::Ion),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseResidueTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for ResidueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Protein => "protein",
            Self::Dna => "dna",
            Self::Rna => "rna",
            Self::Water => "water",
            Self::Ion => "ion",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub(crate) id: ResidueId,
    pub name: String,
    pub number: isize,
    pub insertion_code: Option<char>,
    pub residue_type: ResidueType,
    pub(crate) chain_id: ChainId,
    pub(crate) atoms: Vec<AtomId>,
    atom_name_map: HashMap<String, AtomId>,
}

impl Residue {
    pub(crate) fn new(
        id: ResidueId,
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        residue_type: ResidueType,
        chain_id: ChainId,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            number,
            insertion_code,
            residue_type,
            chain_id,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    /// The first atom registered under a name wins the name lookup.
    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map
            .entry(atom_name.to_string())
            .or_insert(atom_id);
    }

    pub fn id(&self) -> ResidueId {
        self.id
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    fn dummy_residue(name: &str) -> Residue {
        Residue::new(
            ResidueId::from(KeyData::from_ffi(1)),
            7,
            None,
            name,
            ResidueType::classify(name),
            ChainId::from(KeyData::from_ffi(2)),
        )
    }

    #[test]
    fn classify_recognises_polymer_units_water_and_ions() {
        assert_eq!(ResidueType::classify("ALA"), ResidueType::Protein);
        assert_eq!(ResidueType::classify("gly"), ResidueType::Protein);
        assert_eq!(ResidueType::classify("DA"), ResidueType::Dna);
        assert_eq!(ResidueType::classify("U"), ResidueType::Rna);
        assert_eq!(ResidueType::classify("HOH"), ResidueType::Water);
        assert_eq!(ResidueType::classify("NA"), ResidueType::Ion);
        assert_eq!(ResidueType::classify("UNL"), ResidueType::Unknown);
        assert_eq!(ResidueType::classify("HEM"), ResidueType::Unknown);
    }

    #[test]
    fn residue_type_round_trips_through_strings() {
        for kind in [
            ResidueType::Protein,
            ResidueType::Dna,
            ResidueType::Rna,
            ResidueType::Water,
            ResidueType::Ion,
            ResidueType::Unknown,
        ] {
            assert_eq!(kind.to_string().parse::<ResidueType>().unwrap(), kind);
        }
        assert!("lipid".parse::<ResidueType>().is_err());
    }

    #[test]
    fn add_atom_records_order_and_name() {
        let mut residue = dummy_residue("SER");
        residue.add_atom("CA", dummy_atom_id(10));
        residue.add_atom("CB", dummy_atom_id(11));
        assert_eq!(residue.atoms(), &[dummy_atom_id(10), dummy_atom_id(11)]);
        assert_eq!(residue.atom_id_by_name("CB"), Some(dummy_atom_id(11)));
        assert_eq!(residue.atom_id_by_name("OG"), None);
        assert_eq!(residue.residue_type, ResidueType::Protein);
    }

    #[test]
    fn duplicate_names_keep_the_first_atom() {
        let mut residue = dummy_residue("HOH");
        residue.add_atom("H", dummy_atom_id(1));
        residue.add_atom("H", dummy_atom_id(2));
        assert_eq!(residue.num_atoms(), 2);
        assert_eq!(residue.atom_id_by_name("H"), Some(dummy_atom_id(1)));
    }
}
