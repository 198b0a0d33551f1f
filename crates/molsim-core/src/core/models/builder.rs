use super::atom::Atom;
use super::chain::ChainType;
use super::error::ModelError;
use super::ids::{AtomId, ChainId, ResidueId};
use super::molecule::Molecule;
use super::topology::BondOrder;
use std::collections::HashMap;

/// Incremental construction of a [`Molecule`] in file order: chain, then residues, then
/// atoms, with bonds addressed by atom serial number.
///
/// Calls chain fluently. The first failure is remembered, later calls become no-ops, and
/// [`MoleculeBuilder::build`] reports it.
pub struct MoleculeBuilder {
    molecule: Molecule,

    // --- Builder-specific state for efficient construction ---
    atom_serial_map: HashMap<usize, AtomId>,
    current_chain: Option<ChainId>,
    current_residue: Option<ResidueId>,
    infer_chain_types: bool,
    error: Option<ModelError>,
}

impl MoleculeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            molecule: Molecule::new(name),
            atom_serial_map: HashMap::new(),
            current_chain: None,
            current_residue: None,
            infer_chain_types: false,
            error: None,
        }
    }

    /// Derive each chain's type from its residues when building, overriding the type given
    /// to [`MoleculeBuilder::start_chain`].
    pub fn infer_chain_types(&mut self, enabled: bool) -> &mut Self {
        self.infer_chain_types = enabled;
        self
    }

    /// Makes `name` the current chain, creating it on first use.
    pub fn start_chain(&mut self, name: &str, chain_type: ChainType) -> &mut Self {
        if self.error.is_none() {
            self.current_chain = Some(self.molecule.add_chain(name, chain_type));
            self.current_residue = None;
        }
        self
    }

    /// Makes the residue `(number, insertion_code)` of the current chain current, creating it
    /// on first use.
    pub fn start_residue(&mut self, number: isize, insertion_code: Option<char>, name: &str) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        let Some(chain_id) = self.current_chain else {
            return self.fail(ModelError::Builder("a chain must be started before a residue"));
        };
        let residue_id = match self.molecule.residue_id(chain_id, number, insertion_code) {
            Some(id) => Ok(id),
            None => self.molecule.add_residue(chain_id, number, insertion_code, name),
        };
        match residue_id {
            Ok(id) => self.current_residue = Some(id),
            Err(e) => return self.fail(e),
        }
        self
    }

    /// Adds an atom to the current residue, registering it under `atom.serial`.
    pub fn add_atom(&mut self, atom: Atom) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        let Some(residue_id) = self.current_residue else {
            return self.fail(ModelError::Builder("a residue must be started before an atom"));
        };
        let serial = atom.serial;
        match self.molecule.add_atom(residue_id, atom) {
            Ok(id) => {
                self.atom_serial_map.entry(serial).or_insert(id);
            }
            Err(e) => return self.fail(e),
        }
        self
    }

    pub fn atom_by_serial(&self, serial: usize) -> Option<AtomId> {
        self.atom_serial_map.get(&serial).copied()
    }

    pub fn add_bond(&mut self, serial1: usize, serial2: usize, order: BondOrder) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        let (Some(a), Some(b)) = (self.atom_by_serial(serial1), self.atom_by_serial(serial2)) else {
            return self.fail(ModelError::Builder("bond references an unknown atom serial"));
        };
        if let Err(e) = self.molecule.add_bond(a, b, order) {
            return self.fail(e);
        }
        self
    }

    fn fail(&mut self, error: ModelError) -> &mut Self {
        self.error.get_or_insert(error);
        self
    }

    pub fn build(self) -> Result<Molecule, ModelError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let mut molecule = self.molecule;
        if self.infer_chain_types {
            molecule.infer_chain_types();
        }
        Ok(molecule)
    }
}
