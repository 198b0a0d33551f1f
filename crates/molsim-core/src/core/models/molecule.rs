use super::atom::Atom;
use super::chain::{Chain, ChainType};
use super::collection::{AtomList, AtomView, AtomViewMut, ResidueTag};
use super::error::ModelError;
use super::ids::{AtomId, ChainId, ResidueId};
use super::query::ResidueQuery;
use super::residue::{Residue, ResidueType};
use super::topology::{Bond, BondOrder};
use crate::core::forcefield::EnergyModel;
use crate::core::units::{FEMTOSECOND, Quantity, UnitSystem};
use crate::engine::integrators::Integrator;
use nalgebra::{DVector, MatrixXx3, Point3, Vector3};
use slotmap::{SecondaryMap, SlotMap};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub(crate) const SYNTHETIC_RESIDUE_NAME: &str = "UNL";

/// A complete molecular system: the ownership root for atoms, residues, chains and bonds,
/// together with the simulation clock and the optionally attached energy model and
/// integrator.
///
/// Atoms, residues and chains live in slot-map arenas and are referred to by the
/// [`AtomId`], [`ResidueId`] and [`ChainId`] keys those arenas hand out. Insertion order is
/// tracked separately, so integer indexing (`atom_at`, `chains().get`, `residue_at`) is
/// stable and agrees with name lookups.
///
/// Every bond is stored once in the bond list and mirrored in a per-atom adjacency table;
/// both are updated together so a bond is visible from either endpoint.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    name: String,
    atoms: SlotMap<AtomId, Atom>,
    atom_order: Vec<AtomId>,
    atom_index: SecondaryMap<AtomId, usize>,
    atom_residue: SecondaryMap<AtomId, ResidueId>,
    residues: SlotMap<ResidueId, Residue>,
    residue_key_map: HashMap<(ChainId, isize, Option<char>), ResidueId>,
    chains: SlotMap<ChainId, Chain>,
    chain_order: Vec<ChainId>,
    chain_name_map: HashMap<String, ChainId>,
    bonds: Vec<Bond>,
    bond_adjacency: SecondaryMap<AtomId, Vec<AtomId>>,
    /// Simulation clock in fs.
    time: f64,
    pub(crate) energy_model: Option<Arc<dyn EnergyModel>>,
    pub(crate) integrator: Option<Arc<dyn Integrator>>,
}

impl Molecule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builds a molecule from bare atoms, grouping them into a single synthetic chain `"A"`
    /// holding one residue named `UNL`.
    pub fn from_atoms(name: impl Into<String>, atoms: Vec<Atom>) -> Self {
        Self::from_atom_list(name, AtomList::from_atoms(atoms))
    }

    /// Builds a molecule from an owned atom list.
    ///
    /// Tagged atoms are regrouped into chains and residues in order of first appearance;
    /// untagged atoms are collected in a synthetic `UNL` residue on a chain with an unused
    /// name. The list's internal bonds are carried over.
    pub fn from_atom_list(name: impl Into<String>, list: AtomList) -> Self {
        let mut molecule = Self::new(name);
        let (atoms, tags, bonds) = list.into_parts();

        let synthetic_tag = tags.iter().any(Option::is_none).then(|| ResidueTag {
            chain_name: free_chain_name(&tags),
            chain_type: ChainType::Other,
            residue_name: SYNTHETIC_RESIDUE_NAME.to_string(),
            residue_number: 1,
            insertion_code: None,
            residue_type: ResidueType::Unknown,
        });

        let mut ids = Vec::with_capacity(atoms.len());
        for (atom, tag) in atoms.into_iter().zip(tags) {
            let residue_id = match tag.as_ref().or(synthetic_tag.as_ref()) {
                Some(tag) => molecule.ensure_residue(tag),
                None => continue,
            };
            ids.push(molecule.insert_atom(residue_id, atom));
        }
        for (i, j, order) in bonds {
            if let (Some(&a), Some(&b)) = (ids.get(i), ids.get(j)) {
                molecule.insert_bond(a, b, order);
            }
        }
        molecule
    }

    /// Deep copy with fresh arenas. The copy keeps the clock and shares the attached energy
    /// model and integrator, which are immutable once attached.
    pub fn from_molecule(other: &Molecule) -> Self {
        let mut molecule = Self::from_atom_list(other.name.clone(), other.atoms().copy());
        molecule.time = other.time;
        molecule.energy_model = other.energy_model.clone();
        molecule.integrator = other.integrator.clone();
        molecule
    }

    /// Builds a new molecule from a subset of this molecule's atoms.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the new molecule.
    /// * `ids` - Atoms to copy, in the order they should appear in the new molecule.
    ///
    /// # Return
    ///
    /// A molecule whose chains and residues are restricted to the copied atoms and whose
    /// bonds are those between copied atoms. No energy model or integrator is attached.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AtomNotFound`] or [`ModelError::DuplicateAtomInView`] for an
    /// invalid selection.
    pub fn extract(&self, name: impl Into<String>, ids: &[AtomId]) -> Result<Self, ModelError> {
        Ok(Self::from_atom_list(name, self.view(ids)?.copy()))
    }

    /// Builds a new molecule, named after the residue, from one residue of `source`.
    pub fn from_residue(source: &Molecule, residue_id: ResidueId) -> Result<Self, ModelError> {
        let residue = source
            .residue(residue_id)
            .ok_or(ModelError::ResidueNotFound(residue_id))?;
        source.extract(residue.name.clone(), residue.atoms())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn num_atoms(&self) -> usize {
        self.atom_order.len()
    }

    pub fn num_residues(&self) -> usize {
        self.residues.len()
    }

    pub fn num_chains(&self) -> usize {
        self.chain_order.len()
    }

    pub fn num_bonds(&self) -> usize {
        self.bonds.len()
    }

    /// Simulation clock.
    pub fn time(&self) -> Quantity<f64> {
        Quantity::new(self.time, FEMTOSECOND)
    }

    pub(crate) fn time_raw(&self) -> f64 {
        self.time
    }

    pub(crate) fn advance_time(&mut self, dt: f64) {
        self.time += dt;
    }

    pub(crate) fn set_time_raw(&mut self, time: f64) {
        self.time = time;
    }

    // --- Chains and residues ---

    /// Adds a chain, or returns the existing chain with the same name.
    pub fn add_chain(&mut self, name: &str, chain_type: ChainType) -> ChainId {
        if let Some(&id) = self.chain_name_map.get(name) {
            return id;
        }
        let id = self
            .chains
            .insert_with_key(|id| Chain::new(id, name, chain_type));
        self.chain_order.push(id);
        self.chain_name_map.insert(name.to_string(), id);
        id
    }

    /// Adds a residue to the end of a chain. Residue type is classified from the name.
    ///
    /// # Errors
    ///
    /// [`ModelError::ChainNotFound`] for an unknown chain, [`ModelError::DuplicateResidue`]
    /// when the chain already holds a residue with the same number and insertion code.
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        number: isize,
        insertion_code: Option<char>,
        name: &str,
    ) -> Result<ResidueId, ModelError> {
        if !self.chains.contains_key(chain_id) {
            return Err(ModelError::ChainNotFound(format!("{:?}", chain_id)));
        }
        if self
            .residue_key_map
            .contains_key(&(chain_id, number, insertion_code))
        {
            return Err(ModelError::DuplicateResidue {
                chain: chain_id,
                number,
                insertion_code,
            });
        }
        Ok(self.insert_residue(
            chain_id,
            number,
            insertion_code,
            name,
            ResidueType::classify(name),
        ))
    }

    fn insert_residue(
        &mut self,
        chain_id: ChainId,
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        residue_type: ResidueType,
    ) -> ResidueId {
        let id = self.residues.insert_with_key(|id| {
            Residue::new(id, number, insertion_code, name, residue_type, chain_id)
        });
        self.residue_key_map
            .insert((chain_id, number, insertion_code), id);
        if let Some(chain) = self.chains.get_mut(chain_id) {
            chain.residues.push(id);
        }
        id
    }

    fn ensure_residue(&mut self, tag: &ResidueTag) -> ResidueId {
        let chain_id = self.add_chain(&tag.chain_name, tag.chain_type);
        match self
            .residue_key_map
            .get(&(chain_id, tag.residue_number, tag.insertion_code))
        {
            Some(&id) => id,
            None => self.insert_residue(
                chain_id,
                tag.residue_number,
                tag.insertion_code,
                &tag.residue_name,
                tag.residue_type,
            ),
        }
    }

    pub fn residue_id(
        &self,
        chain_id: ChainId,
        number: isize,
        insertion_code: Option<char>,
    ) -> Option<ResidueId> {
        self.residue_key_map
            .get(&(chain_id, number, insertion_code))
            .copied()
    }

    /// Re-derives each chain's type from its residues.
    pub fn infer_chain_types(&mut self) {
        for &chain_id in &self.chain_order {
            let types: Vec<ResidueType> = self.chains[chain_id]
                .residues
                .iter()
                .filter_map(|&r| self.residues.get(r).map(|res| res.residue_type))
                .collect();
            if let Some(chain) = self.chains.get_mut(chain_id) {
                chain.chain_type = ChainType::infer(types);
            }
        }
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    pub fn chains(&self) -> Chains<'_> {
        Chains { molecule: self }
    }

    pub fn get_chain(&self, name: &str) -> Result<&Chain, ModelError> {
        self.chains()
            .by_name(name)
            .ok_or_else(|| ModelError::ChainNotFound(name.to_string()))
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    /// Residues in molecule order: chain by chain, each chain in its own order.
    pub fn residues(&self) -> Residues<'_> {
        let order = self
            .chain_order
            .iter()
            .filter_map(|&c| self.chains.get(c))
            .flat_map(|chain| chain.residues.iter().copied())
            .collect();
        Residues {
            molecule: self,
            order,
        }
    }

    pub fn residue_at(&self, index: usize) -> Result<&Residue, ModelError> {
        let residues = self.residues();
        let len = residues.len();
        residues
            .get(index)
            .ok_or(ModelError::ResidueIndexOutOfRange { index, len })
    }

    pub fn residue_atoms(&self, residue_id: ResidueId) -> Result<AtomView<'_>, ModelError> {
        let residue = self
            .residues
            .get(residue_id)
            .ok_or(ModelError::ResidueNotFound(residue_id))?;
        Ok(AtomView::new(self, Cow::Borrowed(residue.atoms())))
    }

    /// Residues of `chain_id` matching every filter of `query`, in chain order.
    pub fn query_residues(
        &self,
        chain_id: ChainId,
        query: &ResidueQuery,
    ) -> Result<Vec<ResidueId>, ModelError> {
        let chain = self
            .chains
            .get(chain_id)
            .ok_or_else(|| ModelError::ChainNotFound(format!("{:?}", chain_id)))?;
        Ok(chain
            .residues
            .iter()
            .copied()
            .filter(|&id| self.residues.get(id).is_some_and(|r| query.matches(r)))
            .collect())
    }

    /// Like [`Molecule::query_residues`], addressing the chain by name.
    pub fn query_chain(&self, name: &str, query: &ResidueQuery) -> Result<Vec<&Residue>, ModelError> {
        let chain_id = self.get_chain(name)?.id();
        let ids = self.query_residues(chain_id, query)?;
        Ok(ids.into_iter().filter_map(|id| self.residues.get(id)).collect())
    }

    // --- Atoms ---

    /// Appends an atom to a residue and to the end of the molecule's atom order.
    pub fn add_atom(&mut self, residue_id: ResidueId, atom: Atom) -> Result<AtomId, ModelError> {
        if !self.residues.contains_key(residue_id) {
            return Err(ModelError::ResidueNotFound(residue_id));
        }
        Ok(self.insert_atom(residue_id, atom))
    }

    fn insert_atom(&mut self, residue_id: ResidueId, atom: Atom) -> AtomId {
        let name = atom.name.clone();
        let id = self.atoms.insert(atom);
        self.atom_index.insert(id, self.atom_order.len());
        self.atom_order.push(id);
        self.atom_residue.insert(id, residue_id);
        self.bond_adjacency.insert(id, Vec::new());
        if let Some(residue) = self.residues.get_mut(residue_id) {
            residue.add_atom(&name, id);
        }
        id
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    pub fn atom_at(&self, index: usize) -> Result<&Atom, ModelError> {
        self.atom_order
            .get(index)
            .and_then(|&id| self.atoms.get(id))
            .ok_or(ModelError::AtomIndexOutOfRange {
                index,
                len: self.atom_order.len(),
            })
    }

    pub fn atom_ids(&self) -> &[AtomId] {
        &self.atom_order
    }

    /// Position of an atom in the molecule's atom order.
    pub fn atom_index(&self, id: AtomId) -> Option<usize> {
        self.atom_index.get(id).copied()
    }

    pub fn atom_residue(&self, id: AtomId) -> Option<&Residue> {
        self.atom_residue
            .get(id)
            .and_then(|&residue_id| self.residues.get(residue_id))
    }

    pub fn atom_chain(&self, id: AtomId) -> Option<&Chain> {
        self.atom_residue(id)
            .and_then(|residue| self.chains.get(residue.chain_id))
    }

    pub(crate) fn residue_tag(&self, id: AtomId) -> Option<ResidueTag> {
        let residue = self.atom_residue(id)?;
        let chain = self.chains.get(residue.chain_id)?;
        Some(ResidueTag {
            chain_name: chain.name.clone(),
            chain_type: chain.chain_type,
            residue_name: residue.name.clone(),
            residue_number: residue.number,
            insertion_code: residue.insertion_code,
            residue_type: residue.residue_type,
        })
    }

    pub fn atoms(&self) -> AtomView<'_> {
        AtomView::new(self, Cow::Borrowed(&self.atom_order))
    }

    pub fn atoms_mut(&mut self) -> AtomViewMut<'_> {
        let ids = self.atom_order.clone();
        AtomViewMut::new(self, ids)
    }

    pub fn view(&self, ids: &[AtomId]) -> Result<AtomView<'_>, ModelError> {
        self.validate_selection(ids)?;
        Ok(AtomView::new(self, Cow::Owned(ids.to_vec())))
    }

    pub fn view_mut(&mut self, ids: &[AtomId]) -> Result<AtomViewMut<'_>, ModelError> {
        self.validate_selection(ids)?;
        Ok(AtomViewMut::new(self, ids.to_vec()))
    }

    fn validate_selection(&self, ids: &[AtomId]) -> Result<(), ModelError> {
        let mut seen = HashSet::with_capacity(ids.len());
        for &id in ids {
            if !self.atoms.contains_key(id) {
                return Err(ModelError::AtomNotFound(id));
            }
            if !seen.insert(id) {
                return Err(ModelError::DuplicateAtomInView(id));
            }
        }
        Ok(())
    }

    pub fn positions(&self) -> Quantity<MatrixXx3<f64>> {
        self.atoms().positions()
    }

    pub fn set_positions(&mut self, positions: &Quantity<MatrixXx3<f64>>) -> Result<(), ModelError> {
        self.atoms_mut().set_positions(positions)
    }

    pub fn velocities(&self) -> Quantity<MatrixXx3<f64>> {
        self.atoms().velocities()
    }

    pub fn set_velocities(&mut self, velocities: &Quantity<MatrixXx3<f64>>) -> Result<(), ModelError> {
        self.atoms_mut().set_velocities(velocities)
    }

    pub fn momenta(&self) -> Quantity<MatrixXx3<f64>> {
        self.atoms().momenta()
    }

    pub fn set_momenta(&mut self, momenta: &Quantity<MatrixXx3<f64>>) -> Result<(), ModelError> {
        self.atoms_mut().set_momenta(momenta)
    }

    pub fn masses(&self) -> Quantity<DVector<f64>> {
        self.atoms().masses()
    }

    pub fn kinetic_energy(&self) -> Quantity<f64> {
        self.atoms().kinetic_energy()
    }

    pub fn distance(&self, a: AtomId, b: AtomId) -> Result<Quantity<f64>, ModelError> {
        let atom_a = self.atoms.get(a).ok_or(ModelError::AtomNotFound(a))?;
        let atom_b = self.atoms.get(b).ok_or(ModelError::AtomNotFound(b))?;
        Ok(atom_a.distance(atom_b))
    }

    pub(crate) fn raw_positions(&self) -> Vec<Point3<f64>> {
        self.atom_order
            .iter()
            .filter_map(|&id| self.atoms.get(id))
            .map(Atom::coords)
            .collect()
    }

    pub(crate) fn raw_velocities(&self) -> Vec<Vector3<f64>> {
        self.atom_order
            .iter()
            .filter_map(|&id| self.atoms.get(id))
            .map(Atom::velocity_raw)
            .collect()
    }

    pub(crate) fn raw_masses(&self) -> Vec<f64> {
        self.atom_order
            .iter()
            .filter_map(|&id| self.atoms.get(id))
            .map(Atom::mass_raw)
            .collect()
    }

    /// Writes positions (Å) and velocities (Å/fs) back in atom order.
    pub(crate) fn set_raw_state(&mut self, positions: &[Point3<f64>], velocities: &[Vector3<f64>]) {
        for ((&id, position), velocity) in self.atom_order.iter().zip(positions).zip(velocities) {
            if let Some(atom) = self.atoms.get_mut(id) {
                atom.set_coords(*position);
                atom.set_velocity_raw(*velocity);
            }
        }
    }

    pub(crate) fn raw_kinetic_energy(velocities: &[Vector3<f64>], masses: &[f64]) -> f64 {
        let twice: f64 = velocities
            .iter()
            .zip(masses)
            .map(|(v, m)| m * v.norm_squared())
            .sum();
        0.5 * twice * UnitSystem::MOLECULAR.kinetic_to_energy()
    }

    // --- Bonds ---

    /// Bonds two atoms.
    ///
    /// Adding a bond that already exists with the same order is a no-op; a different order
    /// is rejected with [`ModelError::ConflictingBondOrder`] (use
    /// [`Molecule::replace_bond`] to change it). An atom cannot bond to itself.
    pub fn add_bond(&mut self, a: AtomId, b: AtomId, order: BondOrder) -> Result<(), ModelError> {
        self.check_bond_endpoints(a, b)?;
        match self.bond_between(a, b) {
            Some(bond) if bond.order == order => Ok(()),
            Some(bond) => Err(ModelError::ConflictingBondOrder {
                existing: bond.order,
                requested: order,
            }),
            None => {
                self.insert_bond(a, b, order);
                Ok(())
            }
        }
    }

    /// Sets the order of a bond, creating it if absent.
    pub fn replace_bond(&mut self, a: AtomId, b: AtomId, order: BondOrder) -> Result<(), ModelError> {
        self.check_bond_endpoints(a, b)?;
        match self.bonds.iter_mut().find(|bond| bond.connects(a, b)) {
            Some(bond) => bond.order = order,
            None => self.insert_bond(a, b, order),
        }
        Ok(())
    }

    fn check_bond_endpoints(&self, a: AtomId, b: AtomId) -> Result<(), ModelError> {
        for id in [a, b] {
            if !self.atoms.contains_key(id) {
                return Err(ModelError::AtomNotFound(id));
            }
        }
        if a == b {
            return Err(ModelError::SelfBond);
        }
        Ok(())
    }

    fn insert_bond(&mut self, a: AtomId, b: AtomId, order: BondOrder) {
        self.bonds.push(Bond::new(a, b, order));
        if let Some(neighbors) = self.bond_adjacency.get_mut(a) {
            neighbors.push(b);
        }
        if let Some(neighbors) = self.bond_adjacency.get_mut(b) {
            neighbors.push(a);
        }
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bond_between(&self, a: AtomId, b: AtomId) -> Option<&Bond> {
        self.bonds.iter().find(|bond| bond.connects(a, b))
    }

    pub fn bonds_of(&self, id: AtomId) -> impl Iterator<Item = &Bond> + '_ {
        self.bonds.iter().filter(move |bond| bond.contains(id))
    }

    pub fn bonded_neighbors(&self, id: AtomId) -> Option<&[AtomId]> {
        self.bond_adjacency.get(id).map(|v| v.as_slice())
    }

    /// Bonds as pairs of positions in the atom order.
    pub fn bond_indices(&self) -> Vec<(usize, usize, BondOrder)> {
        self.bonds
            .iter()
            .filter_map(|bond| {
                let i = self.atom_index(bond.atom1_id)?;
                let j = self.atom_index(bond.atom2_id)?;
                Some((i, j, bond.order))
            })
            .collect()
    }
}

fn free_chain_name(tags: &[Option<ResidueTag>]) -> String {
    let used: HashSet<&str> = tags
        .iter()
        .flatten()
        .map(|tag| tag.chain_name.as_str())
        .collect();
    ('A'..='Z')
        .map(String::from)
        .chain((1..).map(|n| format!("X{}", n)))
        .find(|candidate| !used.contains(candidate.as_str()))
        .unwrap_or_default()
}

/// Ordered, name-addressable view of a molecule's chains.
#[derive(Debug, Clone, Copy)]
pub struct Chains<'a> {
    molecule: &'a Molecule,
}

impl<'a> Chains<'a> {
    pub fn len(&self) -> usize {
        self.molecule.chain_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.molecule.chain_order.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Chain> {
        let molecule = self.molecule;
        molecule
            .chain_order
            .get(index)
            .and_then(|&id| molecule.chains.get(id))
    }

    pub fn by_name(&self, name: &str) -> Option<&'a Chain> {
        let molecule = self.molecule;
        molecule
            .chain_name_map
            .get(name)
            .and_then(|&id| molecule.chains.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Chain> + 'a {
        let molecule = self.molecule;
        molecule
            .chain_order
            .iter()
            .filter_map(move |&id| molecule.chains.get(id))
    }
}

/// Residues of a molecule in chain order.
#[derive(Debug, Clone)]
pub struct Residues<'a> {
    molecule: &'a Molecule,
    order: Vec<ResidueId>,
}

impl<'a> Residues<'a> {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[ResidueId] {
        &self.order
    }

    pub fn get(&self, index: usize) -> Option<&'a Residue> {
        let molecule = self.molecule;
        self.order
            .get(index)
            .and_then(|&id| molecule.residues.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Residue> + '_ {
        let molecule = self.molecule;
        self.order
            .iter()
            .filter_map(move |&id| molecule.residues.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::query::ResidueFilter;
    use crate::core::units::{ANGSTROM, NANOMETER};

    fn hydrogen_at(x: f64) -> Atom {
        Atom::from_symbol("H").unwrap().with_coords(Point3::new(x, 0.0, 0.0))
    }

    fn dihydrogen() -> Molecule {
        let mut molecule = Molecule::from_atoms("h2", vec![hydrogen_at(0.5), hydrogen_at(-0.5)]);
        let ids = molecule.atom_ids().to_vec();
        molecule.add_bond(ids[0], ids[1], BondOrder::Single).unwrap();
        molecule
    }

    fn create_two_chain_molecule() -> Molecule {
        let mut molecule = Molecule::new("complex");
        let a = molecule.add_chain("A", ChainType::Protein);
        let b = molecule.add_chain("B", ChainType::Water);
        let gly = molecule.add_residue(a, 1, None, "GLY").unwrap();
        let ala = molecule.add_residue(a, 2, None, "ALA").unwrap();
        let hoh = molecule.add_residue(b, 101, None, "HOH").unwrap();
        for (residue, name, symbol, x) in [
            (gly, "N", "N", 0.0),
            (gly, "CA", "C", 1.5),
            (ala, "N", "N", 3.0),
            (ala, "CA", "C", 4.5),
            (hoh, "O", "O", 10.0),
        ] {
            let atom = Atom::from_symbol(symbol)
                .unwrap()
                .with_name(name)
                .with_coords(Point3::new(x, 0.0, 0.0));
            molecule.add_atom(residue, atom).unwrap();
        }
        let ids = molecule.atom_ids().to_vec();
        molecule.add_bond(ids[0], ids[1], BondOrder::Single).unwrap();
        molecule.add_bond(ids[1], ids[2], BondOrder::Single).unwrap();
        molecule.add_bond(ids[2], ids[3], BondOrder::Single).unwrap();
        molecule
    }

    mod construction {
        use super::*;

        #[test]
        fn from_atoms_creates_one_synthetic_chain_and_residue() {
            let molecule = dihydrogen();
            assert_eq!(molecule.num_atoms(), 2);
            assert_eq!(molecule.num_chains(), 1);
            assert_eq!(molecule.num_residues(), 1);
            let chain = molecule.chains().get(0).unwrap();
            assert_eq!(chain.name, "A");
            assert_eq!(molecule.residue_at(0).unwrap().name, SYNTHETIC_RESIDUE_NAME);
        }

        #[test]
        fn add_chain_is_idempotent_by_name() {
            let mut molecule = Molecule::new("m");
            let first = molecule.add_chain("A", ChainType::Protein);
            let second = molecule.add_chain("A", ChainType::Water);
            assert_eq!(first, second);
            assert_eq!(molecule.num_chains(), 1);
        }

        #[test]
        fn add_residue_rejects_duplicates_and_unknown_chains() {
            let mut molecule = create_two_chain_molecule();
            let chain_a = molecule.get_chain("A").unwrap().id();
            assert!(matches!(
                molecule.add_residue(chain_a, 1, None, "GLY"),
                Err(ModelError::DuplicateResidue { number: 1, .. })
            ));
            assert!(molecule.add_residue(chain_a, 1, Some('A'), "GLY").is_ok());

            let mut other = Molecule::new("other");
            let foreign = other.add_chain("Z", ChainType::Other);
            let mut empty = Molecule::new("empty");
            assert!(matches!(
                empty.add_residue(foreign, 1, None, "GLY"),
                Err(ModelError::ChainNotFound(_))
            ));
        }

        #[test]
        fn residue_types_are_classified_on_insert() {
            let molecule = create_two_chain_molecule();
            let types: Vec<ResidueType> = molecule.residues().iter().map(|r| r.residue_type).collect();
            assert_eq!(
                types,
                vec![ResidueType::Protein, ResidueType::Protein, ResidueType::Water]
            );
        }

        #[test]
        fn infer_chain_types_uses_residue_types() {
            let mut molecule = create_two_chain_molecule();
            molecule.infer_chain_types();
            assert_eq!(molecule.get_chain("A").unwrap().chain_type, ChainType::Protein);
            assert_eq!(molecule.get_chain("B").unwrap().chain_type, ChainType::Water);
        }
    }

    mod indexing {
        use super::*;

        #[test]
        fn integer_and_name_indexing_agree() {
            let molecule = create_two_chain_molecule();
            let by_index = molecule.chains().get(0).unwrap();
            let by_name = molecule.chains().by_name("A").unwrap();
            assert!(std::ptr::eq(by_index, by_name));
            assert!(std::ptr::eq(molecule.chains().get(1).unwrap(), molecule.get_chain("B").unwrap()));
        }

        #[test]
        fn missing_chain_and_residue_index_are_errors() {
            let molecule = create_two_chain_molecule();
            assert_eq!(
                molecule.get_chain("Q").unwrap_err(),
                ModelError::ChainNotFound("Q".to_string())
            );
            assert_eq!(
                molecule.residue_at(3).unwrap_err(),
                ModelError::ResidueIndexOutOfRange { index: 3, len: 3 }
            );
            assert!(molecule.atom_at(5).is_err());
        }

        #[test]
        fn residues_follow_chain_order() {
            let molecule = create_two_chain_molecule();
            let names: Vec<&str> = molecule.residues().iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, vec!["GLY", "ALA", "HOH"]);
            assert_eq!(molecule.get_chain("A").unwrap().num_residues(), 2);
        }

        #[test]
        fn atoms_know_their_residue_and_chain() {
            let molecule = create_two_chain_molecule();
            let water_oxygen = molecule.atom_ids()[4];
            assert_eq!(molecule.atom_residue(water_oxygen).unwrap().name, "HOH");
            assert_eq!(molecule.atom_chain(water_oxygen).unwrap().name, "B");
            assert_eq!(molecule.atom_index(water_oxygen), Some(4));
            let gly = molecule.residue_at(0).unwrap();
            assert_eq!(gly.atom_id_by_name("CA"), Some(molecule.atom_ids()[1]));
        }
    }

    mod bonds {
        use super::*;

        #[test]
        fn bond_is_visible_from_both_ends() {
            let molecule = dihydrogen();
            let ids = molecule.atom_ids();
            assert_eq!(molecule.bonded_neighbors(ids[0]), Some(&[ids[1]][..]));
            assert_eq!(molecule.bonded_neighbors(ids[1]), Some(&[ids[0]][..]));
            assert_eq!(molecule.bonds_of(ids[1]).count(), 1);
            assert_eq!(molecule.bond_between(ids[1], ids[0]).unwrap().order, BondOrder::Single);
        }

        #[test]
        fn re_adding_the_same_bond_is_idempotent() {
            let mut molecule = dihydrogen();
            let ids = molecule.atom_ids().to_vec();
            molecule.add_bond(ids[1], ids[0], BondOrder::Single).unwrap();
            assert_eq!(molecule.num_bonds(), 1);
            assert_eq!(molecule.bonded_neighbors(ids[0]).unwrap().len(), 1);
        }

        #[test]
        fn conflicting_order_requires_replace() {
            let mut molecule = dihydrogen();
            let ids = molecule.atom_ids().to_vec();
            assert_eq!(
                molecule.add_bond(ids[0], ids[1], BondOrder::Double),
                Err(ModelError::ConflictingBondOrder {
                    existing: BondOrder::Single,
                    requested: BondOrder::Double
                })
            );
            molecule.replace_bond(ids[0], ids[1], BondOrder::Double).unwrap();
            assert_eq!(molecule.bond_between(ids[0], ids[1]).unwrap().order, BondOrder::Double);
            assert_eq!(molecule.num_bonds(), 1);
        }

        #[test]
        fn self_bonds_are_rejected() {
            let mut molecule = dihydrogen();
            let id = molecule.atom_ids()[0];
            assert_eq!(molecule.add_bond(id, id, BondOrder::Single), Err(ModelError::SelfBond));
        }

        #[test]
        fn bond_indices_follow_atom_order() {
            let molecule = create_two_chain_molecule();
            assert_eq!(
                molecule.bond_indices(),
                vec![
                    (0, 1, BondOrder::Single),
                    (1, 2, BondOrder::Single),
                    (2, 3, BondOrder::Single)
                ]
            );
        }
    }

    mod copies {
        use super::*;

        #[test]
        fn from_molecule_is_a_deep_independent_copy() {
            let original = create_two_chain_molecule();
            let mut copy = Molecule::from_molecule(&original);
            assert_eq!(copy.num_atoms(), original.num_atoms());
            assert_eq!(copy.num_residues(), 3);
            assert_eq!(copy.num_bonds(), 3);
            assert_eq!(copy.positions(), original.positions());

            let first = copy.atom_ids()[0];
            copy.atom_mut(first)
                .unwrap()
                .set_x(&Quantity::new(-7.0, ANGSTROM))
                .unwrap();
            assert_eq!(original.atom_at(0).unwrap().x(), Quantity::new(0.0, ANGSTROM));
        }

        #[test]
        fn extract_restricts_bonds_and_grouping_to_the_subset() {
            let original = create_two_chain_molecule();
            let ids = original.atom_ids();
            let subset = original.extract("fragment", &[ids[3], ids[4]]).unwrap();
            assert_eq!(subset.num_atoms(), 2);
            assert_eq!(subset.num_chains(), 2);
            assert_eq!(subset.num_residues(), 2);
            assert_eq!(subset.num_bonds(), 0);
            assert_eq!(subset.residue_at(0).unwrap().name, "ALA");
        }

        #[test]
        fn extract_rejects_duplicate_selection() {
            let original = create_two_chain_molecule();
            let id = original.atom_ids()[0];
            assert_eq!(
                original.extract("dup", &[id, id]).unwrap_err(),
                ModelError::DuplicateAtomInView(id)
            );
        }

        #[test]
        fn from_residue_copies_a_single_residue() {
            let original = create_two_chain_molecule();
            let ala = original.residue_at(1).unwrap().id();
            let residue = Molecule::from_residue(&original, ala).unwrap();
            assert_eq!(residue.name(), "ALA");
            assert_eq!(residue.num_atoms(), 2);
            assert_eq!(residue.num_bonds(), 1);
        }

        #[test]
        fn untagged_atoms_get_a_free_chain_name() {
            let original = create_two_chain_molecule();
            let mut list = original.atoms().copy();
            list.push(hydrogen_at(20.0));
            let merged = Molecule::from_atom_list("merged", list);
            assert_eq!(merged.num_chains(), 3);
            assert_eq!(merged.chains().get(2).unwrap().name, "C");
        }
    }

    mod queries {
        use super::*;

        #[test]
        fn query_returns_matches_in_chain_order() {
            let molecule = create_two_chain_molecule();
            let chain_a = molecule.get_chain("A").unwrap().id();
            let query = ResidueQuery::new().with(ResidueFilter::Type(ResidueType::Protein));
            let ids = molecule.query_residues(chain_a, &query).unwrap();
            assert_eq!(ids.len(), 2);
            assert_eq!(molecule.residue(ids[1]).unwrap().name, "ALA");
        }

        #[test]
        fn query_without_matches_is_empty() {
            let molecule = create_two_chain_molecule();
            let query = ResidueQuery::from_pairs([("type", "dna")]).unwrap();
            assert!(molecule.query_chain("A", &query).unwrap().is_empty());
        }

        #[test]
        fn residue_atoms_compose_with_views() {
            let molecule = create_two_chain_molecule();
            let gly = molecule.residue_at(0).unwrap().id();
            let atoms = molecule.residue_atoms(gly).unwrap();
            assert_eq!(atoms.len(), 2);
            assert_eq!(atoms.positions().get(1, 0).unwrap(), Quantity::new(0.15, NANOMETER));
        }
    }

    mod state {
        use super::*;

        #[test]
        fn distance_between_dihydrogen_atoms_is_one_angstrom() {
            let molecule = dihydrogen();
            let ids = molecule.atom_ids();
            assert_eq!(molecule.distance(ids[0], ids[1]).unwrap(), Quantity::new(1.0, ANGSTROM));
            assert_eq!(molecule.atom_at(1).unwrap().x(), Quantity::new(-0.5, ANGSTROM));
        }

        #[test]
        fn clock_starts_at_zero_and_advances() {
            let mut molecule = dihydrogen();
            assert_eq!(molecule.time(), Quantity::new(0.0, FEMTOSECOND));
            molecule.advance_time(0.5);
            molecule.advance_time(0.5);
            assert_eq!(molecule.time(), Quantity::new(1.0, FEMTOSECOND));
        }

        #[test]
        fn raw_state_round_trips_in_atom_order() {
            let mut molecule = dihydrogen();
            let positions = vec![Point3::new(1.0, 2.0, 3.0), Point3::new(-1.0, 0.0, 0.0)];
            let velocities = vec![Vector3::new(0.1, 0.0, 0.0), Vector3::zeros()];
            molecule.set_raw_state(&positions, &velocities);
            assert_eq!(molecule.raw_positions(), positions);
            assert_eq!(molecule.raw_velocities(), velocities);
            assert_eq!(molecule.raw_masses().len(), 2);
        }
    }
}
