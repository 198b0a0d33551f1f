use super::atom::Atom;
use super::chain::ChainType;
use super::error::ModelError;
use super::ids::AtomId;
use super::molecule::Molecule;
use super::residue::ResidueType;
use super::topology::BondOrder;
use crate::core::units::{AMU, ANGSTROM, Quantity, Unit, UnitError, UnitSystem};
use nalgebra::{DVector, MatrixXx3, Point3, Vector3};
use std::borrow::Cow;
use std::collections::HashMap;

/// Residue and chain membership carried by an atom outside of a molecule, so that a copied
/// selection can be regrouped when it is turned back into a molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueTag {
    pub chain_name: String,
    pub chain_type: ChainType,
    pub residue_name: String,
    pub residue_number: isize,
    pub insertion_code: Option<char>,
    pub residue_type: ResidueType,
}

/// Stacks per-atom quantities with [`Quantity::stack`]; an empty selection gives an empty array
/// in `unit`, the only case in which stacking can fail for values an atom reports itself.
fn stack_vectors<'b>(
    atoms: impl Iterator<Item = &'b Atom>,
    extract: impl Fn(&Atom) -> Quantity<Vector3<f64>>,
    unit: Unit,
) -> Quantity<MatrixXx3<f64>> {
    Quantity::<MatrixXx3<f64>>::stack(atoms.map(extract))
        .unwrap_or_else(|_| Quantity::<MatrixXx3<f64>>::empty(unit))
}

fn stack_masses<'b>(atoms: impl Iterator<Item = &'b Atom>) -> Quantity<DVector<f64>> {
    Quantity::<DVector<f64>>::stack(atoms.map(Atom::mass))
        .unwrap_or_else(|_| Quantity::<DVector<f64>>::empty(AMU))
}

/// Converts an `N x 3` array quantity into per-atom rows in `unit`, checking the row count.
fn rows_in(
    values: &Quantity<MatrixXx3<f64>>,
    expected: usize,
    unit: &Unit,
) -> Result<Vec<Vector3<f64>>, ModelError> {
    if values.nrows() != expected {
        return Err(UnitError::ShapeMismatch {
            left: (expected, 3),
            right: values.shape(),
        }
        .into());
    }
    let matrix = values.value_in(unit)?;
    Ok(matrix.row_iter().map(|r| r.transpose()).collect())
}

/// Read-only ordered view over atoms of a molecule.
#[derive(Debug, Clone)]
pub struct AtomView<'a> {
    molecule: &'a Molecule,
    ids: Cow<'a, [AtomId]>,
}

impl<'a> AtomView<'a> {
    pub(crate) fn new(molecule: &'a Molecule, ids: Cow<'a, [AtomId]>) -> Self {
        Self { molecule, ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[AtomId] {
        &self.ids
    }

    pub fn id_at(&self, index: usize) -> Option<AtomId> {
        self.ids.get(index).copied()
    }

    pub fn get(&self, index: usize) -> Option<&'a Atom> {
        self.id_at(index).and_then(|id| self.molecule.atom(id))
    }

    pub fn contains(&self, id: AtomId) -> bool {
        self.ids.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AtomId, &'a Atom)> + '_ {
        let molecule = self.molecule;
        self.ids
            .iter()
            .filter_map(move |&id| molecule.atom(id).map(|atom| (id, atom)))
    }

    fn atoms(&self) -> impl Iterator<Item = &'a Atom> + '_ {
        self.iter().map(|(_, atom)| atom)
    }

    pub fn positions(&self) -> Quantity<MatrixXx3<f64>> {
        stack_vectors(self.atoms(), Atom::position, ANGSTROM)
    }

    pub fn velocities(&self) -> Quantity<MatrixXx3<f64>> {
        stack_vectors(self.atoms(), Atom::velocity, UnitSystem::MOLECULAR.velocity())
    }

    pub fn momenta(&self) -> Quantity<MatrixXx3<f64>> {
        stack_vectors(self.atoms(), Atom::momentum, UnitSystem::MOLECULAR.momentum())
    }

    pub fn masses(&self) -> Quantity<DVector<f64>> {
        stack_masses(self.atoms())
    }

    pub fn kinetic_energy(&self) -> Quantity<f64> {
        let total: f64 = self.atoms().map(|a| *a.kinetic_energy().value()).sum();
        Quantity::new(total, UnitSystem::MOLECULAR.energy)
    }

    /// Mass-weighted centre of the atoms; the origin for an empty view.
    pub fn center_of_mass(&self) -> Quantity<Vector3<f64>> {
        let (weighted, total) = self.atoms().fold((Vector3::zeros(), 0.0), |(sum, m), a| {
            (sum + a.coords().coords * a.mass_raw(), m + a.mass_raw())
        });
        let center = if total > 0.0 { weighted / total } else { Vector3::zeros() };
        Quantity::new(center, ANGSTROM)
    }

    pub fn filter<F>(&self, mut predicate: F) -> AtomView<'a>
    where
        F: FnMut(&Atom) -> bool,
    {
        let ids = self
            .iter()
            .filter(|(_, atom)| predicate(atom))
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        AtomView::new(self.molecule, Cow::Owned(ids))
    }

    /// Deep copy of the selected atoms. Bonds between two selected atoms are kept, bonds
    /// leaving the selection are dropped, and each atom remembers its residue and chain.
    pub fn copy(&self) -> AtomList {
        let index_of: HashMap<AtomId, usize> =
            self.ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut list = AtomList::new();
        for (id, atom) in self.iter() {
            list.atoms.push(atom.clone());
            list.tags.push(self.molecule.residue_tag(id));
        }
        for bond in self.molecule.bonds() {
            if let (Some(&i), Some(&j)) = (index_of.get(&bond.atom1_id), index_of.get(&bond.atom2_id)) {
                list.bonds.push((i, j, bond.order));
            }
        }
        list
    }
}

/// Mutable ordered view over atoms of a molecule; bulk setters write through.
///
/// Setters validate shape and dimension before touching any atom, so a failed call leaves
/// the molecule unchanged.
#[derive(Debug)]
pub struct AtomViewMut<'a> {
    molecule: &'a mut Molecule,
    ids: Vec<AtomId>,
}

impl<'a> AtomViewMut<'a> {
    pub(crate) fn new(molecule: &'a mut Molecule, ids: Vec<AtomId>) -> Self {
        Self { molecule, ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[AtomId] {
        &self.ids
    }

    pub fn as_view(&self) -> AtomView<'_> {
        AtomView::new(&*self.molecule, Cow::Borrowed(&self.ids))
    }

    pub fn get(&self, index: usize) -> Option<&Atom> {
        self.ids.get(index).and_then(|&id| self.molecule.atom(id))
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Atom> {
        let id = *self.ids.get(index)?;
        self.molecule.atom_mut(id)
    }

    pub fn set_positions(&mut self, positions: &Quantity<MatrixXx3<f64>>) -> Result<(), ModelError> {
        let rows = rows_in(positions, self.ids.len(), &ANGSTROM)?;
        self.write_rows(rows, |atom, row| atom.set_coords(Point3::from(row)));
        Ok(())
    }

    pub fn set_velocities(&mut self, velocities: &Quantity<MatrixXx3<f64>>) -> Result<(), ModelError> {
        let rows = rows_in(velocities, self.ids.len(), &UnitSystem::MOLECULAR.velocity())?;
        self.write_rows(rows, |atom, row| atom.set_velocity_raw(row));
        Ok(())
    }

    pub fn set_momenta(&mut self, momenta: &Quantity<MatrixXx3<f64>>) -> Result<(), ModelError> {
        let rows = rows_in(momenta, self.ids.len(), &UnitSystem::MOLECULAR.momentum())?;
        let masses = self
            .ids
            .iter()
            .filter_map(|&id| self.molecule.atom(id))
            .map(Atom::checked_mass)
            .collect::<Result<Vec<_>, _>>()?;
        let velocities = rows.into_iter().zip(masses).map(|(row, mass)| row / mass).collect();
        self.write_rows(velocities, Atom::set_velocity_raw);
        Ok(())
    }

    /// Multiplies every momentum (and therefore velocity) by `factor`. Works on velocities
    /// directly, so massless atoms need no special case.
    pub fn scale_momenta(&mut self, factor: f64) {
        for &id in &self.ids {
            if let Some(atom) = self.molecule.atom_mut(id) {
                let scaled = atom.velocity_raw() * factor;
                atom.set_velocity_raw(scaled);
            }
        }
    }

    fn write_rows(&mut self, rows: Vec<Vector3<f64>>, mut write: impl FnMut(&mut Atom, Vector3<f64>)) {
        for (&id, row) in self.ids.iter().zip(rows) {
            if let Some(atom) = self.molecule.atom_mut(id) {
                write(atom, row);
            }
        }
    }
}

/// An owned, independent list of atoms with the bonds among them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomList {
    atoms: Vec<Atom>,
    tags: Vec<Option<ResidueTag>>,
    bonds: Vec<(usize, usize, BondOrder)>,
}

impl AtomList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_atoms(atoms: Vec<Atom>) -> Self {
        let tags = vec![None; atoms.len()];
        Self {
            atoms,
            tags,
            bonds: Vec::new(),
        }
    }

    pub fn push(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.tags.push(None);
        self.atoms.len() - 1
    }

    pub fn push_tagged(&mut self, atom: Atom, tag: ResidueTag) -> usize {
        self.atoms.push(atom);
        self.tags.push(Some(tag));
        self.atoms.len() - 1
    }

    /// Bonds two list members by index. Re-adding with the same order is a no-op.
    pub fn add_bond(&mut self, i: usize, j: usize, order: BondOrder) -> Result<(), ModelError> {
        let len = self.atoms.len();
        for index in [i, j] {
            if index >= len {
                return Err(ModelError::AtomIndexOutOfRange { index, len });
            }
        }
        if i == j {
            return Err(ModelError::SelfBond);
        }
        match self
            .bonds
            .iter()
            .find(|(a, b, _)| (*a == i && *b == j) || (*a == j && *b == i))
        {
            Some((_, _, existing)) if *existing == order => Ok(()),
            Some((_, _, existing)) => Err(ModelError::ConflictingBondOrder {
                existing: *existing,
                requested: order,
            }),
            None => {
                self.bonds.push((i, j, order));
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(index)
    }

    pub fn contains(&self, atom: &Atom) -> bool {
        self.atoms.contains(atom)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Atom> {
        self.atoms.iter()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn tag(&self, index: usize) -> Option<&ResidueTag> {
        self.tags.get(index).and_then(Option::as_ref)
    }

    pub fn bonds(&self) -> &[(usize, usize, BondOrder)] {
        &self.bonds
    }

    pub fn positions(&self) -> Quantity<MatrixXx3<f64>> {
        stack_vectors(self.atoms.iter(), Atom::position, ANGSTROM)
    }

    pub fn velocities(&self) -> Quantity<MatrixXx3<f64>> {
        stack_vectors(self.atoms.iter(), Atom::velocity, UnitSystem::MOLECULAR.velocity())
    }

    pub fn momenta(&self) -> Quantity<MatrixXx3<f64>> {
        stack_vectors(self.atoms.iter(), Atom::momentum, UnitSystem::MOLECULAR.momentum())
    }

    pub fn masses(&self) -> Quantity<DVector<f64>> {
        stack_masses(self.atoms.iter())
    }

    pub fn set_positions(&mut self, positions: &Quantity<MatrixXx3<f64>>) -> Result<(), ModelError> {
        let rows = rows_in(positions, self.atoms.len(), &ANGSTROM)?;
        for (atom, row) in self.atoms.iter_mut().zip(rows) {
            atom.set_coords(Point3::from(row));
        }
        Ok(())
    }

    pub(crate) fn into_parts(self) -> (Vec<Atom>, Vec<Option<ResidueTag>>, Vec<(usize, usize, BondOrder)>) {
        (self.atoms, self.tags, self.bonds)
    }
}

impl FromIterator<Atom> for AtomList {
    fn from_iter<I: IntoIterator<Item = Atom>>(iter: I) -> Self {
        Self::from_atoms(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AtomList {
    type Item = &'a Atom;
    type IntoIter = std::slice::Iter<'a, Atom>;

    fn into_iter(self) -> Self::IntoIter {
        self.atoms.iter()
    }
}
