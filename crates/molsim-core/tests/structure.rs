use molsim::core::io::pdb::{PdbFile, PdbMetadata};
use molsim::core::io::traits::StructureFile;
use molsim::core::models::atom::Atom;
use molsim::core::models::chain::ChainType;
use molsim::core::models::molecule::Molecule;
use molsim::core::models::query::{ResidueFilter, ResidueQuery};
use molsim::core::models::residue::ResidueType;
use molsim::core::models::topology::BondOrder;
use molsim::core::units::{ANGSTROM, NANOMETER, Quantity};
use nalgebra::Vector3;
use std::io::Cursor;

const PEPTIDE_WITH_WATER: &str = "\
HEADER    PEPTIDE                                 01-JAN-00   2PEP
ATOM      1  N   MET A   1      -1.000   0.500   0.000  1.00  0.00           N
ATOM      2  CA  MET A   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      3  C   MET A   1       1.400   0.300   0.000  1.00  0.00           C
ATOM      4  N   LYS A   2       2.000   1.400   0.000  1.00  0.00           N
ATOM      5  CA  LYS A   2       3.400   1.600   0.000  1.00  0.00           C
ATOM      6  N   GLY A   3       4.000   2.800   0.000  1.00  0.00           N
TER       7      GLY A   3
ATOM      8  N   ALA B   1      10.000   0.000   0.000  1.00  0.00           N
ATOM      9  CA  ALA B   1      11.400   0.000   0.000  1.00  0.00           C
TER      10      ALA B   1
HETATM   11  O   HOH W   1      20.000   0.000   0.000  1.00  0.00           O
HETATM   12  O   HOH W   2      23.000   0.000   0.000  1.00  0.00           O
CONECT    1    2
CONECT    2    1    3
CONECT    3    2    4
CONECT    4    3    5
END
";

fn load() -> (Molecule, PdbMetadata) {
    PdbFile::read_from(&mut Cursor::new(PEPTIDE_WITH_WATER.as_bytes())).unwrap()
}

fn h2() -> Molecule {
    let a = Atom::from_symbol("H")
        .unwrap()
        .with_position(&Quantity::new(Vector3::new(0.5, 0.0, 0.0), ANGSTROM))
        .unwrap();
    let b = Atom::from_symbol("H")
        .unwrap()
        .with_position(&Quantity::new(Vector3::new(-0.5, 0.0, 0.0), ANGSTROM))
        .unwrap();
    let mut molecule = Molecule::from_atoms("H2", vec![a, b]);
    let ids = molecule.atom_ids().to_vec();
    molecule.add_bond(ids[0], ids[1], BondOrder::Single).unwrap();
    molecule
}

#[test]
fn hydrogen_molecule_geometry() {
    let molecule = h2();
    let ids = molecule.atom_ids().to_vec();
    assert_eq!(molecule.distance(ids[0], ids[1]).unwrap(), Quantity::new(1.0, ANGSTROM));
    assert_eq!(molecule.distance(ids[0], ids[1]).unwrap(), Quantity::new(0.1, NANOMETER));
    assert_eq!(molecule.atom_at(1).unwrap().x(), Quantity::new(-0.5, ANGSTROM));
    assert_eq!(molecule.bonded_neighbors(ids[1]).unwrap(), &[ids[0]]);
    assert_eq!(molecule.bond_between(ids[1], ids[0]).unwrap().order, BondOrder::Single);
}

#[test]
fn copies_are_independent() {
    let original = h2();
    let mut copy = Molecule::from_molecule(&original);
    let copied_id = copy.atom_ids()[0];
    copy.atom_mut(copied_id)
        .unwrap()
        .set_x(&Quantity::new(3.0, ANGSTROM))
        .unwrap();
    assert_eq!(original.atom_at(0).unwrap().x(), Quantity::new(0.5, ANGSTROM));
    assert_eq!(copy.atom_at(0).unwrap().x(), Quantity::new(3.0, ANGSTROM));
    assert_eq!(copy.num_bonds(), 1);

    let mut list = original.atoms().copy();
    list.get_mut(1)
        .unwrap()
        .set_x(&Quantity::new(-9.0, ANGSTROM))
        .unwrap();
    assert_eq!(original.atom_at(1).unwrap().x(), Quantity::new(-0.5, ANGSTROM));
    assert_eq!(list.bonds().len(), 1);

    let mut lone = original.atom_at(0).unwrap().clone();
    lone.set_x(&Quantity::new(7.0, ANGSTROM)).unwrap();
    assert_eq!(original.atom_at(0).unwrap().x(), Quantity::new(0.5, ANGSTROM));
}

#[test]
fn chain_indexing_agrees_with_names() {
    let (molecule, _) = load();
    let chains = molecule.chains();
    assert_eq!(chains.len(), 3);
    for (index, name) in ["A", "B", "W"].iter().enumerate() {
        let by_index = chains.get(index).unwrap();
        let by_name = chains.by_name(name).unwrap();
        assert!(std::ptr::eq(by_index, by_name));
        assert_eq!(molecule.get_chain(name).unwrap().id(), by_index.id());
    }
    let counts: Vec<usize> = chains.iter().map(|c| c.num_residues()).collect();
    assert_eq!(counts, vec![3, 1, 2]);
    assert_eq!(molecule.num_residues(), 6);
    assert_eq!(molecule.get_chain("W").unwrap().chain_type, ChainType::Water);
    assert!(molecule.get_chain("Z").is_err());
    assert!(molecule.residue_at(6).is_err());
}

#[test]
fn residue_queries_are_complete() {
    let (molecule, _) = load();
    let chain_a = molecule.get_chain("A").unwrap().id();

    let lysine = ResidueQuery::new().with(ResidueFilter::Name("LYS".to_string()));
    let hits = molecule.query_residues(chain_a, &lysine).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(molecule.residue(hits[0]).unwrap().number, 2);

    let protein: ResidueQuery = ResidueQuery::from_pairs([("type", "protein")]).unwrap();
    assert_eq!(molecule.query_residues(chain_a, &protein).unwrap().len(), 3);

    let dna = ResidueQuery::new().with(ResidueFilter::Type(ResidueType::Dna));
    assert!(molecule.query_residues(chain_a, &dna).unwrap().is_empty());

    let waters = molecule
        .query_chain("W", &ResidueQuery::from_pairs([("name", "HOH")]).unwrap())
        .unwrap();
    assert_eq!(waters.len(), 2);

    assert!(ResidueQuery::from_pairs([("colour", "red")]).is_err());
    assert!(ResidueQuery::from_pairs([("number", "twelve")]).is_err());
}

#[test]
fn residue_selection_becomes_a_molecule() {
    let (molecule, _) = load();
    let met = molecule.residue_at(0).unwrap().id();
    let view = molecule.residue_atoms(met).unwrap();
    assert_eq!(view.len(), 3);

    let extracted = Molecule::from_residue(&molecule, met).unwrap();
    assert_eq!(extracted.num_atoms(), 3);
    assert_eq!(extracted.num_bonds(), 2);
    assert_eq!(extracted.num_chains(), 1);
    assert_eq!(extracted.residue_at(0).unwrap().name, "MET");
}

#[test]
fn pdb_round_trip_through_a_file() {
    let (molecule, metadata) = load();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("peptide.pdb");
    PdbFile::write_to_path(&molecule, &metadata, &path).unwrap();

    let (reloaded, reloaded_metadata) = PdbFile::read_from_path(&path).unwrap();
    assert_eq!(reloaded.name(), molecule.name());
    assert_eq!(reloaded_metadata.header_lines, metadata.header_lines);
    assert_eq!(reloaded.num_atoms(), molecule.num_atoms());
    assert_eq!(reloaded.num_bonds(), molecule.num_bonds());
    assert_eq!(reloaded.num_chains(), molecule.num_chains());
    assert_eq!(reloaded.num_residues(), molecule.num_residues());
    assert_eq!(reloaded.positions(), molecule.positions());
    let names: Vec<&str> = reloaded.residues().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["MET", "LYS", "GLY", "ALA", "HOH", "HOH"]);
}

#[test]
fn unnamed_structures_take_the_file_stem() {
    let text = "ATOM      1  CA  GLY A   1       0.000   0.000   0.000  1.00  0.00           C\nEND\n";
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glycine.pdb");
    std::fs::write(&path, text).unwrap();
    let (molecule, _) = PdbFile::read_from_path(&path).unwrap();
    assert_eq!(molecule.name(), "glycine");
}
