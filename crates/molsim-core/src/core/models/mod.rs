//! # Core Models Module
//!
//! The molecular object model: atoms, bonds, residues, chains and the [`molecule::Molecule`]
//! that owns them all.
//!
//! ## Overview
//!
//! A molecule is the single owner of its atoms, residues, chains and bonds. Everything else
//! refers to them through the stable keys defined in [`ids`], or through borrowed views:
//!
//! - **Ownership** - Atoms moved into a molecule belong to it; copies are always deep
//! - **Stable handles** - Keys stay valid for the lifetime of the molecule
//! - **Dual indexing** - Chains and residues are reachable by insertion index and by name
//! - **Unit safety** - Public numeric values are [`crate::core::units::Quantity`] values
//!
//! ## Key Components
//!
//! - [`element`] - Periodic table with standard weights and isotope masses
//! - [`atom`] - Individual atom with position, velocity, mass and charge
//! - [`topology`] - Bonds and bond orders
//! - [`residue`] - Residues and their classification
//! - [`chain`] - Chains and chain types
//! - [`molecule`] - The complete molecular system
//! - [`collection`] - Atom views over a molecule and owned atom lists
//! - [`query`] - Residue selection by type, name or number
//! - [`builder`] - Incremental construction in file order
//!
//! ## Usage
//!
//! ```ignore
//! use molsim::core::models::{atom::Atom, molecule::Molecule, topology::BondOrder};
//!
//! let h1 = Atom::from_symbol("H")?.with_coords(Point3::new(0.5, 0.0, 0.0));
//! let h2 = Atom::from_symbol("H")?.with_coords(Point3::new(-0.5, 0.0, 0.0));
//! let mut molecule = Molecule::from_atoms("H2", vec![h1, h2]);
//! let ids = molecule.atom_ids().to_vec();
//! molecule.add_bond(ids[0], ids[1], BondOrder::Single)?;
//! ```

pub mod atom;
pub mod builder;
pub mod chain;
pub mod collection;
pub mod element;
pub mod error;
pub mod ids;
pub mod molecule;
pub mod query;
pub mod residue;
pub mod topology;
