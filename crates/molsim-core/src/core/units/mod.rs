//! Unit-checked physical quantities.
//!
//! A [`Quantity`] couples a magnitude (scalar or nalgebra array) with a [`Unit`]; a unit
//! carries a [`Dimension`] and a scale to SI. Mixing incompatible dimensions is an error, not
//! a silent bug. Named units live in [`defs`] and are also reachable through the
//! expression parser (`"kcal/mol/angstrom^2".parse::<Unit>()`).

pub mod defs;
mod dimension;
mod error;
mod parse;
mod quantity;
pub mod system;
mod unit;

pub use defs::*;
pub use dimension::Dimension;
pub use error::UnitError;
pub use parse::parse_unit_expression;
pub use quantity::{Magnitude, Quantity, quantity};
pub use system::{UnitSystem, boltzmann_constant};
pub use unit::{RELATIVE_TOLERANCE, Unit};
