use super::defs::DIMENSIONLESS;
use super::dimension::Dimension;
use super::error::UnitError;
use super::unit::{Unit, relative_eq};
use nalgebra::{DVector, MatrixXx3, Vector3};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Div, Mul, Neg};
use std::str::FromStr;

/// Numeric payload that can carry a unit: a scalar or an nalgebra array.
pub trait Magnitude: Clone + fmt::Debug {
    fn scale_by(&self, factor: f64) -> Self;
    /// Returns `self + other * factor`.
    fn add_scaled(&self, other: &Self, factor: f64) -> Self;
    fn shape(&self) -> (usize, usize);
    fn approx_eq(&self, other: &Self) -> bool;
    fn is_finite(&self) -> bool;
}

impl Magnitude for f64 {
    fn scale_by(&self, factor: f64) -> Self {
        self * factor
    }

    fn add_scaled(&self, other: &Self, factor: f64) -> Self {
        self + other * factor
    }

    fn shape(&self) -> (usize, usize) {
        (1, 1)
    }

    fn approx_eq(&self, other: &Self) -> bool {
        relative_eq(*self, *other)
    }

    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }
}

macro_rules! impl_array_magnitude {
    ($ty:ty) => {
        impl Magnitude for $ty {
            fn scale_by(&self, factor: f64) -> Self {
                self * factor
            }

            fn add_scaled(&self, other: &Self, factor: f64) -> Self {
                self + other * factor
            }

            fn shape(&self) -> (usize, usize) {
                (self.nrows(), self.ncols())
            }

            fn approx_eq(&self, other: &Self) -> bool {
                self.nrows() == other.nrows()
                    && self.ncols() == other.ncols()
                    && self.iter().zip(other.iter()).all(|(a, b)| relative_eq(*a, *b))
            }

            fn is_finite(&self) -> bool {
                self.iter().all(|v| v.is_finite())
            }
        }
    };
}

impl_array_magnitude!(Vector3<f64>);
impl_array_magnitude!(MatrixXx3<f64>);
impl_array_magnitude!(DVector<f64>);

/// A magnitude tagged with a unit.
///
/// Addition, subtraction and comparison require matching dimensions and express the result
/// in the left operand's unit. Multiplication and division by scalar quantities combine
/// dimensions. There is intentionally no `f64 * Unit` operator; quantities are always built
/// explicitly with [`Quantity::new`] or [`quantity`].
#[derive(Debug, Clone)]
pub struct Quantity<M = f64> {
    value: M,
    unit: Unit,
}

pub fn quantity<M: Magnitude>(value: M, unit: Unit) -> Quantity<M> {
    Quantity::new(value, unit)
}

impl<M: Magnitude> Quantity<M> {
    pub fn new(value: M, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// The raw magnitude, expressed in [`Quantity::unit`].
    pub fn value(&self) -> &M {
        &self.value
    }

    pub fn into_value(self) -> M {
        self.value
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn dimension(&self) -> Dimension {
        self.unit.dimension()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.value.shape()
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    pub fn to(&self, target: &Unit) -> Result<Self, UnitError> {
        let factor = self.unit.conversion_factor(target)?;
        Ok(Self::new(self.value.scale_by(factor), target.clone()))
    }

    pub fn value_in(&self, target: &Unit) -> Result<M, UnitError> {
        let factor = self.unit.conversion_factor(target)?;
        Ok(self.value.scale_by(factor))
    }

    pub fn try_add(&self, other: &Self) -> Result<Self, UnitError> {
        let factor = self.operand_factor(other, "add")?;
        Ok(Self::new(
            self.value.add_scaled(&other.value, factor),
            self.unit.clone(),
        ))
    }

    pub fn try_sub(&self, other: &Self) -> Result<Self, UnitError> {
        let factor = self.operand_factor(other, "subtract")?;
        Ok(Self::new(
            self.value.add_scaled(&other.value, -factor),
            self.unit.clone(),
        ))
    }

    fn operand_factor(&self, other: &Self, operation: &'static str) -> Result<f64, UnitError> {
        if !self.unit.is_compatible(&other.unit) {
            return Err(UnitError::dimensionality(
                operation,
                self.dimension(),
                other.dimension(),
            ));
        }
        if self.shape() != other.shape() {
            return Err(UnitError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(other.unit.scale() / self.unit.scale())
    }
}

impl<M: Magnitude> PartialEq for Quantity<M> {
    fn eq(&self, other: &Self) -> bool {
        match self.operand_factor(other, "compare") {
            Ok(factor) => self.value.approx_eq(&other.value.scale_by(factor)),
            Err(_) => false,
        }
    }
}

impl<M: Magnitude> Mul<Quantity<f64>> for Quantity<M> {
    type Output = Quantity<M>;

    fn mul(self, rhs: Quantity<f64>) -> Self::Output {
        &self * &rhs
    }
}

impl<M: Magnitude> Mul<&Quantity<f64>> for &Quantity<M> {
    type Output = Quantity<M>;

    fn mul(self, rhs: &Quantity<f64>) -> Self::Output {
        Quantity::new(self.value.scale_by(rhs.value), &self.unit * &rhs.unit)
    }
}

impl<M: Magnitude> Div<Quantity<f64>> for Quantity<M> {
    type Output = Quantity<M>;

    fn div(self, rhs: Quantity<f64>) -> Self::Output {
        &self / &rhs
    }
}

impl<M: Magnitude> Div<&Quantity<f64>> for &Quantity<M> {
    type Output = Quantity<M>;

    fn div(self, rhs: &Quantity<f64>) -> Self::Output {
        Quantity::new(self.value.scale_by(1.0 / rhs.value), &self.unit / &rhs.unit)
    }
}

impl<M: Magnitude> Mul<f64> for Quantity<M> {
    type Output = Quantity<M>;

    fn mul(self, rhs: f64) -> Self::Output {
        Quantity::new(self.value.scale_by(rhs), self.unit)
    }
}

impl<M: Magnitude> Div<f64> for Quantity<M> {
    type Output = Quantity<M>;

    fn div(self, rhs: f64) -> Self::Output {
        Quantity::new(self.value.scale_by(1.0 / rhs), self.unit)
    }
}

impl<M: Magnitude> Neg for Quantity<M> {
    type Output = Quantity<M>;

    fn neg(self) -> Self::Output {
        Quantity::new(self.value.scale_by(-1.0), self.unit)
    }
}

impl<M: Magnitude + fmt::Display> fmt::Display for Quantity<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.symbol().is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}

impl Quantity<f64> {
    pub fn dimensionless(value: f64) -> Self {
        Self::new(value, DIMENSIONLESS)
    }

    /// Ratio of two quantities with the same dimension, as a plain number.
    pub fn ratio(&self, other: &Quantity<f64>) -> Result<f64, UnitError> {
        let factor = self.operand_factor(other, "divide")?;
        Ok(self.value / (other.value * factor))
    }

    pub fn dimensionless_value(&self) -> Result<f64, UnitError> {
        if !self.unit.is_dimensionless() {
            return Err(UnitError::NotDimensionless(self.dimension()));
        }
        Ok(self.value * self.unit.scale())
    }

    pub fn sqrt(&self) -> Result<Self, UnitError> {
        let dimension = self.dimension().root(2).ok_or(UnitError::OddExponent {
            dimension: self.dimension(),
            root: 2,
        })?;
        let symbol = match self.unit.symbol() {
            "" => String::new(),
            symbol => format!("sqrt({})", symbol),
        };
        Ok(Self::new(
            self.value.sqrt(),
            Unit::new(symbol, self.unit.scale().sqrt(), dimension),
        ))
    }

    pub fn powi(&self, n: i8) -> Self {
        Self::new(self.value.powi(n as i32), self.unit.powi(n))
    }

    pub fn abs(&self) -> Self {
        Self::new(self.value.abs(), self.unit.clone())
    }

    /// Floored remainder, expressed in the left operand's unit.
    pub fn try_rem(&self, other: &Quantity<f64>) -> Result<Self, UnitError> {
        let factor = self.operand_factor(other, "take the remainder of")?;
        let divisor = other.value * factor;
        let value = self.value - divisor * (self.value / divisor).floor();
        Ok(Self::new(value, self.unit.clone()))
    }

    pub fn try_partial_cmp(&self, other: &Quantity<f64>) -> Result<Option<Ordering>, UnitError> {
        let factor = self.operand_factor(other, "compare")?;
        if self.value.approx_eq(&(other.value * factor)) {
            return Ok(Some(Ordering::Equal));
        }
        Ok(self.value.partial_cmp(&(other.value * factor)))
    }
}

impl PartialOrd for Quantity<f64> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_partial_cmp(other).ok().flatten()
    }
}

impl FromStr for Quantity<f64> {
    type Err = UnitError;

    /// Parses `"<number> <unit expression>"`, e.g. `"1.0 kcal/mol/angstrom^2"`. A bare
    /// number is dimensionless.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (number, unit) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));
        let value: f64 = number
            .parse()
            .map_err(|_| UnitError::InvalidNumber(number.to_string()))?;
        Ok(Self::new(value, unit.parse()?))
    }
}

impl Serialize for Quantity<f64> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity<f64> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl Quantity<Vector3<f64>> {
    pub fn norm(&self) -> Quantity<f64> {
        Quantity::new(self.value.norm(), self.unit.clone())
    }

    pub fn component(&self, index: usize) -> Option<Quantity<f64>> {
        self.value
            .get(index)
            .map(|&v| Quantity::new(v, self.unit.clone()))
    }

    pub fn x(&self) -> Quantity<f64> {
        Quantity::new(self.value.x, self.unit.clone())
    }

    pub fn y(&self) -> Quantity<f64> {
        Quantity::new(self.value.y, self.unit.clone())
    }

    pub fn z(&self) -> Quantity<f64> {
        Quantity::new(self.value.z, self.unit.clone())
    }
}

/// Converts every member into the first member's unit, rejecting dimension mismatches.
fn unify<M: Magnitude>(items: impl IntoIterator<Item = Quantity<M>>) -> Result<(Unit, Vec<M>), UnitError> {
    let mut iter = items.into_iter();
    let first = iter.next().ok_or(UnitError::EmptyCollection)?;
    let unit = first.unit.clone();
    let mut values = vec![first.value];
    for (offset, item) in iter.enumerate() {
        if !item.unit.is_compatible(&unit) {
            return Err(UnitError::InconsistentUnits {
                expected: unit.dimension(),
                found: item.dimension(),
                index: offset + 1,
            });
        }
        values.push(item.value.scale_by(item.unit.scale() / unit.scale()));
    }
    Ok((unit, values))
}

impl Quantity<MatrixXx3<f64>> {
    pub fn empty(unit: Unit) -> Self {
        Self::new(MatrixXx3::zeros(0), unit)
    }

    /// Stacks per-atom vectors into an `N x 3` array in the first member's unit.
    pub fn stack(items: impl IntoIterator<Item = Quantity<Vector3<f64>>>) -> Result<Self, UnitError> {
        let (unit, rows) = unify(items)?;
        let matrix = MatrixXx3::from_fn(rows.len(), |i, j| rows[i][j]);
        Ok(Self::new(matrix, unit))
    }

    pub fn nrows(&self) -> usize {
        self.value.nrows()
    }

    pub fn row(&self, index: usize) -> Option<Quantity<Vector3<f64>>> {
        (index < self.nrows()).then(|| {
            Quantity::new(self.value.row(index).transpose(), self.unit.clone())
        })
    }

    pub fn get(&self, row: usize, column: usize) -> Option<Quantity<f64>> {
        self.value
            .get((row, column))
            .map(|&v| Quantity::new(v, self.unit.clone()))
    }

    pub fn rows(&self) -> impl Iterator<Item = Quantity<Vector3<f64>>> + '_ {
        self.value
            .row_iter()
            .map(|r| Quantity::new(r.transpose(), self.unit.clone()))
    }
}

impl Quantity<DVector<f64>> {
    pub fn empty(unit: Unit) -> Self {
        Self::new(DVector::zeros(0), unit)
    }

    pub fn stack(items: impl IntoIterator<Item = Quantity<f64>>) -> Result<Self, UnitError> {
        let (unit, values) = unify(items)?;
        Ok(Self::new(DVector::from_vec(values), unit))
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Quantity<f64>> {
        self.value
            .get(index)
            .map(|&v| Quantity::new(v, self.unit.clone()))
    }

    pub fn sum(&self) -> Quantity<f64> {
        Quantity::new(self.value.sum(), self.unit.clone())
    }
}
