use super::dimension::Dimension;
use super::error::UnitError;
use super::parse::parse_unit_expression;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::ops::{Div, Mul};
use std::str::FromStr;

/// Relative tolerance used when comparing scales and converted magnitudes.
pub const RELATIVE_TOLERANCE: f64 = 1e-12;

pub(crate) fn relative_eq(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= RELATIVE_TOLERANCE * a.abs().max(b.abs())
}

/// A unit of measure: a display symbol, the factor that converts one of this unit into SI
/// base units, and the physical dimension.
///
/// Two units are equal when they share a dimension and agree on scale, regardless of the
/// symbol they are displayed with (`kcal/mol` built from parts equals the named constant).
#[derive(Debug, Clone)]
pub struct Unit {
    symbol: Cow<'static, str>,
    scale: f64,
    dimension: Dimension,
}

impl Unit {
    pub const fn named(symbol: &'static str, scale: f64, dimension: Dimension) -> Self {
        Self {
            symbol: Cow::Borrowed(symbol),
            scale,
            dimension,
        }
    }

    pub fn new(symbol: impl Into<Cow<'static, str>>, scale: f64, dimension: Dimension) -> Self {
        Self {
            symbol: symbol.into(),
            scale,
            dimension,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    /// Factor that converts a magnitude in `self` into a magnitude in `target`.
    pub fn conversion_factor(&self, target: &Unit) -> Result<f64, UnitError> {
        if !self.is_compatible(target) {
            return Err(UnitError::dimensionality(
                "convert",
                self.dimension,
                target.dimension,
            ));
        }
        Ok(self.scale / target.scale)
    }

    /// # Panics
    ///
    /// When a dimension exponent leaves the `i8` range; see [`Unit::checked_powi`].
    pub fn powi(&self, n: i8) -> Unit {
        self.with_power(n, self.dimension.powi(n))
    }

    pub fn checked_powi(&self, n: i8) -> Result<Unit, UnitError> {
        let dimension = self.dimension.checked_powi(n).ok_or_else(|| UnitError::ExponentOverflow {
            dimension: self.dimension,
            operation: format!("raised to the power {n}"),
        })?;
        Ok(self.with_power(n, dimension))
    }

    pub fn checked_mul(&self, rhs: &Unit) -> Result<Unit, UnitError> {
        let dimension = self
            .dimension
            .checked_mul(rhs.dimension)
            .ok_or_else(|| UnitError::ExponentOverflow {
                dimension: self.dimension,
                operation: format!("multiplied by {}", rhs.dimension),
            })?;
        Ok(self.combine(rhs, '*', dimension))
    }

    pub fn checked_div(&self, rhs: &Unit) -> Result<Unit, UnitError> {
        let dimension = self
            .dimension
            .checked_div(rhs.dimension)
            .ok_or_else(|| UnitError::ExponentOverflow {
                dimension: self.dimension,
                operation: format!("divided by {}", rhs.dimension),
            })?;
        Ok(self.combine(rhs, '/', dimension))
    }

    fn with_power(&self, n: i8, dimension: Dimension) -> Unit {
        let symbol = match n {
            1 => self.symbol.clone(),
            _ if self.symbol.is_empty() => Cow::Borrowed(""),
            _ => Cow::Owned(format!("{}^{}", wrap(&self.symbol, &['*', '/', '^']), n)),
        };
        Unit {
            symbol,
            scale: self.scale.powi(n as i32),
            dimension,
        }
    }

    fn combine(&self, rhs: &Unit, op: char, dimension: Dimension) -> Unit {
        let scale = if op == '*' {
            self.scale * rhs.scale
        } else {
            self.scale / rhs.scale
        };
        Unit {
            symbol: Cow::Owned(compose(&self.symbol, op, &rhs.symbol)),
            scale,
            dimension,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<Cow<'static, str>>) -> Self {
        self.symbol = symbol.into();
        self
    }
}

fn wrap<'a>(symbol: &'a str, separators: &[char]) -> Cow<'a, str> {
    if symbol.contains(separators) {
        Cow::Owned(format!("({})", symbol))
    } else {
        Cow::Borrowed(symbol)
    }
}

fn compose(left: &str, op: char, right: &str) -> String {
    match (left.is_empty(), right.is_empty(), op) {
        (_, true, _) => left.to_string(),
        (true, false, '*') => right.to_string(),
        (true, false, _) => format!("1/{}", wrap(right, &['*', '/'])),
        (false, false, '*') => format!("{}*{}", left, wrap(right, &['/'])),
        (false, false, _) => format!("{}/{}", left, wrap(right, &['*', '/'])),
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension && relative_eq(self.scale, other.scale)
    }
}

impl Mul for &Unit {
    type Output = Unit;

    fn mul(self, rhs: &Unit) -> Unit {
        self.combine(rhs, '*', self.dimension * rhs.dimension)
    }
}

impl Mul for Unit {
    type Output = Unit;

    fn mul(self, rhs: Unit) -> Unit {
        &self * &rhs
    }
}

impl Div for &Unit {
    type Output = Unit;

    fn div(self, rhs: &Unit) -> Unit {
        self.combine(rhs, '/', self.dimension / rhs.dimension)
    }
}

impl Div for Unit {
    type Output = Unit;

    fn div(self, rhs: Unit) -> Unit {
        &self / &rhs
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_unit_expression(s)
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.symbol)
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
