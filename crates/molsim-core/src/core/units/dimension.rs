use std::fmt;
use std::ops::{Div, Mul};

const BASE_NAMES: [&str; 5] = ["length", "mass", "time", "charge", "temperature"];

/// Physical dimension as an exponent vector over the base dimensions
/// (length, mass, time, charge, temperature).
///
/// Amount of substance is deliberately absent: `mol` is treated as the dimensionless
/// Avogadro count, which makes molar energies such as kcal/mol plain energies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension([i8; 5]);

impl Dimension {
    pub const DIMENSIONLESS: Self = Self::new(0, 0, 0, 0, 0);
    pub const LENGTH: Self = Self::new(1, 0, 0, 0, 0);
    pub const MASS: Self = Self::new(0, 1, 0, 0, 0);
    pub const TIME: Self = Self::new(0, 0, 1, 0, 0);
    pub const CHARGE: Self = Self::new(0, 0, 0, 1, 0);
    pub const TEMPERATURE: Self = Self::new(0, 0, 0, 0, 1);
    pub const VELOCITY: Self = Self::new(1, 0, -1, 0, 0);
    pub const ACCELERATION: Self = Self::new(1, 0, -2, 0, 0);
    pub const MOMENTUM: Self = Self::new(1, 1, -1, 0, 0);
    pub const FORCE: Self = Self::new(1, 1, -2, 0, 0);
    pub const ENERGY: Self = Self::new(2, 1, -2, 0, 0);
    /// Energy per squared length, the dimension of a harmonic force constant.
    pub const SPRING_CONSTANT: Self = Self::new(0, 1, -2, 0, 0);

    pub const fn new(length: i8, mass: i8, time: i8, charge: i8, temperature: i8) -> Self {
        Self([length, mass, time, charge, temperature])
    }

    pub fn exponents(&self) -> [i8; 5] {
        self.0
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|&e| e == 0)
    }

    /// # Panics
    ///
    /// When an exponent leaves the `i8` range; see [`Dimension::checked_powi`].
    pub fn powi(self, n: i8) -> Self {
        self.checked_powi(n)
            .unwrap_or_else(|| panic!("exponent overflow raising {self} to the power {n}"))
    }

    /// Raises every exponent to the `n`-th power, or `None` if one leaves the `i8` range.
    pub fn checked_powi(self, n: i8) -> Option<Self> {
        let mut out = self.0;
        for e in out.iter_mut() {
            *e = e.checked_mul(n)?;
        }
        Some(Self(out))
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o = o.checked_add(r)?;
        }
        Some(Self(out))
    }

    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o = o.checked_sub(r)?;
        }
        Some(Self(out))
    }

    /// Returns the `n`-th root of this dimension, or `None` when some exponent is not
    /// divisible by `n`.
    pub fn root(self, n: i8) -> Option<Self> {
        if n == 0 || self.0.iter().any(|e| e % n != 0) {
            return None;
        }
        Some(Self(self.0.map(|e| e / n)))
    }
}

impl Mul for Dimension {
    type Output = Dimension;

    fn mul(self, rhs: Self) -> Self::Output {
        self.checked_mul(rhs)
            .unwrap_or_else(|| panic!("exponent overflow multiplying {self} by {rhs}"))
    }
}

impl Div for Dimension {
    type Output = Dimension;

    fn div(self, rhs: Self) -> Self::Output {
        self.checked_div(rhs)
            .unwrap_or_else(|| panic!("exponent overflow dividing {self} by {rhs}"))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        let parts: Vec<String> = BASE_NAMES
            .iter()
            .zip(self.0)
            .filter(|(_, e)| *e != 0)
            .map(|(name, e)| match e {
                1 => format!("[{}]", name),
                _ => format!("[{}]^{}", name, e),
            })
            .collect();
        write!(f, "{}", parts.join("*"))
    }
}
