use super::model::{EnergyEvaluation, EnergyModel, ForcefieldError};
use super::potentials;
use crate::core::models::molecule::Molecule;
use crate::core::units::{ANGSTROM, Quantity, UnitSystem};
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Bind-time rest lengths closer than this (Å) count as one shared `r0`.
const REST_LENGTH_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    /// Every atom is tethered to a fixed point.
    Anchor(Point3<f64>),
    /// One spring per bond of the bound molecule.
    Bonded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Spring {
    i: usize,
    j: usize,
    r0: f64,
}

/// Harmonic potential `E = ½ k (r − r₀)²`.
///
/// In anchor mode each atom is tied to a fixed point (the origin by default) with rest
/// length zero unless overridden, so every atom oscillates independently with period
/// `T = 2π√(m/k)`. In bonded mode each bond of the bound molecule becomes a spring whose
/// rest length is the bond length at bind time, unless overridden.
///
/// `k` is stored in kcal/mol/Å² and lengths in Å.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicOscillator {
    k: f64,
    mode: Mode,
    rest_length: Option<f64>,
    bound_atoms: Option<usize>,
    springs: Vec<Spring>,
}

impl HarmonicOscillator {
    /// Tethers every atom to the origin with spring constant `k`.
    ///
    /// # Errors
    ///
    /// Returns [`ForcefieldError::Units`] when `k` is not an energy per squared length.
    pub fn new(k: &Quantity<f64>) -> Result<Self, ForcefieldError> {
        Self::with_mode(k, Mode::Anchor(Point3::origin()))
    }

    /// Tethers every atom to `anchor` with spring constant `k`.
    pub fn with_anchor(k: &Quantity<f64>, anchor: &Quantity<Vector3<f64>>) -> Result<Self, ForcefieldError> {
        let anchor = anchor.value_in(&ANGSTROM)?;
        Self::with_mode(k, Mode::Anchor(Point3::from(anchor)))
    }

    /// Places a spring on every bond of the molecule the model is bound to.
    pub fn bonded(k: &Quantity<f64>) -> Result<Self, ForcefieldError> {
        Self::with_mode(k, Mode::Bonded)
    }

    fn with_mode(k: &Quantity<f64>, mode: Mode) -> Result<Self, ForcefieldError> {
        let k = k.value_in(&UnitSystem::MOLECULAR.spring_constant())?;
        if !k.is_finite() || k < 0.0 {
            return Err(ForcefieldError::Model(format!(
                "spring constant must be finite and non-negative, got {k}"
            )));
        }
        Ok(Self {
            k,
            mode,
            rest_length: None,
            bound_atoms: None,
            springs: Vec::new(),
        })
    }

    /// Overrides the rest length of every spring.
    pub fn with_rest_length(mut self, r0: &Quantity<f64>) -> Result<Self, ForcefieldError> {
        let r0 = r0.value_in(&ANGSTROM)?;
        if !r0.is_finite() || r0 < 0.0 {
            return Err(ForcefieldError::Model(format!(
                "rest length must be finite and non-negative, got {r0}"
            )));
        }
        self.rest_length = Some(r0);
        self
            .springs
            .iter_mut()
            .for_each(|spring| spring.r0 = r0);
        Ok(self)
    }

    pub fn spring_constant(&self) -> Quantity<f64> {
        Quantity::new(self.k, UnitSystem::MOLECULAR.spring_constant())
    }

    pub fn is_bonded(&self) -> bool {
        self.mode == Mode::Bonded
    }

    /// Springs recorded at bind time as `(i, j, r0)` atom-order index pairs with r₀ in Å.
    pub fn springs(&self) -> Vec<(usize, usize, Quantity<f64>)> {
        self.springs
            .iter()
            .map(|s| (s.i, s.j, Quantity::new(s.r0, ANGSTROM)))
            .collect()
    }

    /// Rest length of each spring in bind order, in Å.
    pub fn rest_lengths(&self) -> Vec<Quantity<f64>> {
        self.springs
            .iter()
            .map(|s| Quantity::new(s.r0, ANGSTROM))
            .collect()
    }

    /// The rest length shared by every spring. `None` for a bonded model whose springs
    /// were bound at different lengths, or that has no springs yet.
    fn rest_length_value(&self) -> Option<f64> {
        match (&self.mode, self.rest_length) {
            (_, Some(r0)) => Some(r0),
            (Mode::Anchor(_), None) => Some(0.0),
            (Mode::Bonded, None) => {
                let first = self.springs.first()?.r0;
                self.springs
                    .iter()
                    .all(|s| (s.r0 - first).abs() <= REST_LENGTH_TOLERANCE)
                    .then_some(first)
            }
        }
    }
}

impl EnergyModel for HarmonicOscillator {
    fn name(&self) -> &str {
        "harmonic"
    }

    fn bind(&mut self, molecule: &Molecule) -> Result<(), ForcefieldError> {
        let positions = molecule.raw_positions();
        self.springs = match self.mode {
            Mode::Anchor(_) => Vec::new(),
            Mode::Bonded => molecule
                .bond_indices()
                .into_iter()
                .map(|(i, j, _)| Spring {
                    i,
                    j,
                    r0: self
                        .rest_length
                        .unwrap_or_else(|| (positions[j] - positions[i]).norm()),
                })
                .collect(),
        };
        self.bound_atoms = Some(positions.len());
        debug!(
            molecule = molecule.name(),
            atoms = positions.len(),
            springs = self.springs.len(),
            "Bound harmonic oscillator"
        );
        Ok(())
    }

    fn evaluate(&self, positions: &[Point3<f64>]) -> Result<EnergyEvaluation, ForcefieldError> {
        let expected = self
            .bound_atoms
            .ok_or_else(|| ForcefieldError::NotBound(self.name().to_string()))?;
        if positions.len() != expected {
            return Err(ForcefieldError::AtomCountMismatch {
                expected,
                found: positions.len(),
            });
        }

        let mut energy = 0.0;
        let mut forces = vec![Vector3::zeros(); positions.len()];
        match &self.mode {
            Mode::Anchor(anchor) => {
                let r0 = self.rest_length.unwrap_or(0.0);
                for (position, force) in positions.iter().zip(forces.iter_mut()) {
                    let (e, f) = potentials::harmonic_pair(position, anchor, r0, self.k);
                    energy += e;
                    *force = f;
                }
            }
            Mode::Bonded => {
                for spring in &self.springs {
                    let (e, f) =
                        potentials::harmonic_pair(&positions[spring.i], &positions[spring.j], spring.r0, self.k);
                    energy += e;
                    forces[spring.i] += f;
                    forces[spring.j] -= f;
                }
            }
        }
        Ok(EnergyEvaluation::new(energy, forces))
    }

    fn parameter(&self, name: &str) -> Option<Quantity<f64>> {
        match name {
            "k" => Some(self.spring_constant()),
            "r0" => self.rest_length_value().map(|r0| Quantity::new(r0, ANGSTROM)),
            _ => None,
        }
    }
}
