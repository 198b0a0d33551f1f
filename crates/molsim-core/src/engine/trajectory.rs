use super::error::EngineError;
use crate::core::forcefield::EnergyModel;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::units::{AMU, ANGSTROM, FEMTOSECOND, Quantity, Unit, UnitSystem};
use nalgebra::{DVector, MatrixXx3, Point3, Vector3};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// One sampled snapshot of a run. Raw values are in molecular units (Å, Å/fs, fs, kcal/mol).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    step: usize,
    time: f64,
    positions: Vec<Point3<f64>>,
    velocities: Vec<Vector3<f64>>,
    potential_energy: f64,
    kinetic_energy: f64,
}

impl Frame {
    pub(crate) fn new(
        step: usize,
        time: f64,
        positions: Vec<Point3<f64>>,
        velocities: Vec<Vector3<f64>>,
        potential_energy: f64,
        kinetic_energy: f64,
    ) -> Self {
        Self {
            step,
            time,
            positions,
            velocities,
            potential_energy,
            kinetic_energy,
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn time(&self) -> Quantity<f64> {
        Quantity::new(self.time, FEMTOSECOND)
    }

    pub fn positions(&self) -> Quantity<MatrixXx3<f64>> {
        let p = &self.positions;
        Quantity::new(MatrixXx3::from_fn(p.len(), |i, j| p[i][j]), ANGSTROM)
    }

    pub fn velocities(&self) -> Quantity<MatrixXx3<f64>> {
        let v = &self.velocities;
        Quantity::new(
            MatrixXx3::from_fn(v.len(), |i, j| v[i][j]),
            UnitSystem::MOLECULAR.velocity(),
        )
    }

    pub fn potential_energy(&self) -> Quantity<f64> {
        Quantity::new(self.potential_energy, UnitSystem::MOLECULAR.energy)
    }

    pub fn kinetic_energy(&self) -> Quantity<f64> {
        Quantity::new(self.kinetic_energy, UnitSystem::MOLECULAR.energy)
    }

    pub fn total_energy(&self) -> Quantity<f64> {
        Quantity::new(self.total_energy_value(), UnitSystem::MOLECULAR.energy)
    }

    /// Positions in Å, in atom order.
    pub fn position_vectors(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Velocities in Å/fs, in atom order.
    pub fn velocity_vectors(&self) -> &[Vector3<f64>] {
        &self.velocities
    }

    fn total_energy_value(&self) -> f64 {
        self.potential_energy + self.kinetic_energy
    }
}

#[derive(Serialize)]
struct FrameAtomRow<'a> {
    step: usize,
    time_fs: f64,
    atom: usize,
    element: &'a str,
    x_angstrom: f64,
    y_angstrom: f64,
    z_angstrom: f64,
    vx_angstrom_per_fs: f64,
    vy_angstrom_per_fs: f64,
    vz_angstrom_per_fs: f64,
    potential_energy_kcal_per_mol: f64,
    kinetic_energy_kcal_per_mol: f64,
}

/// The record of one run: sampled frames plus a snapshot of the topology that produced them.
///
/// Frames are the authoritative history of the run; the molecule only keeps the final state.
/// The energy model attached to the molecule at run time is kept so its parameters can be
/// looked up afterwards.
#[derive(Debug, Clone)]
pub struct Trajectory {
    molecule_name: String,
    elements: Vec<Element>,
    masses: Vec<f64>,
    integrator: String,
    timestep: f64,
    energy_model: Option<Arc<dyn EnergyModel>>,
    frames: Vec<Frame>,
}

impl Trajectory {
    pub(crate) fn new(molecule: &Molecule, integrator: &str, timestep: f64) -> Self {
        Self {
            molecule_name: molecule.name().to_string(),
            elements: molecule.atoms().iter().map(|(_, atom)| atom.element()).collect(),
            masses: molecule.raw_masses(),
            integrator: integrator.to_string(),
            timestep,
            energy_model: molecule.energy_model.clone(),
            frames: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn molecule_name(&self) -> &str {
        &self.molecule_name
    }

    pub fn integrator(&self) -> &str {
        &self.integrator
    }

    pub fn timestep(&self) -> Quantity<f64> {
        Quantity::new(self.timestep, FEMTOSECOND)
    }

    pub fn num_atoms(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn masses(&self) -> Quantity<DVector<f64>> {
        Quantity::new(DVector::from_vec(self.masses.clone()), AMU)
    }

    pub fn energy_model(&self) -> Option<&dyn EnergyModel> {
        self.energy_model.as_deref()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn times(&self) -> Quantity<DVector<f64>> {
        self.column(FEMTOSECOND, |f| f.time)
    }

    pub fn potential_energies(&self) -> Quantity<DVector<f64>> {
        self.column(UnitSystem::MOLECULAR.energy, |f| f.potential_energy)
    }

    pub fn kinetic_energies(&self) -> Quantity<DVector<f64>> {
        self.column(UnitSystem::MOLECULAR.energy, |f| f.kinetic_energy)
    }

    pub fn total_energies(&self) -> Quantity<DVector<f64>> {
        self.column(UnitSystem::MOLECULAR.energy, Frame::total_energy_value)
    }

    /// Largest deviation of the total energy from its value in the first frame.
    pub fn max_energy_drift(&self) -> Quantity<f64> {
        let drift = match self.frames.first() {
            Some(first) => {
                let reference = first.total_energy_value();
                self.frames
                    .iter()
                    .map(|f| (f.total_energy_value() - reference).abs())
                    .fold(0.0, f64::max)
            }
            None => 0.0,
        };
        Quantity::new(drift, UnitSystem::MOLECULAR.energy)
    }

    /// Position of one atom across all frames, one row per frame.
    pub fn atom_trace(&self, atom: usize) -> Option<Quantity<MatrixXx3<f64>>> {
        if atom >= self.num_atoms() {
            return None;
        }
        let frames = &self.frames;
        Some(Quantity::new(
            MatrixXx3::from_fn(frames.len(), |i, j| frames[i].positions[atom][j]),
            ANGSTROM,
        ))
    }

    /// Copies the positions, velocities and time of a frame into `molecule`.
    ///
    /// # Errors
    ///
    /// [`EngineError::FrameNotFound`] for an invalid index and
    /// [`EngineError::TopologyMismatch`] when the molecule's atom count differs.
    pub fn apply_frame(&self, index: usize, molecule: &mut Molecule) -> Result<(), EngineError> {
        let frame = self.frames.get(index).ok_or(EngineError::FrameNotFound {
            index,
            len: self.frames.len(),
        })?;
        if molecule.num_atoms() != self.num_atoms() {
            return Err(EngineError::TopologyMismatch {
                expected: self.num_atoms(),
                found: molecule.num_atoms(),
            });
        }
        molecule.set_raw_state(&frame.positions, &frame.velocities);
        molecule.set_time_raw(frame.time);
        Ok(())
    }

    /// Writes one CSV row per frame and atom.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for frame in &self.frames {
            let atoms = frame.positions.iter().zip(&frame.velocities).zip(&self.elements);
            for (atom, ((p, v), element)) in atoms.enumerate() {
                csv_writer.serialize(FrameAtomRow {
                    step: frame.step,
                    time_fs: frame.time,
                    atom,
                    element: element.symbol(),
                    x_angstrom: p.x,
                    y_angstrom: p.y,
                    z_angstrom: p.z,
                    vx_angstrom_per_fs: v.x,
                    vy_angstrom_per_fs: v.y,
                    vz_angstrom_per_fs: v.z,
                    potential_energy_kcal_per_mol: frame.potential_energy,
                    kinetic_energy_kcal_per_mol: frame.kinetic_energy,
                })?;
            }
        }
        csv_writer.flush()?;
        Ok(())
    }

    fn column(&self, unit: Unit, value: impl Fn(&Frame) -> f64) -> Quantity<DVector<f64>> {
        let values = self.frames.iter().map(value);
        Quantity::new(DVector::from_iterator(self.frames.len(), values), unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;

    fn two_frame_trajectory() -> (Molecule, Trajectory) {
        let molecule = Molecule::from_atoms(
            "pair",
            vec![Atom::from_symbol("H").unwrap(), Atom::from_symbol("O").unwrap()],
        );
        let mut trajectory = Trajectory::new(&molecule, "test", 1.0);
        trajectory.push(Frame::new(
            0,
            0.0,
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            vec![Vector3::zeros(), Vector3::zeros()],
            1.0,
            0.0,
        ));
        trajectory.push(Frame::new(
            10,
            10.0,
            vec![Point3::new(0.5, 0.0, 0.0), Point3::new(1.5, 0.0, 0.0)],
            vec![Vector3::new(0.01, 0.0, 0.0), Vector3::zeros()],
            0.25,
            0.7,
        ));
        (molecule, trajectory)
    }

    #[test]
    fn series_are_reported_per_frame() {
        let (_, trajectory) = two_frame_trajectory();
        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory.times().get(1).unwrap(), Quantity::new(10.0, FEMTOSECOND));
        let total = trajectory.total_energies();
        assert!((total.value()[1] - 0.95).abs() < 1e-12);
        assert!((*trajectory.max_energy_drift().value() - 0.05).abs() < 1e-12);
        assert_eq!(trajectory.elements(), &[Element::H, Element::O]);
        assert!(trajectory.energy_model().is_none());
    }

    #[test]
    fn atom_trace_follows_one_atom() {
        let (_, trajectory) = two_frame_trajectory();
        let trace = trajectory.atom_trace(1).unwrap();
        assert_eq!(trace.nrows(), 2);
        assert_eq!(trace.get(1, 0).unwrap(), Quantity::new(1.5, ANGSTROM));
        assert!(trajectory.atom_trace(2).is_none());
    }

    #[test]
    fn apply_frame_restores_state_and_clock() {
        let (mut molecule, trajectory) = two_frame_trajectory();
        trajectory.apply_frame(1, &mut molecule).unwrap();
        assert_eq!(molecule.atom_at(0).unwrap().x(), Quantity::new(0.5, ANGSTROM));
        assert_eq!(molecule.time(), Quantity::new(10.0, FEMTOSECOND));
        assert!(matches!(
            trajectory.apply_frame(5, &mut molecule),
            Err(EngineError::FrameNotFound { index: 5, len: 2 })
        ));
    }

    #[test]
    fn apply_frame_rejects_other_topologies() {
        let (_, trajectory) = two_frame_trajectory();
        let mut single = Molecule::from_atoms("single", vec![Atom::from_symbol("C").unwrap()]);
        assert!(matches!(
            trajectory.apply_frame(0, &mut single),
            Err(EngineError::TopologyMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn csv_has_one_row_per_frame_and_atom() {
        let (_, trajectory) = two_frame_trajectory();
        let mut out = Vec::new();
        trajectory.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("step,time_fs,atom,element,x_angstrom"));
        assert!(lines[3].starts_with("10,10.0,0,H,0.5"));
    }
}
