use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::builder::MoleculeBuilder;
use crate::core::models::chain::ChainType;
use crate::core::models::element::Element;
use crate::core::models::error::ModelError;
use crate::core::models::ids::AtomId;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use crate::engine::trajectory::Trajectory;
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    /// Non-coordinate records preceding the first atom (`HEADER`, `TITLE`, `REMARK`, `CRYST1`, ...).
    pub header_lines: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Invalid structure: {0}")]
    Model(#[from] ModelError),
    #[error("Missing required record: {0}")]
    MissingRecord(&'static str),
    #[error("Frame has {found} atoms but the molecule has {expected}")]
    FrameMismatch { expected: usize, found: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: &'static str, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: &'static str, value: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
    #[error("Cannot determine element for atom '{0}'")]
    UnknownElement(String),
    #[error("Duplicate atom serial {0}")]
    DuplicateSerial(usize),
    #[error("CONECT references unknown atom serial {0}")]
    UnknownSerial(usize),
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| *c != ' ')
}

fn parse_int<T: std::str::FromStr>(line: &str, line_num: usize, start: usize, end: usize, columns: &'static str) -> Result<T, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns,
            value: value.to_string(),
        },
    })
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize, columns: &'static str) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns,
            value: value.to_string(),
        },
    })
}

/// Infers an element from the 4-character atom name field when columns 77-78 are blank.
///
/// A name starting in column 13 carries a two-letter element (`FE`, `CL`) unless it is a
/// four-character hydrogen name such as `HG21`; otherwise the first letter is the element.
fn element_from_name(field: &str) -> Option<Element> {
    let letters: String = field
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let starts_in_first_column = field.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    let four_char_hydrogen = field.trim().len() == 4 && letters.starts_with('H');
    if starts_in_first_column && !four_char_hydrogen && letters.len() >= 2 {
        if let Ok(element) = letters[..2].parse() {
            return Some(element);
        }
    }
    letters.get(..1).and_then(|symbol| symbol.parse().ok())
}

/// Parses a formal charge such as `1+` or `2-` from columns 79-80.
fn parse_formal_charge(field: &str) -> f64 {
    let mut chars = field.chars();
    match (chars.next().and_then(|c| c.to_digit(10)), chars.next()) {
        (Some(n), Some('+')) => n as f64,
        (Some(n), Some('-')) => -(n as f64),
        _ => 0.0,
    }
}

struct AtomRecord {
    alt_loc: Option<char>,
    chain: String,
    residue_name: String,
    residue_number: isize,
    insertion_code: Option<char>,
    atom: Atom,
}

fn parse_atom_record(line: &str, line_num: usize) -> Result<AtomRecord, PdbError> {
    if line.len() < 54 {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::LineTooShort,
        });
    }
    let serial: usize = parse_int(line, line_num, 6, 11, "7-11")?;
    let name_field = line.get(12..16).unwrap_or("");
    let name = name_field.trim();
    let residue_number: isize = parse_int(line, line_num, 22, 26, "23-26")?;
    let x = parse_float(line, line_num, 30, 38, "31-38")?;
    let y = parse_float(line, line_num, 38, 46, "39-46")?;
    let z = parse_float(line, line_num, 46, 54, "47-54")?;

    let element_field = slice_and_trim(line, 76, 78);
    let element = if element_field.is_empty() {
        element_from_name(name_field)
    } else {
        element_field.parse().ok()
    }
    .ok_or_else(|| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::UnknownElement(name.to_string()),
    })?;

    let atom = Atom::new(element)
        .with_name(name)
        .with_serial(serial)
        .with_coords(Point3::new(x, y, z))
        .with_partial_charge(parse_formal_charge(slice_and_trim(line, 78, 80)));

    Ok(AtomRecord {
        alt_loc: column_char(line, 16),
        chain: slice_and_trim(line, 21, 22).to_string(),
        residue_name: slice_and_trim(line, 17, 20).to_string(),
        residue_number,
        insertion_code: column_char(line, 26),
        atom,
    })
}

struct ConectRecord {
    line: usize,
    source: usize,
    partners: Vec<usize>,
}

fn parse_conect(line: &str, line_num: usize) -> Result<ConectRecord, PdbError> {
    let source = parse_int(line, line_num, 6, 11, "7-11")?;
    let mut partners = Vec::new();
    for (start, columns) in [(11, "12-16"), (16, "17-21"), (21, "22-26"), (26, "27-31")] {
        if !slice_and_trim(line, start, start + 5).is_empty() {
            partners.push(parse_int(line, line_num, start, start + 5, columns)?);
        }
    }
    Ok(ConectRecord {
        line: line_num,
        source,
        partners,
    })
}

/// Legacy PDB reader and writer.
///
/// Reading keeps the first `MODEL` only and the blank or `A` alternate location of each
/// atom. Chains appear in the order first seen and residues are keyed by chain, sequence
/// number and insertion code. A partner repeated within the `CONECT` records of an atom
/// encodes the bond order.
pub struct PdbFile;

impl StructureFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Molecule, Self::Metadata), Self::Error> {
        let mut builder = MoleculeBuilder::new("");
        builder.infer_chain_types(true);
        let mut metadata = PdbMetadata::default();
        let mut name = String::new();
        let mut seen_serials = HashSet::new();
        let mut skipped_serials = HashSet::new();
        let mut current_chain: Option<String> = None;
        let mut first_model_done = false;
        let mut conects = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_num = index + 1;

            match slice_and_trim(&line, 0, 6) {
                "ATOM" | "HETATM" => {
                    if first_model_done {
                        continue;
                    }
                    let record = parse_atom_record(&line, line_num)?;
                    if !matches!(record.alt_loc, None | Some('A')) {
                        skipped_serials.insert(record.atom.serial);
                        continue;
                    }
                    let serial = record.atom.serial;
                    if !seen_serials.insert(serial) {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::DuplicateSerial(serial),
                        });
                    }
                    if current_chain.as_deref() != Some(record.chain.as_str()) {
                        builder.start_chain(&record.chain, ChainType::Other);
                        current_chain = Some(record.chain);
                    }
                    builder
                        .start_residue(record.residue_number, record.insertion_code, &record.residue_name)
                        .add_atom(record.atom);
                }
                "ENDMDL" => first_model_done = true,
                "CONECT" => conects.push(parse_conect(&line, line_num)?),
                "END" => break,
                "MODEL" | "TER" | "MASTER" | "ANISOU" => {}
                record => {
                    if record == "HEADER" {
                        name = slice_and_trim(&line, 62, 66).to_string();
                    }
                    if seen_serials.is_empty() && !line.trim().is_empty() {
                        metadata.header_lines.push(line);
                    }
                }
            }
        }

        if seen_serials.is_empty() {
            return Err(PdbError::MissingRecord("ATOM/HETATM"));
        }

        for (a, b, order) in bond_orders(&conects, &seen_serials, &skipped_serials)? {
            builder.add_bond(a, b, order);
        }

        let mut molecule = builder.build()?;
        molecule.set_name(name);
        debug!(
            atoms = molecule.num_atoms(),
            chains = molecule.num_chains(),
            bonds = molecule.num_bonds(),
            "Parsed PDB structure"
        );
        Ok((molecule, metadata))
    }

    fn write_to(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for line in &metadata.header_lines {
            writeln!(writer, "{}", line)?;
        }
        let serials = write_atoms(molecule, &molecule.raw_positions(), writer)?;
        write_conects(molecule, &serials, writer)?;
        writeln!(writer, "END")?;
        Ok(())
    }
}

impl PdbFile {
    /// Writes every frame of a trajectory as a `MODEL`/`ENDMDL` block using the molecule's
    /// topology, followed by the bonds and `END`.
    pub fn write_trajectory(
        molecule: &Molecule,
        trajectory: &Trajectory,
        writer: &mut impl Write,
    ) -> Result<(), PdbError> {
        let mut serials = HashMap::new();
        for (index, frame) in trajectory.frames().iter().enumerate() {
            let positions = frame.position_vectors();
            if positions.len() != molecule.num_atoms() {
                return Err(PdbError::FrameMismatch {
                    expected: molecule.num_atoms(),
                    found: positions.len(),
                });
            }
            writeln!(writer, "MODEL     {:>4}", index + 1)?;
            serials = write_atoms(molecule, positions, writer)?;
            writeln!(writer, "ENDMDL")?;
        }
        write_conects(molecule, &serials, writer)?;
        writeln!(writer, "END")?;
        Ok(())
    }
}

/// Bond orders from `CONECT` records: the number of times a partner is listed for an atom,
/// taking the larger count of the two directions. Bonds to `skipped` atoms (dropped
/// alternate locations) are ignored.
fn bond_orders(
    conects: &[ConectRecord],
    known: &HashSet<usize>,
    skipped: &HashSet<usize>,
) -> Result<Vec<(usize, usize, BondOrder)>, PdbError> {
    let mut directed: HashMap<(usize, usize), u8> = HashMap::new();
    let mut pairs = Vec::new();
    for record in conects {
        for &serial in std::iter::once(&record.source).chain(&record.partners) {
            if !known.contains(&serial) && !skipped.contains(&serial) {
                return Err(PdbError::Parse {
                    line: record.line,
                    kind: PdbParseErrorKind::UnknownSerial(serial),
                });
            }
        }
        if skipped.contains(&record.source) {
            continue;
        }
        for &partner in &record.partners {
            if partner == record.source || skipped.contains(&partner) {
                continue;
            }
            let count = directed.entry((record.source, partner)).or_insert(0);
            *count = count.saturating_add(1);
            let pair = (record.source.min(partner), record.source.max(partner));
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
    }
    Ok(pairs
        .into_iter()
        .map(|(a, b)| {
            let forward = directed.get(&(a, b)).copied().unwrap_or(0);
            let backward = directed.get(&(b, a)).copied().unwrap_or(0);
            let order = BondOrder::try_from(forward.max(backward).clamp(1, 3)).unwrap_or_default();
            (a, b, order)
        })
        .collect())
}

fn format_atom_name(name: &str, symbol: &str) -> String {
    if name.len() < 4 && symbol.len() == 1 {
        format!(" {:<3}", name)
    } else {
        format!("{:<4}", name)
    }
}

fn format_formal_charge(charge: f64) -> String {
    let rounded = charge.round();
    if rounded == 0.0 || (charge - rounded).abs() > 1e-6 || rounded.abs() > 9.0 {
        return "  ".to_string();
    }
    let sign = if rounded > 0.0 { '+' } else { '-' };
    format!("{}{}", rounded.abs() as u8, sign)
}

fn chain_column(name: &str) -> char {
    name.chars().next().unwrap_or(' ')
}

/// Writes ATOM/HETATM and TER records chain by chain. Returns the serial assigned to each atom.
fn write_atoms(
    molecule: &Molecule,
    positions: &[Point3<f64>],
    writer: &mut impl Write,
) -> Result<HashMap<AtomId, usize>, PdbError> {
    let mut serials = HashMap::with_capacity(molecule.num_atoms());
    let mut serial = 0usize;
    for chain in molecule.chains().iter() {
        let chain_char = chain_column(&chain.name);
        let residues: Vec<_> = chain
            .residues()
            .iter()
            .filter_map(|&id| molecule.residue(id))
            .collect();
        let last_polymer = residues.iter().rposition(|r| r.residue_type.is_polymer());

        for (position_in_chain, residue) in residues.iter().enumerate() {
            let record = if residue.residue_type.is_polymer() { "ATOM" } else { "HETATM" };
            let residue_name: String = residue.name.chars().take(3).collect();
            for &atom_id in residue.atoms() {
                let (Some(atom), Some(index)) = (molecule.atom(atom_id), molecule.atom_index(atom_id)) else {
                    return Err(ModelError::AtomNotFound(atom_id).into());
                };
                let position = positions[index];
                serial += 1;
                serials.insert(atom_id, serial);
                writeln!(
                    writer,
                    "{:<6}{:>5} {:<4}{:1}{:>3} {:1}{:>4}{:1}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}{:2}",
                    record,
                    serial,
                    format_atom_name(&atom.name, atom.symbol()),
                    ' ',
                    residue_name,
                    chain_char,
                    residue.number,
                    residue.insertion_code.unwrap_or(' '),
                    position.x,
                    position.y,
                    position.z,
                    1.0,
                    0.0,
                    atom.symbol().to_uppercase(),
                    format_formal_charge(*atom.charge().value()),
                )?;
            }
            if Some(position_in_chain) == last_polymer {
                serial += 1;
                writeln!(
                    writer,
                    "TER   {:>5}      {:>3} {:1}{:>4}{:1}",
                    serial,
                    residue_name,
                    chain_char,
                    residue.number,
                    residue.insertion_code.unwrap_or(' ')
                )?;
            }
        }
    }
    Ok(serials)
}

fn write_conects(
    molecule: &Molecule,
    serials: &HashMap<AtomId, usize>,
    writer: &mut impl Write,
) -> Result<(), PdbError> {
    let mut ordered: Vec<(usize, AtomId)> = serials.iter().map(|(&id, &s)| (s, id)).collect();
    ordered.sort_unstable();
    for (serial, atom_id) in ordered {
        let mut partners = Vec::new();
        for bond in molecule.bonds_of(atom_id) {
            let Some(partner) = bond.partner(atom_id).and_then(|p| serials.get(&p)) else {
                continue;
            };
            let repeats = match bond.order {
                BondOrder::Double => 2,
                BondOrder::Triple => 3,
                BondOrder::Single | BondOrder::Aromatic => 1,
            };
            partners.extend(std::iter::repeat_n(*partner, repeats));
        }
        for chunk in partners.chunks(4) {
            write!(writer, "CONECT{:>5}", serial)?;
            for partner in chunk {
                write!(writer, "{:>5}", partner)?;
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}
