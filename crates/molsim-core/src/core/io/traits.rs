use crate::core::models::molecule::Molecule;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Common interface for structure file formats.
///
/// Implementors parse a [`Molecule`] plus format-specific metadata from a buffered stream and
/// serialize one back. The path-based methods are provided on top of the stream methods.
pub trait StructureFile {
    /// Format-specific data that does not belong in the molecular model (headers, remarks).
    type Metadata: Default;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a molecule from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    ///
    /// # Return
    ///
    /// Returns the parsed molecule and associated metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<(Molecule, Self::Metadata), Self::Error>;

    /// Writes a molecule and metadata to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes a molecule with default metadata.
    fn write_molecule_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Self::Error> {
        Self::write_to(molecule, &Self::Metadata::default(), writer)
    }

    /// Reads a molecule from a file path. A molecule left unnamed by the format is named after
    /// the file stem.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(Molecule, Self::Metadata), Self::Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let (mut molecule, metadata) = Self::read_from(&mut reader)?;
        if molecule.name().is_empty() {
            if let Some(stem) = path.file_stem() {
                molecule.set_name(stem.to_string_lossy());
            }
        }
        Ok((molecule, metadata))
    }

    /// Writes a molecule and metadata to a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(molecule, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn write_molecule_to_path<P: AsRef<Path>>(molecule: &Molecule, path: P) -> Result<(), Self::Error> {
        Self::write_to_path(molecule, &Self::Metadata::default(), path)
    }
}
