use super::pdb::{PdbError, PdbFile, PdbMetadata};
use super::traits::StructureFile;
use crate::core::models::molecule::Molecule;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use thiserror::Error;

/// A four-character Protein Data Bank identifier such as `1YU8`, normalized to upper case.
///
/// The first character is a digit 1-9 and the remaining three are letters or digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PdbId(String);

impl PdbId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Download location of the entry in legacy PDB format on RCSB.
    pub fn download_url(&self) -> String {
        format!("https://files.rcsb.org/download/{}.pdb", self.0)
    }
}

impl FromStr for PdbId {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        let mut chars = code.chars();
        let valid = code.len() == 4
            && chars.next().is_some_and(|c| matches!(c, '1'..='9'))
            && chars.all(|c| c.is_ascii_alphanumeric());
        if valid {
            Ok(Self(code))
        } else {
            Err(ResolutionError::InvalidIdentifier(s.to_string()))
        }
    }
}

impl fmt::Display for PdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failures while resolving a structure identifier to a molecule. Remote fetches are not
/// retried; the failure is reported as is.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("'{0}' is not a valid PDB identifier")]
    InvalidIdentifier(String),
    #[error("Structure {0} was not found")]
    NotFound(PdbId),
    #[error("Structure {id} is unavailable: {reason}")]
    Unavailable { id: PdbId, reason: String },
    #[error("Structure {id} could not be parsed: {source}")]
    Parse {
        id: PdbId,
        #[source]
        source: PdbError,
    },
}

/// Parses downloaded PDB text into a molecule named after the identifier.
pub fn parse_entry(id: &PdbId, text: &str) -> Result<(Molecule, PdbMetadata), ResolutionError> {
    let (mut molecule, metadata) =
        PdbFile::read_from(&mut Cursor::new(text.as_bytes())).map_err(|source| ResolutionError::Parse {
            id: id.clone(),
            source,
        })?;
    molecule.set_name(id.as_str());
    Ok((molecule, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_validated_and_normalized() {
        let id: PdbId = " 1yu8 ".parse().unwrap();
        assert_eq!(id.as_str(), "1YU8");
        assert_eq!(id.download_url(), "https://files.rcsb.org/download/1YU8.pdb");
        for invalid in ["", "1YU", "1YU88", "0ABC", "ABCD", "1A-C"] {
            assert!(matches!(
                invalid.parse::<PdbId>(),
                Err(ResolutionError::InvalidIdentifier(_))
            ));
        }
    }

    #[test]
    fn parse_entry_names_the_molecule_after_the_identifier() {
        let id: PdbId = "3AID".parse().unwrap();
        let text = "ATOM      1  C   UNL A   1       0.000   0.000   0.000  1.00  0.00           C\nEND\n";
        let (molecule, _) = parse_entry(&id, text).unwrap();
        assert_eq!(molecule.name(), "3AID");
        assert_eq!(molecule.num_atoms(), 1);
    }

    #[test]
    fn parse_failures_carry_the_identifier() {
        let id: PdbId = "3AID".parse().unwrap();
        match parse_entry(&id, "<html>not found</html>\n") {
            Err(ResolutionError::Parse { id: failed, .. }) => assert_eq!(failed, id),
            other => panic!("expected parse failure, got {other:?}"),
        }
    }
}
