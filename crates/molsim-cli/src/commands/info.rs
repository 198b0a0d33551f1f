use crate::cli::InfoArgs;
use crate::error::{CliError, Result};
use molsim::core::io::{pdb::PdbFile, traits::StructureFile};
use molsim::core::models::molecule::Molecule;
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

pub async fn run(args: InfoArgs) -> Result<()> {
    info!("Loading structure from {:?}", &args.structure);
    let (molecule, metadata) =
        PdbFile::read_from_path(&args.structure).map_err(|e| CliError::FileParsing {
            path: args.structure.clone(),
            source: e.into(),
        })?;

    info!(
        header_lines = metadata.header_lines.len(),
        "Structure loaded."
    );
    print!("{}", StructureSummary::from_molecule(&molecule));
    Ok(())
}

struct ChainSummary {
    name: String,
    chain_type: String,
    residues: usize,
    atoms: usize,
    residue_types: BTreeMap<String, usize>,
}

/// Counts reported by `molsim info`.
struct StructureSummary {
    name: String,
    atoms: usize,
    bonds: usize,
    residues: usize,
    chains: Vec<ChainSummary>,
}

impl StructureSummary {
    fn from_molecule(molecule: &Molecule) -> Self {
        let chains = molecule
            .chains()
            .iter()
            .map(|chain| {
                let mut residue_types = BTreeMap::new();
                let mut atoms = 0;
                for residue in chain.residues().iter().filter_map(|&r| molecule.residue(r)) {
                    *residue_types
                        .entry(format!("{:?}", residue.residue_type))
                        .or_insert(0) += 1;
                    atoms += residue.num_atoms();
                }
                ChainSummary {
                    name: chain.name.clone(),
                    chain_type: format!("{:?}", chain.chain_type),
                    residues: chain.num_residues(),
                    atoms,
                    residue_types,
                }
            })
            .collect();

        Self {
            name: molecule.name().to_string(),
            atoms: molecule.num_atoms(),
            bonds: molecule.num_bonds(),
            residues: molecule.num_residues(),
            chains,
        }
    }
}

impl fmt::Display for StructureSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Structure: {}", self.name)?;
        writeln!(f, "  Atoms:    {}", self.atoms)?;
        writeln!(f, "  Bonds:    {}", self.bonds)?;
        writeln!(f, "  Residues: {}", self.residues)?;
        writeln!(f, "  Chains:   {}", self.chains.len())?;
        for chain in &self.chains {
            let label = if chain.name.is_empty() { "-" } else { &chain.name };
            let types = chain
                .residue_types
                .iter()
                .map(|(kind, count)| format!("{kind}: {count}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                f,
                "    {:<4} {:<8} {:>5} residues {:>7} atoms  ({})",
                label, chain.chain_type, chain.residues, chain.atoms, types
            )?;
        }
        Ok(())
    }
}
