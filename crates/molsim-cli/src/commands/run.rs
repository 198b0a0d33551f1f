use crate::cli::RunArgs;
use crate::config::{PartialSimulationConfig, RunConfig};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use molsim::{
    core::io::{
        pdb::{PdbFile, PdbMetadata},
        traits::StructureFile,
    },
    core::models::molecule::Molecule,
    engine::{progress::ProgressReporter, trajectory::Trajectory},
    workflows,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub async fn run(args: RunArgs, quiet: bool) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialSimulationConfig::from_file(path)?,
        None => PartialSimulationConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let RunConfig {
        simulation,
        ensemble,
    } = partial_config.merge_with_cli(&args)?;

    info!("Loading input structure from {:?}", &args.input);
    let (mut molecule, metadata) =
        PdbFile::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    match ensemble {
        None => {
            println!(
                "Simulating '{}' ({} atoms) for {} steps...",
                molecule.name(),
                molecule.num_atoms(),
                simulation.n_steps
            );
            let trajectory = tokio::task::block_in_place(|| {
                workflows::simulate::run(&mut molecule, &simulation, &reporter)
            })?;
            write_outputs(&args, &molecule, &metadata, &trajectory, None)?;
        }
        Some(settings) => {
            println!(
                "Simulating {} replicas of '{}' at {} for {} steps each...",
                settings.replicas,
                molecule.name(),
                settings.temperature,
                simulation.n_steps
            );
            let results = tokio::task::block_in_place(|| {
                workflows::ensemble::run_replicas(&molecule, &simulation, &settings, &reporter)
            })?;
            for result in &results {
                write_outputs(
                    &args,
                    &result.molecule,
                    &metadata,
                    &result.trajectory,
                    Some(result.index),
                )?;
            }
        }
    }

    Ok(())
}

fn write_outputs(
    args: &RunArgs,
    molecule: &Molecule,
    metadata: &PdbMetadata,
    trajectory: &Trajectory,
    replica: Option<usize>,
) -> Result<()> {
    let csv_path = replica_path(&args.output, replica);
    info!(frames = trajectory.len(), "Writing trajectory to {:?}", &csv_path);
    trajectory
        .write_csv(File::create(&csv_path)?)
        .map_err(|e| CliError::FileWriting {
            path: csv_path.clone(),
            source: e.into(),
        })?;

    if let Some(last) = trajectory.last() {
        println!(
            "✓ {} frames written to {} (final total energy {})",
            trajectory.len(),
            csv_path.display(),
            last.total_energy()
        );
    }

    if let Some(path) = &args.final_structure {
        let path = replica_path(path, replica);
        info!("Writing final structure to {:?}", &path);
        PdbFile::write_to_path(molecule, metadata, &path).map_err(|e| CliError::FileWriting {
            path: path.clone(),
            source: e.into(),
        })?;
        println!("  Final structure written to {}", path.display());
    }

    if let Some(path) = &args.trajectory_pdb {
        let path = replica_path(path, replica);
        info!("Writing multi-model trajectory to {:?}", &path);
        let mut writer = BufWriter::new(File::create(&path)?);
        PdbFile::write_trajectory(molecule, trajectory, &mut writer)
            .map_err(|e| CliError::FileWriting {
                path: path.clone(),
                source: e.into(),
            })?;
        writer.flush()?;
        println!("  Trajectory models written to {}", path.display());
    }

    Ok(())
}

/// `traj.csv` becomes `traj_3.csv` for replica 3; single runs keep the path as given.
fn replica_path(base_path: &Path, replica: Option<usize>) -> PathBuf {
    let Some(index) = replica else {
        return base_path.to_path_buf();
    };
    let parent = base_path.parent().unwrap_or_else(|| Path::new(""));
    let stem = base_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("trajectory");
    let file_name = match base_path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, index, ext),
        None => format!("{}_{}", stem, index),
    };
    parent.join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replica_paths_are_suffixed() {
        assert_eq!(
            replica_path(Path::new("out/traj.csv"), None),
            PathBuf::from("out/traj.csv")
        );
        assert_eq!(
            replica_path(Path::new("out/traj.csv"), Some(3)),
            PathBuf::from("out/traj_3.csv")
        );
        assert_eq!(replica_path(Path::new("final"), Some(0)), PathBuf::from("final_0"));
    }
}
