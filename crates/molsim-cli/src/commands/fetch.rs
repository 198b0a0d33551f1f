use crate::cli::FetchArgs;
use crate::error::{CliError, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use molsim::core::io::resolve::{PdbId, ResolutionError, parse_entry};
use reqwest::StatusCode;
use std::path::PathBuf;
use tracing::{debug, info};

pub async fn run(args: FetchArgs) -> Result<()> {
    let id: PdbId = args.id.parse()?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.pdb", id)));

    if output.exists() && !args.force {
        return Err(CliError::Argument(format!(
            "{} already exists. Use --force to overwrite.",
            output.display()
        )));
    }

    let url = id.download_url();
    info!("Sending request to {}", url);
    let client = reqwest::Client::new();
    let mut response = client.get(&url).send().await?;
    check_status(&id, response.status())?;

    let pb = ProgressBar::new(response.content_length().unwrap_or(0));
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );
    pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(2));
    pb.set_message(format!("Downloading {}", id));

    let mut buffer: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        buffer.extend_from_slice(&chunk);
        pb.set_position(buffer.len() as u64);
    }
    pb.finish_and_clear();
    debug!(bytes = buffer.len(), "Download complete.");

    let text = String::from_utf8_lossy(&buffer);
    let (molecule, _) = parse_entry(&id, &text)?;

    std::fs::write(&output, buffer.as_slice()).map_err(|e| CliError::FileWriting {
        path: output.clone(),
        source: e.into(),
    })?;
    println!(
        "✓ {} ({} atoms, {} chains) written to {}",
        id,
        molecule.num_atoms(),
        molecule.num_chains(),
        output.display()
    );
    Ok(())
}

/// Maps an RCSB response status onto the resolution error it stands for.
fn check_status(id: &PdbId, status: StatusCode) -> std::result::Result<(), ResolutionError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::NOT_FOUND {
        Err(ResolutionError::NotFound(id.clone()))
    } else {
        Err(ResolutionError::Unavailable {
            id: id.clone(),
            reason: format!("server responded with {}", status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_resolution_errors() {
        let id: PdbId = "1CRN".parse().unwrap();
        assert!(check_status(&id, StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(&id, StatusCode::NOT_FOUND),
            Err(ResolutionError::NotFound(found)) if found == id
        ));
        assert!(matches!(
            check_status(&id, StatusCode::SERVICE_UNAVAILABLE),
            Err(ResolutionError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_identifiers_fail_before_any_request() {
        let args = FetchArgs {
            id: "XYZ".to_string(),
            output: None,
            force: false,
        };
        assert!(matches!(
            run(args).await,
            Err(CliError::Resolution(ResolutionError::InvalidIdentifier(_)))
        ));
    }

    #[tokio::test]
    async fn existing_output_is_not_overwritten_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1CRN.pdb");
        std::fs::write(&path, "keep me").unwrap();
        let args = FetchArgs {
            id: "1crn".to_string(),
            output: Some(path.clone()),
            force: false,
        };
        assert!(matches!(run(args).await, Err(CliError::Argument(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }
}
