use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Crates whose events follow the `-v` count. Everything else (HTTP client internals
/// during `fetch`, the thread pool) stays at WARN.
const OWN_TARGETS: [&str; 2] = ["molsim", "molsim_cli"];

pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

pub fn target_filter(verbosity: u8, quiet: bool) -> Targets {
    let level = level_filter(verbosity, quiet);
    let default = if quiet { LevelFilter::OFF } else { LevelFilter::WARN };
    OWN_TARGETS
        .iter()
        .fold(Targets::new().with_default(default), |targets, target| {
            targets.with_target(*target, level)
        })
}

/// Installs the global subscriber: compact stderr output, plus a plain-text file that also
/// records when each run span (`simulation_workflow`, `velocity_verlet`, ...) closes and how
/// long it took.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(target_filter(verbosity, quiet))
        .with(stderr_layer);

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(CliError::Io)?;
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true);
            subscriber.with(file_layer).try_init()
        }
        None => subscriber.try_init(),
    };

    installed.map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::PathBuf;
    use std::sync::Once;
    use tracing::{Level, debug, info, info_span, trace, warn};

    static INIT: Once = Once::new();

    fn ensure_global_logger_is_set() {
        INIT.call_once(|| {
            setup_logging(3, false, None).expect("Failed to set up global logger for tests");
        });
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(7, false), LevelFilter::TRACE);
        assert_eq!(level_filter(3, true), LevelFilter::OFF);
    }

    #[test]
    fn verbosity_applies_to_own_crates_only() {
        let targets = target_filter(2, false);
        assert!(targets.would_enable("molsim::engine::integrators::verlet", &Level::DEBUG));
        assert!(targets.would_enable("molsim_cli::commands::run", &Level::DEBUG));
        assert!(!targets.would_enable("molsim", &Level::TRACE));
        assert!(!targets.would_enable("hyper_util::client", &Level::INFO));
        assert!(targets.would_enable("hyper_util::client", &Level::WARN));

        let quiet = target_filter(0, true);
        assert!(!quiet.would_enable("molsim", &Level::ERROR));
        assert!(!quiet.would_enable("reqwest", &Level::ERROR));
    }

    #[test]
    #[serial]
    fn global_logger_accepts_structured_events() {
        ensure_global_logger_is_set();

        warn!(step = 12, "Non-finite energy");
        info!(atoms = 2, frames = 21, "Run complete");
        debug!(timestep_fs = 0.5, "Integrator configured");
        trace!(step = 3, "Recorded frame");
    }

    #[test]
    #[serial]
    fn file_layer_records_run_span_timings() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("run.log");

        let file = File::create(&log_path).unwrap();
        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE);
        let subscriber = tracing_subscriber::registry().with(file_layer);

        tracing::subscriber::with_default(subscriber, || {
            let span = info_span!("velocity_verlet", n_steps = 20);
            let _guard = span.enter();
            debug!(frames = 21, "Trajectory written.");
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Trajectory written."));
        assert!(content.contains("frames=21"));
        assert!(content.contains("velocity_verlet"));
        assert!(content.contains("close"));
    }

    #[test]
    #[serial]
    fn invalid_log_file_path_propagates_error() {
        let invalid_path = PathBuf::from("/");

        if cfg!(unix) && invalid_path.is_dir() {
            let result = setup_logging(0, false, Some(&invalid_path));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}
