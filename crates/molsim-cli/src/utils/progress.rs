use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use molsim::engine::progress::{Progress, ProgressCallback};
use std::fmt::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// What one task increment counts within a phase.
fn work_unit(phase: &str) -> &'static str {
    match phase {
        "Replicas" => "replicas",
        _ => "steps",
    }
}

/// Renders engine [`Progress`] events on stderr: a spinner while a phase prepares, then a
/// bar labelled with the phase, counting integration steps (or replicas) and their rate.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    /// Tracks state without drawing, for `--quiet` runs.
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        pb.finish_and_clear();
        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb) = pb.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    pb.reset();
                    pb.set_length(0);
                    pb.set_prefix(name);
                    pb.set_message(work_unit(name));
                    pb.set_style(spinner_style());
                    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                }
                Progress::TaskStart { total_steps } => {
                    pb.disable_steady_tick();
                    pb.reset();
                    pb.set_length(total_steps);
                    pb.set_style(bar_style());
                }
                Progress::TaskIncrement => pb.inc(1),
                Progress::TaskFinish => {
                    let length = pb.length().unwrap_or(0);
                    pb.set_position(length);
                }
                Progress::PhaseFinish => {
                    pb.disable_steady_tick();
                    let summary = match pb.length() {
                        Some(n) if n > 0 => format!(
                            "✓ {} {} in {:.1}s",
                            n,
                            pb.message(),
                            pb.elapsed().as_secs_f64()
                        ),
                        _ => "✓ done".to_string(),
                    };
                    pb.set_style(spinner_style());
                    pb.finish_with_message(summary);
                }
                Progress::Message(msg) => pb.println(format!("  {}", msg)),
            }
        })
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:<16.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg} ({rate}, eta {eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .with_key("rate", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
        let _ = write!(w, "{:.0}/s", state.per_sec());
    })
    .progress_chars("##-")
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
