use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use species::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

struct IngestState {
    bar: ProgressBar,
    phase: Option<&'static str>,
    completed: Vec<&'static str>,
}

/// Renders the progress of one dataset ingestion on stderr, prefixed with the
/// dataset name.
#[derive(Clone)]
pub struct IngestProgress {
    state: Arc<Mutex<IngestState>>,
}

impl IngestProgress {
    pub fn new(dataset: &str) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
            .with_style(Self::phase_style())
            .with_prefix(dataset.to_string());
        bar.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(IngestState {
                bar,
                phase: None,
                completed: Vec::new(),
            })),
        }
    }

    /// Names of the phases that ran to completion, in order.
    pub fn completed_phases(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .map(|state| state.completed.clone())
            .unwrap_or_default()
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = Arc::clone(&self.state);

        Box::new(move |event: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Ingestion progress state is poisoned; dropping {:?}.", event);
                return;
            };

            match event {
                Progress::PhaseStart { name } => {
                    state.phase = Some(name);
                    state.bar.reset();
                    state.bar.set_length(0);
                    state.bar.set_style(Self::phase_style());
                    state.bar.set_message(name);
                    state
                        .bar
                        .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                }
                Progress::TaskStart { total_steps } => {
                    state.bar.disable_steady_tick();
                    state.bar.reset();
                    state.bar.set_length(total_steps);
                    state.bar.set_style(Self::spectra_style());
                }
                Progress::TaskIncrement => state.bar.inc(1),
                Progress::TaskFinish => {
                    if let Some(length) = state.bar.length() {
                        state.bar.set_position(length);
                    }
                }
                Progress::PhaseFinish => {
                    state.bar.disable_steady_tick();
                    state.bar.set_style(Self::phase_style());
                    match state.phase.take() {
                        Some(name) => {
                            state.bar.finish_with_message(format!("✓ {name}"));
                            state.completed.push(name);
                        }
                        None => state.bar.finish(),
                    }
                }
                Progress::Message(msg) => {
                    if state.bar.is_finished() {
                        state.bar.set_message(msg);
                    } else {
                        state.bar.println(format!("  [{}] {}", state.bar.prefix(), msg));
                    }
                }
            }
        })
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} [{prefix}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn spectra_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{prefix}] {msg:<20} [{bar:40.cyan/blue}] {pos}/{len} spectra ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
    }
}
