use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strucmotif::engine::progress::{Progress, ProgressCallback};
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Stage of a partition, in the order the update pipeline runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Extracting,
    Persisting,
}

struct BarState {
    pb: ProgressBar,
    partition: Option<(usize, usize)>,
    stage: Stage,
}

impl BarState {
    fn label(&self) -> String {
        let stage = match self.stage {
            Stage::Idle => "Waiting",
            Stage::Extracting => "Extracting",
            Stage::Persisting => "Persisting",
        };
        match self.partition {
            Some((index, total)) => format!("[{}/{}] {}", index, total, stage),
            None => stage.to_string(),
        }
    }

    fn apply(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                self.partition = None;
                self.stage = Stage::Idle;
                self.pb.reset();
                self.pb.set_length(0);
                self.pb.set_style(spinner_style());
                self.pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                self.pb.set_message(name.to_string());
            }
            Progress::PhaseFinish => {
                self.pb.disable_steady_tick();
                self.pb.finish_with_message("✓ Done");
            }
            Progress::PartitionStart { index, total, .. } => {
                self.partition = Some((index, total));
                self.stage = Stage::Idle;
            }
            Progress::TaskStart { total_steps } => {
                // Extraction opens every partition; the next task persists it.
                self.stage = match self.stage {
                    Stage::Extracting => Stage::Persisting,
                    _ => Stage::Extracting,
                };
                self.pb.disable_steady_tick();
                self.pb.reset();
                self.pb.set_length(total_steps);
                self.pb.set_style(bar_style());
                self.pb.set_message(self.label());
            }
            Progress::TaskIncrement => self.pb.inc(1),
            Progress::TaskFinish => {
                if let Some(length) = self.pb.length() {
                    self.pb.set_position(length);
                }
                self.pb.finish();
            }
            Progress::Message(msg) => self.pb.println(format!("  {}", msg)),
        }
    }
}

/// Renders update progress as one terminal bar per partition stage.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr()))
    }

    fn with_bar(pb: ProgressBar) -> Self {
        pb.finish_and_clear();
        Self {
            state: Arc::new(Mutex::new(BarState {
                pb,
                partition: None,
                stage: Stage::Idle,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();
        Box::new(move |progress: Progress| match state.lock() {
            Ok(mut guard) => guard.apply(progress),
            Err(_) => warn!("Progress bar mutex was poisoned. Cannot update progress."),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}
