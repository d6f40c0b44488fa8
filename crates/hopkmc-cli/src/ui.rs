use hopkmc::engine::progress::{Progress, ProgressReporter};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::warn;

const EVENT_BUFFER: usize = 1024;
const SPINNER_TICK: Duration = Duration::from_millis(80);

#[derive(Debug)]
pub enum UiEvent {
    Progress(Progress),
    Log(String),
}

/// The phase currently shown on screen.
struct ActivePhase {
    name: &'static str,
    bar: ProgressBar,
    started: Instant,
    failed_trajectories: usize,
}

impl ActivePhase {
    fn status(&self, detail: &str) -> String {
        match self.failed_trajectories {
            0 => format!("{} ({})", self.name, detail),
            n => format!("{} ({}, {} failed)", self.name, detail, n),
        }
    }
}

/// Renders progress events on stderr from a dedicated tokio task.
pub struct UiManager {
    multi: MultiProgress,
    phase: Option<ActivePhase>,
    events: mpsc::Receiver<UiEvent>,
    shutdown: watch::Receiver<bool>,
    anchor: ProgressBar,
}

impl UiManager {
    pub fn new() -> (Self, mpsc::Sender<UiEvent>, watch::Sender<bool>) {
        Self::with_draw_target(ProgressDrawTarget::stderr_with_hz(12))
    }

    fn with_draw_target(
        target: ProgressDrawTarget,
    ) -> (Self, mpsc::Sender<UiEvent>, watch::Sender<bool>) {
        let (event_sender, events) = mpsc::channel(EVENT_BUFFER);
        let (shutdown_sender, shutdown) = watch::channel(false);
        let multi = MultiProgress::with_draw_target(target);
        // Keeps the multi-bar alive between phases.
        let anchor = multi.add(ProgressBar::hidden());
        let manager = Self {
            multi,
            phase: None,
            events,
            shutdown,
            anchor,
        };
        (manager, event_sender, shutdown_sender)
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(event) = self.events.recv() => self.dispatch(event),
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        while let Ok(event) = self.events.try_recv() {
            self.dispatch(event);
        }
        if let Some(phase) = self.phase.take() {
            phase.bar.finish_and_clear();
        }
        self.anchor.finish_and_clear();
    }

    fn dispatch(&mut self, event: UiEvent) {
        match event {
            UiEvent::Log(line) => self.print(line),
            UiEvent::Progress(progress) => self.on_progress(progress),
        }
    }

    fn on_progress(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => self.begin_phase(name),
            Progress::PhaseFinish => self.end_phase(),
            Progress::TaskStart { total_steps } => {
                if let Some(phase) = &self.phase {
                    phase.bar.disable_steady_tick();
                    phase.bar.set_style(task_style());
                    phase.bar.set_length(total_steps);
                    phase.bar.set_position(0);
                }
            }
            Progress::TaskIncrement => {
                if let Some(phase) = &self.phase {
                    phase.bar.inc(1);
                }
            }
            Progress::TaskFinish => {
                if let Some(phase) = &self.phase {
                    phase.bar.finish();
                }
            }
            Progress::StatusUpdate { text } => {
                if let Some(phase) = &self.phase {
                    phase.bar.set_message(phase.status(&text));
                }
            }
            Progress::TrajectoryFailed { index, reason } => {
                if let Some(phase) = self.phase.as_mut() {
                    phase.failed_trajectories += 1;
                }
                self.print(format!("  ✗ trajectory {index}: {reason}"));
            }
            Progress::Message(text) => self.print(format!("  {text}")),
        }
    }

    fn begin_phase(&mut self, name: &'static str) {
        if let Some(previous) = self.phase.take() {
            previous.bar.finish_and_clear();
        }
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(spinner_style());
        bar.set_message(name);
        bar.enable_steady_tick(SPINNER_TICK);
        self.phase = Some(ActivePhase {
            name,
            bar,
            started: Instant::now(),
            failed_trajectories: 0,
        });
    }

    fn end_phase(&mut self) {
        let Some(phase) = self.phase.take() else {
            return;
        };
        phase.bar.finish_and_clear();
        let elapsed = phase.started.elapsed().as_secs_f64();
        let summary = match phase.failed_trajectories {
            0 => format!("✓ {} ({:.1}s)", phase.name, elapsed),
            n => format!("✓ {} ({:.1}s, {} trajectories failed)", phase.name, elapsed, n),
        };
        self.print(summary);
    }

    fn print(&self, line: String) {
        if self.multi.println(line).is_err() {
            warn!("Progress display is unavailable.");
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
}

fn task_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<30} [{bar:40.cyan/blue}] {pos}/{len} (eta {eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸ ")
}

/// Forwards engine progress events to the UI task.
#[derive(Clone)]
pub struct UiProgressSink {
    sender: mpsc::Sender<UiEvent>,
}

impl UiProgressSink {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    /// Prints a line above the progress display.
    pub fn log(&self, line: impl Into<String>) {
        if let Err(e) = self.sender.try_send(UiEvent::Log(line.into())) {
            warn!("Dropped log line: {}", e);
        }
    }

    /// A reporter whose events are queued without blocking the worker threads; events are
    /// dropped when the queue is full.
    pub fn reporter(&self) -> ProgressReporter<'static> {
        let sender = self.sender.clone();
        ProgressReporter::with_callback(Box::new(move |progress: Progress| {
            if let Err(e) = sender.try_send(UiEvent::Progress(progress)) {
                warn!("Dropped progress update: {}", e);
            }
        }))
    }
}
