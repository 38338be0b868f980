//! Scan progress bar
//!
//! [`ProgressReporter`] runs as its own task while the scanner waits on the
//! host stack and reports elapsed time against the scan budget. It never
//! affects the scan result.

use crate::domain::models::AppEvent;
use crate::infrastructure::bluetooth::protocol::{PROGRESS_BAR_WIDTH, PROGRESS_REFRESH};
use colored::Colorize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

pub struct ProgressReporter {
    budget: Duration,
    event_sender: mpsc::UnboundedSender<AppEvent>,
}

/// Owner's handle on a running reporter.
pub struct ProgressHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ProgressReporter {
    pub fn new(budget: Duration, event_sender: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            budget,
            event_sender,
        }
    }

    /// Start drawing on a new task. Cancelling `parent` also stops it.
    pub fn spawn(self, parent: &CancellationToken) -> ProgressHandle {
        let token = parent.child_token();
        let task = tokio::spawn(self.run(token.clone()));
        ProgressHandle { token, task }
    }

    /// Draw until cancelled or the budget is used up.
    pub async fn run(self, token: CancellationToken) {
        let start = Instant::now();
        let mut ticker = time::interval(PROGRESS_REFRESH);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let fraction = progress_fraction(start.elapsed(), self.budget);
                    if self.event_sender.send(AppEvent::ScanProgress(fraction)).is_err() {
                        break;
                    }
                    if fraction >= 1.0 {
                        break;
                    }
                }
            }
        }
        trace!("Progress reporter finished");
    }
}

impl ProgressHandle {
    /// Cancel the reporter and wait for its task to exit.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Progress reporter task failed");
        }
    }
}

pub fn progress_fraction(elapsed: Duration, budget: Duration) -> f64 {
    if budget.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / budget.as_secs_f64()).min(1.0)
}

/// `Scanning: [####------] 40%` for the given fraction.
pub fn render_progress_line(fraction: f64) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (PROGRESS_BAR_WIDTH as f64 * fraction) as usize;
    let percent = (fraction * 100.0) as u32;
    format!(
        "Scanning: [{}{}] {}%",
        "#".repeat(filled).green(),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        percent
    )
}
