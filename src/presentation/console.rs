//! Terminal output for pipeline events.
//!
//! The console task is the only writer to stdout while the pipeline runs.
//! Progress updates overwrite a single line; any other event first closes
//! that line so nothing is drawn over it.

use crate::domain::models::AppEvent;
use crate::presentation::progress::render_progress_line;
use crate::presentation::theme::paint;
use std::io::{self, Write};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

pub struct Console<W: Write> {
    out: W,
    progress_open: bool,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            progress_open: false,
        }
    }

    pub fn render(&mut self, event: &AppEvent) -> io::Result<()> {
        match event {
            AppEvent::ScanProgress(fraction) => {
                write!(self.out, "\r{}", render_progress_line(*fraction))?;
                self.progress_open = true;
            }
            other => {
                self.close_progress_line()?;
                writeln!(self.out, "{}", format_event(other))?;
            }
        }
        self.out.flush()
    }

    /// Terminate a dangling progress line.
    pub fn finish(&mut self) -> io::Result<()> {
        self.close_progress_line()?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn close_progress_line(&mut self) -> io::Result<()> {
        if self.progress_open {
            writeln!(self.out)?;
            self.progress_open = false;
        }
        Ok(())
    }
}

/// Drain `events` onto stdout until every sender is dropped.
pub fn spawn_console(mut events: mpsc::UnboundedReceiver<AppEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut console = Console::new(io::stdout());
        while let Some(event) = events.recv().await {
            if let Err(e) = console.render(&event) {
                warn!(error = %e, "Failed to write to stdout");
            }
        }
        let _ = console.finish();
    })
}

pub fn format_event(event: &AppEvent) -> String {
    match event {
        AppEvent::ScanProgress(fraction) => render_progress_line(*fraction),
        AppEvent::ServiceFound { uuid, description } => {
            format!("Found Service: {} - {}", uuid, description)
        }
        AppEvent::CharacteristicValue { uuid, value } => {
            format!("Characteristic {}: {}", uuid, format_value(value))
        }
        AppEvent::OnboardStorage { value, .. } => {
            format!("Onboard Storage Data: {}", format_value(value))
        }
        AppEvent::ReadTimedOut { uuid } => {
            format!("Read operation timed out for characteristic {}", uuid)
        }
        AppEvent::ReadFailed { uuid, error } => {
            format!("Failed to read characteristic {}: {}", uuid, error)
        }
        AppEvent::LogMessage(status) => paint(status.severity, &status.message).to_string(),
    }
}

/// Printable ASCII is shown quoted, anything else as hex bytes.
pub fn format_value(value: &[u8]) -> String {
    let trimmed = match value.iter().rposition(|b| *b != 0) {
        Some(last) => &value[..=last],
        None => &[][..],
    };

    if !trimmed.is_empty() && trimmed.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        format!("\"{}\"", String::from_utf8_lossy(trimmed))
    } else {
        format!("{:02X?}", value)
    }
}
