//! Terminal renderer for status transitions.
//!
//! The renderer owns all output. Output contract:
//! - Status and latency lines → stdout
//! - Diagnostics → stderr

use std::io::{Stderr, Stdout, Write, stderr, stdout};

use crossterm::style::{Color, Stylize};
use uplink_core::status::StatusView;

/// Latency readout color, carried over from the original status surface.
const PING_COLOR: Color = Color::Rgb {
    r: 0x06,
    g: 0x4a,
    b: 0x72,
};

/// Writes status transitions and latency updates as colored lines.
pub struct StatusRenderer {
    stdout: Stdout,
    stderr: Stderr,
}

impl Default for StatusRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRenderer {
    pub fn new() -> Self {
        Self {
            stdout: stdout(),
            stderr: stderr(),
        }
    }

    /// Renders the current status as one colored line.
    pub fn status(&mut self, view: &StatusView) {
        let status = view.status();
        let message = status.message();
        if message.is_empty() {
            return;
        }
        let _ = writeln!(self.stdout, "{}", message.with(status.color()));
        let _ = self.stdout.flush();
    }

    /// Renders the latency readout after a ping.
    pub fn ping(&mut self, view: &StatusView) {
        if let Some(latency_ms) = view.latency_ms() {
            let line = format!("Ping: {latency_ms}ms");
            let _ = writeln!(self.stdout, "{}", line.with(PING_COLOR));
            let _ = self.stdout.flush();
        }
    }

    /// Reports a diagnostic to stderr.
    pub fn diagnostic(&mut self, message: &str) {
        let _ = writeln!(self.stderr, "{message}");
    }
}
