//! Status display states for the terminal surface.
//!
//! Exactly one status is visible at a time. Transitions are driven by the
//! authenticate flow and by `SessionEvent`s; the latency readout only exists
//! while the session is connected.

use crossterm::style::Color;

use crate::session::SessionEvent;

/// Mutually exclusive display states.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Authenticating,
    /// Authentication succeeded; the stream is being established.
    Connecting,
    /// The live subscription is established.
    Connected,
    /// Authentication or stream failure; the message says which.
    Error { message: String },
    /// The server announced shutdown. Not an error.
    ServerShutdown { reason: Option<String> },
    /// The user closed the connection.
    Disconnected,
}

impl Status {
    /// The visible message for this state.
    pub fn message(&self) -> String {
        match self {
            Status::Idle => String::new(),
            Status::Authenticating => "Authenticating...".to_string(),
            Status::Connecting => "Authentication successful. Connecting...".to_string(),
            Status::Connected => {
                "Connected. Do not close this terminal or the session will end.".to_string()
            }
            Status::Error { message } => message.clone(),
            Status::ServerShutdown {
                reason: Some(reason),
            } => {
                format!("Server shutting down ({reason})... Disconnected")
            }
            Status::ServerShutdown { reason: None } => {
                "Server shutting down... Disconnected".to_string()
            }
            Status::Disconnected => "Disconnected".to_string(),
        }
    }

    /// The display color for this state.
    pub fn color(&self) -> Color {
        match self {
            Status::Idle => Color::Reset,
            Status::Authenticating
            | Status::Connecting
            | Status::ServerShutdown { .. }
            | Status::Disconnected => Color::Blue,
            Status::Connected => Color::Green,
            Status::Error { .. } => Color::Red,
        }
    }

    /// Terminal states end the connection cycle; any further connection
    /// requires a fresh authenticate-then-connect cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Status::Error { .. } | Status::ServerShutdown { .. } | Status::Disconnected
        )
    }
}

/// The fixed message for authentication failure.
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed. Please check your credentials.";

/// The fixed message for stream failure.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error. Please try again.";

/// Tracks the visible status plus the latency readout.
///
/// Every transition clears the latency display; pings only register while
/// connected, so nothing updates the readout after a terminal state.
#[derive(Debug, Clone, Default)]
pub struct StatusView {
    status: Status,
    latency_ms: Option<i64>,
}

impl StatusView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// The current latency estimate, present only while connected and after
    /// at least one ping.
    pub fn latency_ms(&self) -> Option<i64> {
        self.latency_ms
    }

    /// Transitions to a new status, clearing the latency readout.
    pub fn set(&mut self, status: Status) {
        self.latency_ms = None;
        self.status = status;
    }

    /// Applies a session event to the view.
    pub fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Opened => self.set(Status::Connected),
            SessionEvent::Ping { latency_ms } => {
                if self.status == Status::Connected {
                    self.latency_ms = Some(*latency_ms);
                }
            }
            SessionEvent::Shutdown { reason } => self.set(Status::ServerShutdown {
                reason: reason.clone(),
            }),
            SessionEvent::StreamError { .. } => self.set(Status::Error {
                message: CONNECTION_ERROR_MESSAGE.to_string(),
            }),
        }
    }
}
