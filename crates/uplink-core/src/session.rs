//! Session connection lifecycle.
//!
//! A `Session` owns at most one live SSE subscription. Opening a new
//! connection or disconnecting terminates the previous handle first, and
//! dropping the session closes any live connection.

use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::USER_AGENT;
use crate::error::{ClientError, ClientErrorKind};
use crate::sse::{SseParser, StreamEvent};
use crate::trace::{DebugTrace, wrap_stream};

/// Connection lifecycle events delivered to the consumer loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The stream response arrived; the subscription is live.
    Opened,
    /// Periodic server ping with the latency estimate in milliseconds.
    ///
    /// The estimate is local receipt time minus the server send-timestamp,
    /// so it is clock-skew sensitive and may be negative.
    Ping { latency_ms: i64 },
    /// Server announced shutdown; the connection is closed.
    Shutdown { reason: Option<String> },
    /// Transport or protocol failure; the connection is closed.
    StreamError { error: ClientError },
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_millis()).ok())
        .unwrap_or(0)
}

struct ConnectionHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Controller owning the single live-status connection slot.
pub struct Session {
    http: reqwest::Client,
    base_url: String,
    current: Option<ConnectionHandle>,
}

impl Session {
    /// Creates a session controller for the given server base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            current: None,
        }
    }

    /// Opens the live-status stream, closing any existing connection first.
    ///
    /// Returns the receiver for this connection's events. The channel closes
    /// when the connection reaches a terminal state or is replaced.
    pub fn connect(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        self.close_current();

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let url = format!("{}/sse", self.base_url);
        let http = self.http.clone();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                () = task_cancel.cancelled() => {}
                () = drive_stream(http, url, tx) => {}
            }
        });

        self.current = Some(ConnectionHandle { cancel, task });
        rx
    }

    /// Closes the live connection if present. A no-op when none exists.
    pub fn disconnect(&mut self) {
        self.close_current();
    }

    /// Returns true while a connection task is live.
    pub fn is_connected(&self) -> bool {
        self.current.as_ref().is_some_and(|h| !h.task.is_finished())
    }

    fn close_current(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel.cancel();
        }
    }
}

impl Drop for Session {
    // The page-unload analog: a dying session never leaks a live stream.
    fn drop(&mut self) {
        self.close_current();
    }
}

async fn drive_stream(
    http: reqwest::Client,
    url: String,
    tx: mpsc::UnboundedSender<SessionEvent>,
) {
    let response = match http
        .get(&url)
        .header("accept", "text/event-stream")
        .header("user-agent", USER_AGENT)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            let _ = tx.send(SessionEvent::StreamError {
                error: ClientError::network(format!("stream request failed: {err}")),
            });
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let _ = tx.send(SessionEvent::StreamError {
            error: ClientError::http_status(status.as_u16(), &body),
        });
        return;
    }

    let _ = tx.send(SessionEvent::Opened);

    let trace = DebugTrace::from_env("sse");
    let byte_stream = wrap_stream(trace, response.bytes_stream());
    let mut events = Box::pin(SseParser::new(byte_stream));

    while let Some(result) = events.next().await {
        match result {
            Ok(StreamEvent::Ping { server_millis }) => {
                let _ = tx.send(SessionEvent::Ping {
                    latency_ms: now_millis() - server_millis,
                });
            }
            Ok(StreamEvent::Shutdown { reason }) => {
                let _ = tx.send(SessionEvent::Shutdown { reason });
                return;
            }
            // Default events carry nothing this client uses.
            Ok(StreamEvent::Message { .. }) => {}
            Err(error) if error.kind == ClientErrorKind::Parse => {
                // Malformed payloads are skipped, not fatal.
                eprintln!("uplink: skipping malformed stream event: {error}");
            }
            Err(error) => {
                let _ = tx.send(SessionEvent::StreamError { error });
                return;
            }
        }
    }

    // The stream ended without a close announcement: the server went away.
    let _ = tx.send(SessionEvent::StreamError {
        error: ClientError::network("stream ended unexpectedly"),
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn sse_response(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/event-stream")
            .set_body_string(body)
    }

    /// A response the server never finishes sending headers for; keeps the
    /// connection task pinned in-flight.
    fn hanging_response() -> ResponseTemplate {
        ResponseTemplate::new(200).set_delay(Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_stream_yields_open_ping_and_shutdown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sse"))
            .respond_with(sse_response(
                ":ok\n\nevent: ping\ndata: 0\n\nevent: close\ndata: {\"reason\":\"server shutdown\"}\n\n",
            ))
            .mount(&server)
            .await;

        let mut session = Session::new(server.uri());
        let mut rx = session.connect();

        assert_eq!(rx.recv().await, Some(SessionEvent::Opened));
        match rx.recv().await {
            // Server timestamp 0 means the delta is just local wall time.
            Some(SessionEvent::Ping { latency_ms }) => assert!(latency_ms > 0),
            other => panic!("expected ping, got {other:?}"),
        }
        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::Shutdown {
                reason: Some("server shutdown".to_string())
            })
        );
        // Terminal: the task is done, nothing further arrives.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_stream_eof_without_close_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sse"))
            .respond_with(sse_response("event: ping\ndata: 0\n\n"))
            .mount(&server)
            .await;

        let mut session = Session::new(server.uri());
        let mut rx = session.connect();

        assert_eq!(rx.recv().await, Some(SessionEvent::Opened));
        assert!(matches!(rx.recv().await, Some(SessionEvent::Ping { .. })));
        match rx.recv().await {
            Some(SessionEvent::StreamError { error }) => {
                assert_eq!(error.kind, ClientErrorKind::Network);
            }
            other => panic!("expected stream error, got {other:?}"),
        }
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sse"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized\n"))
            .mount(&server)
            .await;

        let mut session = Session::new(server.uri());
        let mut rx = session.connect();

        match rx.recv().await {
            Some(SessionEvent::StreamError { error }) => {
                assert_eq!(error.kind, ClientErrorKind::HttpStatus);
            }
            other => panic!("expected stream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_ping_is_skipped_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sse"))
            .respond_with(sse_response(
                "event: ping\ndata: garbage\n\nevent: close\ndata: {}\n\n",
            ))
            .mount(&server)
            .await;

        let mut session = Session::new(server.uri());
        let mut rx = session.connect();

        assert_eq!(rx.recv().await, Some(SessionEvent::Opened));
        // The bad ping produces no event; the stream continues to the close.
        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::Shutdown { reason: None })
        );
    }

    #[tokio::test]
    async fn test_connect_replaces_existing_connection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sse"))
            .respond_with(hanging_response())
            .mount(&server)
            .await;

        let mut session = Session::new(server.uri());
        let mut first = session.connect();
        let _second = session.connect();

        // The first connection was cancelled before producing any event.
        assert_eq!(first.recv().await, None);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_without_connection_is_noop() {
        let mut session = Session::new("http://127.0.0.1:1");
        session.disconnect();
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_drop_closes_live_connection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sse"))
            .respond_with(hanging_response())
            .mount(&server)
            .await;

        let mut session = Session::new(server.uri());
        let mut rx = session.connect();
        drop(session);

        // The reader task was cancelled; the channel closes with no events.
        assert_eq!(rx.recv().await, None);
    }
}
