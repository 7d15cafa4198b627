//! SSE parser for the live-status stream.

use std::pin::Pin;

use eventsource_stream::{EventStream, EventStreamError, Eventsource};
use futures_util::Stream;
use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

/// Events carried on the live-status stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Periodic keepalive; payload is the server send-timestamp (unix millis).
    Ping { server_millis: i64 },
    /// Server is about to shut down; optional human-readable reason.
    Shutdown { reason: Option<String> },
    /// Default (unnamed) event; this client does not use them.
    Message { data: String },
}

/// SSE parser that converts a byte stream into `StreamEvent`s.
pub struct SseParser<S> {
    inner: EventStream<S>,
}

impl<S> SseParser<S> {
    pub fn new(stream: S) -> Self
    where
        S: Eventsource,
    {
        Self {
            inner: stream.eventsource(),
        }
    }
}

impl<S, E> Stream for SseParser<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = ClientResult<StreamEvent>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(event))) => {
                Poll::Ready(Some(parse_sse_event_fields(&event.event, &event.data)))
            }
            Poll::Ready(Some(Err(EventStreamError::Transport(e)))) => Poll::Ready(Some(Err(
                ClientError::network(format!("stream transport error: {e}")),
            ))),
            Poll::Ready(Some(Err(e))) => {
                Poll::Ready(Some(Err(ClientError::parse(format!("SSE stream error: {e}")))))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn parse_sse_event_fields(event_type: &str, data: &str) -> ClientResult<StreamEvent> {
    match event_type {
        "ping" => {
            let server_millis = data.trim().parse::<i64>().map_err(|err| {
                ClientError::parse(format!("Invalid ping timestamp {data:?}: {err}"))
            })?;
            Ok(StreamEvent::Ping { server_millis })
        }
        "close" => Ok(StreamEvent::Shutdown {
            reason: parse_close_reason(data),
        }),
        "message" => Ok(StreamEvent::Message {
            data: data.to_string(),
        }),
        other => Err(ClientError::parse(format!(
            "Unknown SSE event type: {other}"
        ))),
    }
}

/// The server sends `{"reason": ...}` with the close event. The payload is
/// advisory; anything unparseable degrades to no reason.
fn parse_close_reason(data: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ClosePayload {
        reason: Option<String>,
    }

    serde_json::from_str::<ClosePayload>(data)
        .ok()
        .and_then(|p| p.reason)
}
