//! Debug trace helpers for raw stream capture.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use futures_util::Stream;

static TRACE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Env-gated capture of the raw SSE byte stream.
///
/// Set `UPLINK_DEBUG_TRACE=1` (capture under the temp dir) or
/// `UPLINK_DEBUG_TRACE=/some/dir` to tee stream bytes to a file.
#[derive(Debug, Clone)]
pub struct DebugTrace {
    id: String,
    dir: PathBuf,
}

impl DebugTrace {
    pub fn from_env(label: &str) -> Option<Self> {
        let raw = std::env::var("UPLINK_DEBUG_TRACE").ok()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let dir = if trimmed == "1" || trimmed.eq_ignore_ascii_case("true") {
            std::env::temp_dir().join("uplink-trace")
        } else {
            PathBuf::from(trimmed)
        };

        if fs::create_dir_all(&dir).is_err() {
            return None;
        }

        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let counter = TRACE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let id = format!("{label}_{ts}_{counter}");

        Some(Self { id, dir })
    }

    pub fn stream_writer(&self) -> Option<BufWriter<File>> {
        File::create(self.stream_path()).ok().map(BufWriter::new)
    }

    fn stream_path(&self) -> PathBuf {
        self.dir.join(format!("{}_stream.sse", self.id))
    }
}

pub struct TeeStream<S> {
    inner: S,
    sink: Option<BufWriter<File>>,
}

impl<S> TeeStream<S> {
    fn new(inner: S, sink: BufWriter<File>) -> Self {
        Self {
            inner,
            sink: Some(sink),
        }
    }
}

impl<S, E> Stream for TeeStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
{
    type Item = std::result::Result<Bytes, E>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(bytes))) => {
                let mut disable = false;
                if let Some(sink) = &mut self.sink
                    && sink.write_all(&bytes).is_err()
                {
                    disable = true;
                }
                if disable {
                    self.sink = None;
                }
                Poll::Ready(Some(Ok(bytes)))
            }
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err))),
            Poll::Ready(None) => {
                if let Some(sink) = &mut self.sink {
                    let _ = sink.flush();
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

pub enum TraceStream<S> {
    Plain(S),
    Tee(TeeStream<S>),
}

impl<S, E> Stream for TraceStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
{
    type Item = std::result::Result<Bytes, E>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        match &mut *self {
            TraceStream::Plain(inner) => Pin::new(inner).poll_next(cx),
            TraceStream::Tee(inner) => Pin::new(inner).poll_next(cx),
        }
    }
}

pub fn wrap_stream<S, E>(trace: Option<DebugTrace>, stream: S) -> TraceStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
{
    if let Some(trace) = trace
        && let Some(writer) = trace.stream_writer()
    {
        return TraceStream::Tee(TeeStream::new(stream, writer));
    }

    TraceStream::Plain(stream)
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn test_tee_stream_passes_bytes_through_and_captures() {
        let dir = tempfile::tempdir().unwrap();
        let capture = dir.path().join("capture.sse");
        let writer = BufWriter::new(File::create(&capture).unwrap());

        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"event: ping\n")),
            Ok(Bytes::from_static(b"data: 1\n\n")),
        ];
        let mut stream = TeeStream::new(futures_util::stream::iter(chunks), writer);

        let mut seen = Vec::new();
        while let Some(item) = stream.next().await {
            seen.extend_from_slice(&item.unwrap());
        }

        assert_eq!(seen, b"event: ping\ndata: 1\n\n");
        assert_eq!(fs::read(&capture).unwrap(), b"event: ping\ndata: 1\n\n");
    }
}
