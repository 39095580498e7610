//! Minimal SSE line extraction for the Converse-stream backend.
//!
//! Buffers raw bytes, splits on newlines, and yields the JSON payload of
//! each `data:` line (skipping comments, blank lines, and `[DONE]`).

use bytes::{Bytes, BytesMut};
use futures::Stream;
use tokio_stream::StreamExt;

use crate::error::DispatchError;

/// Parse a byte stream into a stream of `data:` payload strings.
pub fn parse_sse_lines<S>(byte_stream: S) -> impl Stream<Item = Result<String, DispatchError>> + Send
where
    S: Stream<Item = Result<Bytes, DispatchError>> + Send + Unpin + 'static,
{
    futures::stream::unfold(
        (byte_stream, BytesMut::with_capacity(8192)),
        move |(mut stream, mut buffer)| async move {
            loop {
                if let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                    let mut line_bytes = buffer.split_to(newline_pos + 1);
                    line_bytes.truncate(line_bytes.len() - 1);
                    if line_bytes.last() == Some(&b'\r') {
                        line_bytes.truncate(line_bytes.len() - 1);
                    }
                    let Ok(line) = std::str::from_utf8(&line_bytes) else {
                        continue;
                    };
                    if let Some(data) = extract_sse_data(line) {
                        return Some((Ok(data), (stream, buffer)));
                    }
                    continue;
                }

                match stream.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => return Some((Err(e), (stream, buffer))),
                    None => return None,
                }
            }
        },
    )
}

fn extract_sse_data(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }
    let data = trimmed
        .strip_prefix("data: ")
        .or_else(|| trimmed.strip_prefix("data:"))?
        .trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    Some(data.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn extracts_single_event() {
        let chunks = vec![Ok(Bytes::from("data: {\"a\":1}\n\n"))];
        let stream = futures::stream::iter(chunks);
        let results: Vec<_> = parse_sse_lines(stream).collect().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap(), "{\"a\":1}");
    }

    #[tokio::test]
    async fn skips_done_marker_and_comments() {
        let chunks = vec![Ok(Bytes::from(
            ": comment\n\ndata: {\"v\":1}\n\ndata: [DONE]\n\n",
        ))];
        let stream = futures::stream::iter(chunks);
        let results: Vec<_> = parse_sse_lines(stream).collect().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap(), "{\"v\":1}");
    }

    #[tokio::test]
    async fn handles_split_chunks() {
        let chunks = vec![Ok(Bytes::from("data: {\"par")), Ok(Bytes::from("tial\":true}\n\n"))];
        let stream = futures::stream::iter(chunks);
        let results: Vec<_> = parse_sse_lines(stream).collect().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap(), "{\"partial\":true}");
    }

    #[tokio::test]
    async fn propagates_transport_errors() {
        let chunks: Vec<Result<Bytes, DispatchError>> = vec![Err(DispatchError::Upstream {
            message: "connection reset".to_string(),
        })];
        let stream = futures::stream::iter(chunks);
        let results: Vec<_> = parse_sse_lines(stream).collect().await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
