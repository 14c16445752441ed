use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::buffering::CircularLineBuffer;
use crate::streaming::SseFrame;
use crate::traits::FrameStream;

/// Turn a raw upstream byte stream into SSE frames.
///
/// Only complete lines are parsed; a fragment split across reads waits in the
/// line buffer. Lines that are not `data: ` events are skipped. The stream
/// ends after the `[DONE]` frame or when the body is exhausted.
pub fn parse_sse_frames<S, E>(byte_stream: S) -> FrameStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(byte_stream);
        let mut buffer = CircularLineBuffer::with_capacity(4096);

        'read: while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(&bytes);

                    while let Some(line) = buffer.next_line() {
                        let Some(data) = line.strip_prefix("data: ") else {
                            continue;
                        };

                        let frame = SseFrame::from_data(data);
                        let done = matches!(frame, SseFrame::Done);
                        yield Ok::<SseFrame, anyhow::Error>(frame);

                        if done {
                            break 'read;
                        }
                    }
                }
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    break;
                }
            }
        }

        if !buffer.is_empty() {
            tracing::debug!("Discarding {} bytes of unterminated stream tail", buffer.len());
        }
    })
}

/// Convenience for tests and scripted clients: frames from in-memory chunks
pub fn frames_from_chunks<I>(chunks: I) -> FrameStream
where
    I: IntoIterator,
    I::Item: Into<Bytes>,
    I::IntoIter: Send + 'static,
{
    let stream = futures::stream::iter(
        chunks
            .into_iter()
            .map(|chunk| Ok::<Bytes, std::convert::Infallible>(chunk.into())),
    );
    parse_sse_frames(stream)
}
