//! Streaming path: upstream SSE bytes in, rewritten SSE text out.

pub mod interceptor;
pub mod sse;

pub use interceptor::{Handshake, StreamInterceptor};
pub use sse::{lines, LineDecoder};

use futures_util::{Stream, StreamExt};

/// Pump an upstream chunk stream through `interceptor`.
///
/// The returned stream is lazy: each poll reads upstream only as far as the
/// next complete line. Dropping it drops `upstream`, which is how a client
/// disconnect closes the upstream connection. An upstream error is yielded
/// once and ends the stream.
pub fn intercept<S, B, E>(
    upstream: S,
    mut interceptor: StreamInterceptor,
) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    async_stream::stream! {
        let upstream_lines = lines(upstream);
        futures_util::pin_mut!(upstream_lines);

        while let Some(line) = upstream_lines.next().await {
            match line {
                Ok(line) => {
                    for chunk in interceptor.process_line(&line) {
                        metrics::counter!("sse_messages_relayed_total").increment(1);
                        yield Ok(chunk);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
    }
}
