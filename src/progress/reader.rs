//! Byte-counting reader

use super::TransferSession;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Transparent [`AsyncRead`] wrapper that counts delivered bytes into a [`TransferSession`]
///
/// Bytes and errors from the inner reader pass through untouched. The counter
/// is only advanced after the inner read has completed, so an observer never
/// sees bytes that have not been handed to the consumer yet.
#[derive(Debug)]
pub struct ProgressReader<R> {
    inner: R,
    session: TransferSession,
}

impl<R> ProgressReader<R> {
    /// Wrap `inner`, recording into `session`
    pub fn new(inner: R, session: TransferSession) -> Self {
        Self { inner, session }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let requested = buf.remaining();

        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let n = buf.filled().len() - before;
                if n == 0 && requested > 0 {
                    this.session.mark_finished();
                } else {
                    this.session.record(n as u64);
                }
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}
