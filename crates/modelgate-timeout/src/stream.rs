//! Deadline-bounded chunk streams.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Future, Stream};
use modelgate_core::{ChunkStream, StreamChunk};
use pin_project_lite::pin_project;
use tokio::time::{Instant, Sleep};

pin_project! {
    /// Forwards chunks from the wrapped stream until either the upstream
    /// terminates or the deadline fires. Expiry closes the sequence
    /// cleanly: no error chunk is synthesized, chunks already delivered
    /// stand.
    pub struct DeadlineStream {
        #[pin]
        inner: ChunkStream,
        #[pin]
        deadline: Sleep,
        expired: bool,
        on_expire: Option<Box<dyn FnOnce() + Send>>,
    }
}

impl DeadlineStream {
    pub fn new(inner: ChunkStream, deadline: Instant) -> Self {
        Self {
            inner,
            deadline: tokio::time::sleep_until(deadline),
            expired: false,
            on_expire: None,
        }
    }

    /// Attaches a hook invoked once if the deadline closes the stream.
    pub(crate) fn with_expire_hook(mut self, hook: Box<dyn FnOnce() + Send>) -> Self {
        self.on_expire = Some(hook);
        self
    }
}

impl Stream for DeadlineStream {
    type Item = StreamChunk;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamChunk>> {
        let this = self.project();
        if *this.expired {
            return Poll::Ready(None);
        }
        if this.deadline.poll(cx).is_ready() {
            *this.expired = true;
            if let Some(hook) = this.on_expire.take() {
                hook();
            }
            return Poll::Ready(None);
        }
        this.inner.poll_next(cx)
    }
}
