//! Body decorator that tees a response into the cache as it is read.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use http_body::{Body as HttpBody, Frame, SizeHint};
use pin_project::pin_project;

/// Called once with the complete body; the returned future performs the
/// cache write.
pub type OnComplete = Box<dyn FnOnce(Bytes) -> BoxFuture<'static, ()> + Send>;

/// Forwards every frame of the inner body unchanged while buffering its data.
///
/// When the inner body ends, the buffered bytes are handed to the completion
/// callback and the write it returns is driven to completion before the
/// writer itself reports end of stream. A consumer that has drained the body
/// can therefore rely on the entry being stored.
///
/// Nothing is written if the inner body fails or if the writer is dropped
/// before the end of the stream.
#[pin_project]
pub struct CacheWriter<B> {
    #[pin]
    inner: B,
    buffer: BytesMut,
    on_complete: Option<OnComplete>,
    flush: Option<BoxFuture<'static, ()>>,
    finished: bool,
}

impl<B> CacheWriter<B> {
    pub fn new(inner: B, on_complete: OnComplete) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            on_complete: Some(on_complete),
            flush: None,
            finished: false,
        }
    }
}

impl<B> HttpBody for CacheWriter<B>
where
    B: HttpBody<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        loop {
            if let Some(flush) = this.flush.as_mut() {
                ready!(flush.as_mut().poll(cx));
                *this.flush = None;
                *this.finished = true;
            }
            if *this.finished {
                return Poll::Ready(None);
            }

            match ready!(this.inner.as_mut().poll_frame(cx)) {
                Some(Ok(frame)) => {
                    if let Some(data) = frame.data_ref() {
                        this.buffer.extend_from_slice(data);
                    }
                    return Poll::Ready(Some(Ok(frame)));
                }
                Some(Err(error)) => {
                    this.on_complete.take();
                    this.buffer.clear();
                    *this.finished = true;
                    return Poll::Ready(Some(Err(error)));
                }
                None => match this.on_complete.take() {
                    Some(on_complete) => {
                        let body = this.buffer.split().freeze();
                        *this.flush = Some(on_complete(body));
                    }
                    None => *this.finished = true,
                },
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.finished
            || (self.flush.is_none() && self.on_complete.is_none() && self.inner.is_end_stream())
    }

    fn size_hint(&self) -> SizeHint {
        if self.finished {
            SizeHint::with_exact(0)
        } else {
            self.inner.size_hint()
        }
    }
}

impl<B> fmt::Debug for CacheWriter<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheWriter")
            .field("buffered", &self.buffer.len())
            .field("pending_write", &self.flush.is_some())
            .field("finished", &self.finished)
            .finish()
    }
}
