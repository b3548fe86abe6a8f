//! Body type carried by requests and responses through the pipeline.
//!
//! A [`Body`] is either fully materialized (responses synthesized from a
//! cache, short-circuit replies built by interceptors) or a boxed stream
//! handed over by the transport. Interceptors that need to observe the bytes
//! without buffering them upfront wrap the stream with their own
//! [`http_body::Body`] decorator and box it again with [`Body::wrap`].

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use http_body::{Body as HttpBody, Frame, SizeHint};
use http_body_util::BodyExt;
use http_body_util::combinators::UnsyncBoxBody;
use pin_project::pin_project;

/// Boxed error type used by body streams and transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A response (or request) body.
///
/// # Variants
///
/// - [`Complete`](Body::Complete): the bytes are already in memory. The
///   `Option` yields the data once, then reports end of stream.
/// - [`Streaming`](Body::Streaming): the bytes are produced lazily by a
///   boxed inner body.
#[pin_project(project = BodyProj)]
pub enum Body {
    /// Fully materialized body.
    Complete(Option<Bytes>),
    /// Lazily produced body.
    Streaming(#[pin] UnsyncBoxBody<Bytes, BoxError>),
}

impl Body {
    /// An empty, already finished body.
    pub fn empty() -> Self {
        Body::Complete(None)
    }

    /// A body holding `bytes` in memory.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() {
            Body::Complete(None)
        } else {
            Body::Complete(Some(bytes))
        }
    }

    /// Boxes any [`http_body::Body`] into a streaming body.
    pub fn wrap<B>(body: B) -> Self
    where
        B: HttpBody + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let boxed = body
            .map_frame(|frame| frame.map_data(|mut data| data.copy_to_bytes(data.remaining())))
            .map_err(|err: B::Error| -> BoxError { err.into() })
            .boxed_unsync();
        Body::Streaming(boxed)
    }

    /// Returns `true` when the body is held in memory.
    pub fn is_complete(&self) -> bool {
        matches!(self, Body::Complete(_))
    }

    /// Drains the body and returns every byte it produced.
    pub async fn into_bytes(self) -> Result<Bytes, BoxError> {
        match self {
            Body::Complete(Some(bytes)) => Ok(bytes),
            Body::Complete(None) => Ok(Bytes::new()),
            Body::Streaming(body) => Ok(body.collect().await?.to_bytes()),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::from_bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::from_bytes(text)
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Body::from_bytes(Bytes::from_static(text.as_bytes()))
    }
}

impl HttpBody for Body {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            BodyProj::Complete(data) => Poll::Ready(data.take().map(|bytes| Ok(Frame::data(bytes)))),
            BodyProj::Streaming(body) => body.poll_frame(cx),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Body::Complete(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Body::Complete(None) => SizeHint::with_exact(0),
            Body::Streaming(body) => body.size_hint(),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Body::Complete(data) => data.is_none(),
            Body::Streaming(body) => body.is_end_stream(),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Complete(Some(bytes)) => f
                .debug_tuple("Complete")
                .field(&format!("{} bytes", bytes.len()))
                .finish(),
            Body::Complete(None) => f.debug_tuple("Complete").field(&"consumed").finish(),
            Body::Streaming(_) => f.debug_tuple("Streaming").field(&"...").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    #[tokio::test]
    async fn complete_body_yields_once() {
        let mut body = Body::from("content");
        assert!(!body.is_end_stream());
        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), Bytes::from_static(b"content"));
        assert!(body.frame().await.is_none());
        assert!(body.is_end_stream());
    }

    #[tokio::test]
    async fn wrapped_body_is_collected() {
        let body = Body::wrap(Full::new(Bytes::from_static(b"streamed")));
        assert!(!body.is_complete());
        assert_eq!(body.into_bytes().await.unwrap(), Bytes::from_static(b"streamed"));
    }

    #[test]
    fn empty_bytes_become_finished_body() {
        let body = Body::from_bytes(Vec::new());
        assert!(body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(0));
    }
}
