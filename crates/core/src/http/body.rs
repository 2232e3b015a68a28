//! Single-read message bodies.

use bytes::Bytes;

/// Error raised when a body is read after it was consumed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BodyError {
    #[error("body already used")]
    AlreadyUsed,
}

/// A message body that can be read exactly once.
///
/// Reading moves the bytes out. Anything that needs to hand the same payload to
/// two consumers must call [`Body::tee`] before either of them reads.
#[derive(Debug, Default)]
pub struct Body {
    bytes: Option<Bytes>,
}

impl Body {
    /// An empty, unread body.
    pub fn empty() -> Self {
        Self { bytes: Some(Bytes::new()) }
    }

    /// Whether the body has been consumed.
    pub fn is_used(&self) -> bool {
        self.bytes.is_none()
    }

    /// Consume the body, returning its bytes.
    pub fn take(&mut self) -> Result<Bytes, BodyError> {
        self.bytes.take().ok_or(BodyError::AlreadyUsed)
    }

    /// Produce an independent readable instance of this body.
    ///
    /// Both instances can be read once each. Fails if this body has already
    /// been consumed.
    pub fn tee(&self) -> Result<Body, BodyError> {
        match &self.bytes {
            Some(bytes) => Ok(Body { bytes: Some(bytes.clone()) }),
            None => Err(BodyError::AlreadyUsed),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self { bytes: Some(bytes) }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(Bytes::from(bytes)) }
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self { bytes: Some(Bytes::from_static(text.as_bytes())) }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self { bytes: Some(Bytes::from(text)) }
    }
}
