//! Error taxonomy for the continuity engine.
//!
//! Three classes of failure cross the engine boundary: a referenced template
//! that does not exist, a failure inside the record store, and a caller
//! programming error (bad window lengths and the like). The engine performs
//! no retries and no swallowing of these; they propagate unchanged to the
//! caller, which owns retry and response-mapping policy.

/// Opaque failure raised by a [`RecordStore`](crate::store::RecordStore)
/// implementation.
///
/// Backends wrap whatever their driver produced; the engine never inspects
/// the payload, it only propagates it.
#[derive(Debug, thiserror::Error)]
#[error("record store failure: {0}")]
pub struct StorageError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl StorageError {
    /// Wraps an arbitrary backend error.
    pub fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(source))
    }

    /// Creates a storage error from a plain message.
    pub fn message(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContinuityError {
    /// The requested assessment template does not exist in the record store.
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    /// The record store failed; propagated unchanged, never retried here.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Caller contract violation (e.g. a non-positive validity window).
    #[error("precondition violated: {0}")]
    Precondition(String),
}

pub type ContinuityResult<T> = std::result::Result<T, ContinuityError>;
