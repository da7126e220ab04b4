//! Error taxonomy for the crate.
//!
//! Validation errors (axis, bounds, binning) are returned to the caller and
//! are non-fatal: the caller decides whether to retry or abort. Callback
//! errors are fatal to the run that raised them and are re-surfaced after
//! worker threads have been joined and partial state discarded.

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes of the binning and execution subsystems.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed axis description or out-of-range bin query.
    #[error("invalid axis: {0}")]
    InvalidAxis(String),

    /// Malformed executor bounds (length mismatch, empty, or min > max).
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    /// Malformed binning registration or inverse-range lookup.
    #[error("invalid binning: {0}")]
    InvalidBinning(String),

    /// No binning definition registered under the given name.
    #[error("definition not found: {0}")]
    DefinitionNotFound(String),

    /// Positional access past the end of an id list.
    #[error("index {index} out of range for id list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A parallel pass over a non-empty pending list merged zero entries.
    #[error("merge for definition '{0}' accepted no entries")]
    MergeFailure(String),

    /// A user callback failed. The source is opaque and propagated as-is.
    #[error("callback failed: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an arbitrary error raised inside a user callback.
    pub fn callback<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Callback(Box::new(source))
    }

    /// Wrap a plain message raised inside a user callback.
    pub fn callback_msg(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        Self::Callback(msg.into())
    }
}
