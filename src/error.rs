//! Crate error type.

use thiserror::Error as ThisError;

/// Errors surfaced by the public API.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("tuple of {len} bytes exceeds the maximum tuple length")]
    TupleTooLarge { len: usize },

    #[error("relation has exhausted its addressable bucket space")]
    CapacityExceeded,

    #[error("relation was opened read-only")]
    ReadOnly,
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Error {
        Error::MalformedInput(msg.into())
    }
}

/// Local, recoverable signal used by the page/relation layer when a page has
/// no room for another tuple. Never surfaced through [`Error`]: page-full is
/// something the relation layer resolves by walking or extending an
/// overflow chain, not a caller-visible failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageFull;
