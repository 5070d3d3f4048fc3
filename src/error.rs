//! Crate-level error types.
//!
//! Three kinds of failure reach callers: bad input (a missing file, a
//! malformed argument or payload), validation (the request is well-formed
//! but cannot be honoured, reported with every violation found), and
//! failures of the underlying file or package I/O.
use crate::ooxml::OoxmlError;
use crate::ooxml::opc::OpcError;
use std::fmt;
use thiserror::Error;

/// Main error type for deckweave operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unreadable input, malformed argument or payload
    #[error("Input error: {0}")]
    Input(String),

    /// Request rejected; carries every violation found
    #[error("Validation failed: {0}")]
    Validation(Violations),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document package error
    #[error("Package error: {0}")]
    Package(OoxmlError),
}

/// Result type for deckweave operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The itemized violations, if this is a validation error.
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Error::Validation(v) => Some(v),
            _ => None,
        }
    }
}

impl From<OoxmlError> for Error {
    fn from(err: OoxmlError) -> Self {
        match err {
            OoxmlError::Io(e) => Error::Io(e),
            OoxmlError::Opc(OpcError::IoError(e)) => Error::Io(e),
            OoxmlError::Opc(OpcError::PackageNotFound(path)) => {
                Error::Input(format!("file not found: {}", path))
            },
            other => Error::Package(other),
        }
    }
}

impl From<OpcError> for Error {
    fn from(err: OpcError) -> Self {
        Error::from(OoxmlError::from(err))
    }
}

/// An aggregated list of problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations {
    pub summary: String,
    pub items: Vec<String>,
}

impl Violations {
    pub fn new(summary: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            summary: summary.into(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any item contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.items.iter().any(|item| item.contains(needle))
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        for item in &self.items {
            write!(f, "\n  - {}", item)?;
        }
        Ok(())
    }
}
