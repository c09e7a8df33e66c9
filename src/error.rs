//! Error types shared by every roster operation. Each variant maps onto one of
//! the failure kinds the front-end knows how to present, and the messages are
//! written so they can be shown to the user verbatim.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::{Cne, Student};

/// Failures surfaced by the record store, undo log, waiting queue, and
/// persistence layer.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("A student with CNE {0} already exists.")]
    DuplicateKey(Cne),

    #[error("No student found with CNE {0}.")]
    NotFound(Cne),

    #[error("No deletion to undo.")]
    EmptyUndo,

    #[error("The waiting queue is empty.")]
    EmptyQueue,

    #[error("{0}")]
    Validation(String),

    /// Promotion already removed `student` from the queue when the insert
    /// failed; the record is not re-queued, so it travels with the error.
    #[error("{student} was removed from the waiting queue but not enrolled: {source}")]
    PromotionRejected {
        student: Box<Student>,
        #[source]
        source: Box<RosterError>,
    },
}

/// Coarse classification of a [`RosterError`], convenient for matching in
/// callers and tests without destructuring payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    DuplicateKey,
    NotFound,
    EmptyUndo,
    EmptyQueue,
    Validation,
}

impl RosterError {
    /// Wrap an I/O error together with the file it concerned.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RosterError::Io {
            path: path.into(),
            source,
        }
    }

    /// Kind of the failure. A rejected promotion reports the kind of the
    /// insert error that caused it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RosterError::Io { .. } => ErrorKind::Io,
            RosterError::Parse { .. } => ErrorKind::Parse,
            RosterError::DuplicateKey(_) => ErrorKind::DuplicateKey,
            RosterError::NotFound(_) => ErrorKind::NotFound,
            RosterError::EmptyUndo => ErrorKind::EmptyUndo,
            RosterError::EmptyQueue => ErrorKind::EmptyQueue,
            RosterError::Validation(_) => ErrorKind::Validation,
            RosterError::PromotionRejected { source, .. } => source.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
