//! Student roster manager.
//!
//! A roster of students is kept in a plain text file, one student per line.
//! The [`Session`] loads that file, applies every change to it immediately,
//! keeps a one-step undo for deletions, and holds a waiting queue of
//! enrollment requests that can be promoted into the roster. The `ui` module
//! puts a terminal front-end on top of the session.
pub mod config;
pub mod error;
pub mod models;
pub mod roster;
pub mod session;
pub mod ui;

pub use error::{ErrorKind, Result, RosterError};
pub use models::{Cne, Grades, SortMode, Student};
pub use session::{OperationResult, Outcome, Payload, Session};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
