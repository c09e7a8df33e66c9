//! Roster core split across logical submodules: the in-memory record store,
//! its sort engine, the single-slot undo log, the waiting queue, the text
//! file persistence, and display formatting.

mod format;
mod persistence;
mod queue;
mod sort;
mod store;
mod undo;

pub use format::{format_queue, format_ranking, format_roster, format_student};
pub use persistence::{format_line, load, parse, save};
pub use queue::WaitingQueue;
pub use store::RecordStore;
pub use undo::{DeletedEntry, UndoLog};
