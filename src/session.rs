//! The session ties the roster pieces together: one record store backed by
//! one file, the undo slot for that file, and the waiting queue. Every
//! operation the front-end can trigger is a method here and returns an owned
//! [`OperationResult`].
//!
//! Mutations are write-through. Each one is applied to a staged copy of the
//! store, the copy is written to disk, and only then does it replace the live
//! store. A failed write therefore leaves memory and file exactly as they
//! were.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::error::{Result, RosterError};
use crate::models::{Cne, SortMode, Student};
use crate::roster::{self, DeletedEntry, RecordStore, UndoLog, WaitingQueue};

/// Data attached to a successful operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Record(Student),
    List(Vec<Student>),
}

/// Successful result of a session operation: a message for the status line
/// plus an optional record or list.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub message: String,
    pub payload: Payload,
}

impl Outcome {
    fn new(message: impl Into<String>, payload: Payload) -> Self {
        Self {
            message: message.into(),
            payload,
        }
    }

    pub fn record(&self) -> Option<&Student> {
        match &self.payload {
            Payload::Record(student) => Some(student),
            _ => None,
        }
    }

    pub fn list(&self) -> Option<&[Student]> {
        match &self.payload {
            Payload::List(students) => Some(students),
            _ => None,
        }
    }
}

pub type OperationResult = Result<Outcome>;

/// Explicit context for one user session.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    store: RecordStore,
    undo: UndoLog,
    queue: WaitingQueue,
}

impl Session {
    /// Load the roster at `path`. The file must exist and parse cleanly.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let store = roster::load(&path)?;
        info!(path = %path.display(), students = store.len(), "roster loaded");
        Ok(Self {
            path,
            store,
            undo: UndoLog::new(),
            queue: WaitingQueue::new(),
        })
    }

    /// Like [`Session::load`], but first creates the parent directory and an
    /// empty roster file when they do not exist yet.
    pub fn open_or_create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| RosterError::io(parent, err))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| RosterError::io(&path, err))?;
        Self::load(path)
    }

    /// Replace the store with the contents of `path` (or re-read the current
    /// file when `None`). The undo slot belongs to the previous file and is
    /// cleared; the waiting queue is kept. On failure the session is
    /// unchanged.
    pub fn reload(&mut self, path: Option<PathBuf>) -> OperationResult {
        let path = path.unwrap_or_else(|| self.path.clone());
        let store = roster::load(&path).inspect_err(|err| {
            warn!(path = %path.display(), error = %err, "reload failed");
        })?;

        let message = format!("Loaded {} students from {}.", store.len(), path.display());
        info!(path = %path.display(), students = store.len(), "roster reloaded");
        self.store = store;
        self.path = path;
        self.undo.clear();
        Ok(Outcome::new(message, self.list_payload()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn queue(&self) -> &WaitingQueue {
        &self.queue
    }

    pub fn sort_mode(&self) -> SortMode {
        self.store.sort_mode()
    }

    /// Record that the next undo would restore, if any.
    pub fn pending_undo(&self) -> Option<&Student> {
        self.undo.peek().map(|entry| &entry.student)
    }

    /// Full roster in its current order.
    pub fn list(&self) -> Outcome {
        Outcome::new(
            format!("{} students.", self.store.len()),
            self.list_payload(),
        )
    }

    /// Write the current roster to the backing file.
    pub fn save(&self) -> OperationResult {
        self.persist(&self.store)?;
        Ok(Outcome::new("Roster saved.", Payload::None))
    }

    /// Append a new student and persist.
    pub fn add_student(&mut self, student: Student) -> OperationResult {
        let mut staged = self.store.clone();
        staged.insert(student.clone()).inspect_err(|err| {
            warn!(cne = student.cne, error = %err, "add rejected");
        })?;
        self.commit(staged)?;

        info!(cne = student.cne, "student added");
        Ok(Outcome::new(
            format!("Added {student}."),
            Payload::Record(student),
        ))
    }

    /// Remove a student by CNE, remember it for undo, and persist.
    pub fn delete_student(&mut self, cne: Cne) -> OperationResult {
        let mut staged = self.store.clone();
        let (position, student) = staged.remove(cne).inspect_err(|err| {
            warn!(cne, error = %err, "delete rejected");
        })?;
        self.commit(staged)?;

        self.undo.record_deletion(DeletedEntry {
            student: student.clone(),
            position,
        });
        info!(cne, position, "student deleted");
        Ok(Outcome::new(
            format!("Deleted {student}."),
            Payload::Record(student),
        ))
    }

    /// Look up a student by CNE.
    pub fn find_student(&self, cne: Cne) -> OperationResult {
        let student = self.store.find(cne)?;
        debug!(cne, "student found");
        Ok(Outcome::new(
            format!("Found {student}."),
            Payload::Record(student.clone()),
        ))
    }

    /// Restore the most recent deletion at its former position. The slot is
    /// only cleared once the restore has been written.
    pub fn undo_delete(&mut self) -> OperationResult {
        let entry = self.undo.peek().cloned().ok_or(RosterError::EmptyUndo)?;

        let mut staged = self.store.clone();
        staged
            .insert_at(entry.position, entry.student.clone())
            .inspect_err(|err| {
                warn!(cne = entry.student.cne, error = %err, "undo rejected");
            })?;
        self.commit(staged)?;
        self.undo.clear();

        info!(cne = entry.student.cne, position = entry.position, "deletion undone");
        Ok(Outcome::new(
            format!("Restored {}.", entry.student),
            Payload::Record(entry.student),
        ))
    }

    /// Sort by average and persist the new order. Asking for the mode the
    /// store is already in succeeds without rewriting the file.
    pub fn sort_by_average(&mut self, ascending: bool) -> OperationResult {
        let mode = SortMode::from_ascending(ascending);
        if self.store.sort_mode() == mode {
            return Ok(Outcome::new(
                format!("Already {}.", mode.label().to_lowercase()),
                self.list_payload(),
            ));
        }

        let mut staged = self.store.clone();
        staged.sort_by_average(ascending);
        self.commit(staged)?;

        info!(?mode, "roster sorted");
        Ok(Outcome::new(mode.label().to_string() + ".", self.list_payload()))
    }

    /// Add an enrollment request to the tail of the waiting queue.
    pub fn enqueue(&mut self, student: Student) -> OperationResult {
        self.queue.enqueue(student.clone()).inspect_err(|err| {
            warn!(cne = student.cne, error = %err, "enqueue rejected");
        })?;
        info!(cne = student.cne, waiting = self.queue.len(), "request queued");
        Ok(Outcome::new(
            format!("Queued {student}."),
            Payload::Record(student),
        ))
    }

    /// Drop the head of the waiting queue without enrolling it.
    pub fn dequeue(&mut self) -> OperationResult {
        let student = self.queue.dequeue()?;
        info!(cne = student.cne, waiting = self.queue.len(), "request removed");
        Ok(Outcome::new(
            format!("Removed {student} from the waiting queue."),
            Payload::Record(student),
        ))
    }

    /// Enroll the head of the waiting queue into the roster. When the insert
    /// fails the request is gone from the queue; the error carries it.
    pub fn promote(&mut self) -> OperationResult {
        let path = &self.path;
        let store = &mut self.store;
        let student = self.queue.promote(|student| {
            let mut staged = store.clone();
            staged.insert(student)?;
            write_store(&staged, path)?;
            *store = staged;
            Ok(())
        })?;

        info!(cne = student.cne, waiting = self.queue.len(), "request enrolled");
        Ok(Outcome::new(
            format!("Enrolled {student}."),
            Payload::Record(student),
        ))
    }

    /// Waiting requests in FIFO order; the iterator can be cloned to restart.
    pub fn waiting(&self) -> impl Iterator<Item = &Student> + Clone {
        self.queue.iter()
    }

    pub fn render_roster(&self) -> String {
        roster::format_roster(&self.store)
    }

    pub fn render_ranking(&self) -> String {
        roster::format_ranking(&self.store)
    }

    pub fn render_queue(&self) -> String {
        roster::format_queue(&self.queue)
    }

    fn list_payload(&self) -> Payload {
        Payload::List(self.store.records().to_vec())
    }

    fn persist(&self, store: &RecordStore) -> Result<()> {
        write_store(store, &self.path)
    }

    fn commit(&mut self, staged: RecordStore) -> Result<()> {
        self.persist(&staged)?;
        self.store = staged;
        Ok(())
    }
}

fn write_store(store: &RecordStore, path: &Path) -> Result<()> {
    roster::save(store, path).inspect_err(|err| {
        error!(path = %path.display(), error = %err, "failed to write roster");
    })
}
