use crate::models::Student;

/// A deleted record and the roster position it was removed from.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedEntry {
    pub student: Student,
    pub position: usize,
}

/// Single-slot undo log: only the most recent deletion can be restored.
#[derive(Debug, Clone, Default)]
pub struct UndoLog {
    slot: Option<DeletedEntry>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a deletion, replacing whatever was held before.
    pub fn record_deletion(&mut self, entry: DeletedEntry) {
        self.slot = Some(entry);
    }

    pub fn peek(&self) -> Option<&DeletedEntry> {
        self.slot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}
