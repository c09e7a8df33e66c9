use std::collections::HashMap;

use crate::error::{Result, RosterError};
use crate::models::{Cne, SortMode, Student};

/// Ordered, in-memory collection of student records.
///
/// Records live in a contiguous vector so traversal follows the current
/// order, while `index` maps each CNE to its position for constant-time
/// lookups. The store itself never touches the disk; the session stages
/// changes on a copy and only commits once the backing file is written.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    pub(super) records: Vec<Student>,
    pub(super) index: HashMap<Cne, usize>,
    pub(super) sort_mode: SortMode,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in their current order.
    pub fn records(&self) -> &[Student] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Student> {
        self.records.iter()
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn contains(&self, cne: Cne) -> bool {
        self.index.contains_key(&cne)
    }

    /// Look up a record by CNE without mutating anything.
    pub fn find(&self, cne: Cne) -> Result<&Student> {
        self.index
            .get(&cne)
            .map(|&pos| &self.records[pos])
            .ok_or(RosterError::NotFound(cne))
    }

    /// Append a record at the end of the roster.
    pub fn insert(&mut self, student: Student) -> Result<()> {
        let end = self.records.len();
        self.insert_at(end, student)
    }

    /// Insert a record at `position`, clamped to the end of the roster. Used
    /// to put a restored record back where it was removed from.
    pub fn insert_at(&mut self, position: usize, student: Student) -> Result<()> {
        student.validate()?;
        if self.contains(student.cne) {
            return Err(RosterError::DuplicateKey(student.cne));
        }

        let position = position.min(self.records.len());
        self.records.insert(position, student);
        self.sort_mode = SortMode::Unsorted;
        self.reindex_from(position);
        Ok(())
    }

    /// Remove the record with `cne`, returning it with the position it held.
    pub fn remove(&mut self, cne: Cne) -> Result<(usize, Student)> {
        let position = *self.index.get(&cne).ok_or(RosterError::NotFound(cne))?;
        let student = self.records.remove(position);
        self.index.remove(&cne);
        self.sort_mode = SortMode::Unsorted;
        self.reindex_from(position);
        Ok((position, student))
    }

    /// Refresh index entries for every record at or after `start`.
    pub(super) fn reindex_from(&mut self, start: usize) {
        for (pos, student) in self.records.iter().enumerate().skip(start) {
            self.index.insert(student.cne, pos);
        }
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a Student;
    type IntoIter = std::slice::Iter<'a, Student>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
