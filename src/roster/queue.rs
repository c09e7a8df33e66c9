use std::collections::vec_deque;
use std::collections::{HashSet, VecDeque};

use tracing::warn;

use crate::error::{Result, RosterError};
use crate::models::{Cne, Student};

/// FIFO of pending enrollment requests. CNE uniqueness is enforced within the
/// queue only; the roster is checked when a request is promoted.
#[derive(Debug, Clone, Default)]
pub struct WaitingQueue {
    entries: VecDeque<Student>,
    keys: HashSet<Cne>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, cne: Cne) -> bool {
        self.keys.contains(&cne)
    }

    /// Oldest request, served first.
    pub fn peek(&self) -> Option<&Student> {
        self.entries.front()
    }

    /// Requests in FIFO order. The iterator is `Clone`, so a rendering can be
    /// restarted without touching the queue.
    pub fn iter(&self) -> vec_deque::Iter<'_, Student> {
        self.entries.iter()
    }

    /// Append a validated request at the tail.
    pub fn enqueue(&mut self, student: Student) -> Result<()> {
        student.validate()?;
        if !self.keys.insert(student.cne) {
            return Err(RosterError::DuplicateKey(student.cne));
        }
        self.entries.push_back(student);
        Ok(())
    }

    /// Remove and return the head of the queue.
    pub fn dequeue(&mut self) -> Result<Student> {
        let student = self.entries.pop_front().ok_or(RosterError::EmptyQueue)?;
        self.keys.remove(&student.cne);
        Ok(student)
    }

    /// Dequeue the head and hand it to `enroll`.
    ///
    /// The head leaves the queue before `enroll` runs and is not put back if
    /// enrollment fails. The dropped record is logged in full and returned
    /// inside [`RosterError::PromotionRejected`].
    pub fn promote<F>(&mut self, enroll: F) -> Result<Student>
    where
        F: FnOnce(Student) -> Result<()>,
    {
        let student = self.dequeue()?;
        match enroll(student.clone()) {
            Ok(()) => Ok(student),
            Err(source) => {
                let grades = student.grades.values();
                warn!(
                    cne = student.cne,
                    last_name = %student.last_name,
                    first_name = %student.first_name,
                    grades = ?grades,
                    error = %source,
                    "promotion failed, request dropped from waiting queue"
                );
                Err(RosterError::PromotionRejected {
                    student: Box::new(student),
                    source: Box::new(source),
                })
            }
        }
    }
}

impl<'a> IntoIterator for &'a WaitingQueue {
    type Item = &'a Student;
    type IntoIter = vec_deque::Iter<'a, Student>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::Grades;

    fn request(cne: Cne) -> Student {
        Student::new("Chraibi", "Ines", cne, Grades::new([13.0, 14.0, 15.0, 16.0])).unwrap()
    }

    #[test]
    fn serves_oldest_request_first() {
        let mut queue = WaitingQueue::new();
        queue.enqueue(request(3)).unwrap();
        queue.enqueue(request(1)).unwrap();
        queue.enqueue(request(2)).unwrap();

        assert_eq!(queue.dequeue().unwrap().cne, 3);
        assert_eq!(queue.dequeue().unwrap().cne, 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn duplicate_request_leaves_queue_unchanged() {
        let mut queue = WaitingQueue::new();
        queue.enqueue(request(7)).unwrap();
        let err = queue.enqueue(request(7)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn dequeued_key_can_be_queued_again() {
        let mut queue = WaitingQueue::new();
        queue.enqueue(request(7)).unwrap();
        queue.dequeue().unwrap();
        assert!(queue.enqueue(request(7)).is_ok());
    }

    #[test]
    fn empty_queue_fails_dequeue_and_promote() {
        let mut queue = WaitingQueue::new();
        assert_eq!(queue.dequeue().unwrap_err().kind(), ErrorKind::EmptyQueue);

        let mut called = false;
        let err = queue
            .promote(|_| {
                called = true;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyQueue);
        assert!(!called);
    }

    #[test]
    fn rejected_promotion_drops_and_reports_record() {
        let mut queue = WaitingQueue::new();
        queue.enqueue(request(9)).unwrap();
        queue.enqueue(request(10)).unwrap();

        let err = queue
            .promote(|s| Err(RosterError::DuplicateKey(s.cne)))
            .unwrap_err();

        match err {
            RosterError::PromotionRejected { student, source } => {
                assert_eq!(student.cne, 9);
                assert_eq!(source.kind(), ErrorKind::DuplicateKey);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(queue.peek().map(|s| s.cne), Some(10));
        assert!(!queue.contains(9));
    }

    #[test]
    fn listing_is_restartable() {
        let mut queue = WaitingQueue::new();
        queue.enqueue(request(1)).unwrap();
        queue.enqueue(request(2)).unwrap();

        let listing = queue.iter();
        let first: Vec<Cne> = listing.clone().map(|s| s.cne).collect();
        let second: Vec<Cne> = listing.map(|s| s.cne).collect();
        assert_eq!(first, vec![1, 2]);
        assert_eq!(first, second);
    }
}
