use std::cmp::Ordering;

use crate::models::{SortMode, Student};

use super::store::RecordStore;

impl RecordStore {
    /// Reorder the roster by average and record the new sort mode.
    ///
    /// The sort is stable: students with equal averages keep their current
    /// relative order. Returns `false` without touching anything when the
    /// store is already in the requested mode.
    pub fn sort_by_average(&mut self, ascending: bool) -> bool {
        let requested = SortMode::from_ascending(ascending);
        if self.sort_mode == requested {
            return false;
        }

        self.records
            .sort_by(|a, b| compare_averages(a, b, ascending));
        self.sort_mode = requested;
        self.reindex_from(0);
        true
    }
}

fn compare_averages(a: &Student, b: &Student, ascending: bool) -> Ordering {
    let ordering = a.average().total_cmp(&b.average());
    if ascending {
        ordering
    } else {
        ordering.reverse()
    }
}
