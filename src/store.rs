//! Persistence contract for review records.
//!
//! The scheduler never talks to a database directly; it reads and writes
//! through a [`ScheduleStore`]. [`crate::database::Database`] is the SQLite
//! implementation, [`InMemoryScheduleStore`] keeps everything in a map.

use crate::error::Result;
use crate::spaced_repetition::{ReviewKey, ReviewRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub trait ScheduleStore {
    fn find(&self, key: &ReviewKey) -> Result<Option<ReviewRecord>>;

    /// Inserts the record, or replaces the one stored under the same key
    fn upsert(&self, record: &ReviewRecord) -> Result<()>;

    /// Every record of the user, in no particular order
    fn find_all_by_user(&self, user_id: &str) -> Result<Vec<ReviewRecord>>;

    /// Records of the user due at or before `at`
    fn find_due_for_user(&self, user_id: &str, at: DateTime<Utc>) -> Result<Vec<ReviewRecord>> {
        Ok(self
            .find_all_by_user(user_id)?
            .into_iter()
            .filter(|record| record.is_due(at))
            .collect())
    }

    /// Runs a read-modify-write of a single record as one unit
    ///
    /// Implementations must keep concurrent sections on the same record from
    /// interleaving. The default runs `f` as is, which is only correct for
    /// single-threaded stores.
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T>,
    {
        f(self)
    }
}

/// Map-backed store, mainly for tests and tooling
#[derive(Default)]
pub struct InMemoryScheduleStore {
    records: Mutex<HashMap<ReviewKey, ReviewRecord>>,
    section: Mutex<()>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> MutexGuard<'_, HashMap<ReviewKey, ReviewRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn find(&self, key: &ReviewKey) -> Result<Option<ReviewRecord>> {
        Ok(self.records().get(key).cloned())
    }

    fn upsert(&self, record: &ReviewRecord) -> Result<()> {
        self.records().insert(record.key.clone(), record.clone());
        Ok(())
    }

    fn find_all_by_user(&self, user_id: &str) -> Result<Vec<ReviewRecord>> {
        Ok(self
            .records()
            .values()
            .filter(|record| record.key.user_id == user_id)
            .cloned()
            .collect())
    }

    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let _guard = self.section.lock().unwrap_or_else(PoisonError::into_inner);
        f(self)
    }
}
