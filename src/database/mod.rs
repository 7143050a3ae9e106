pub mod connection;
pub mod review_records;

use crate::date_provider::{DateProvider, SystemDateProvider};
use crate::error::Result;
use crate::spaced_repetition::{ReviewKey, ReviewRecord};
use crate::store::ScheduleStore;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::Arc;

pub use review_records::ReviewRecordsRepository;

/// SQLite-backed review record storage
pub struct Database {
    conn: Connection,
    date_provider: Arc<dyn DateProvider>,
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self> {
        Self::init(db_path, Arc::new(SystemDateProvider))
    }

    pub fn with_date_provider(db_path: &str, date_provider: Arc<dyn DateProvider>) -> Result<Self> {
        Self::init(db_path, date_provider)
    }

    fn init(db_path: &str, date_provider: Arc<dyn DateProvider>) -> Result<Self> {
        let conn = connection::init_connection(db_path)?;
        Ok(Database {
            conn,
            date_provider,
        })
    }

    /// Clock used by services built on top of this database
    pub fn date_provider(&self) -> Arc<dyn DateProvider> {
        self.date_provider.clone()
    }

    pub fn get_current_time(&self) -> DateTime<Utc> {
        self.date_provider.get_current_time()
    }

    pub fn count_review_records(&self) -> Result<i64> {
        let repo = ReviewRecordsRepository::new(&self.conn);
        Ok(repo.count()?)
    }

    pub fn count_due_for_user(&self, user_id: &str, before_date: DateTime<Utc>) -> Result<i64> {
        let repo = ReviewRecordsRepository::new(&self.conn);
        Ok(repo.count_due_for_user(user_id, before_date)?)
    }
}

impl ScheduleStore for Database {
    fn find(&self, key: &ReviewKey) -> Result<Option<ReviewRecord>> {
        let repo = ReviewRecordsRepository::new(&self.conn);
        Ok(repo.find(key)?)
    }

    fn upsert(&self, record: &ReviewRecord) -> Result<()> {
        let repo = ReviewRecordsRepository::new(&self.conn);
        Ok(repo.upsert(record)?)
    }

    fn find_all_by_user(&self, user_id: &str) -> Result<Vec<ReviewRecord>> {
        let repo = ReviewRecordsRepository::new(&self.conn);
        Ok(repo.find_all_by_user(user_id)?)
    }

    fn find_due_for_user(&self, user_id: &str, at: DateTime<Utc>) -> Result<Vec<ReviewRecord>> {
        let repo = ReviewRecordsRepository::new(&self.conn);
        Ok(repo.find_due_for_user(user_id, at)?)
    }

    /// Runs `f` inside an IMMEDIATE transaction; rolled back if `f` fails
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }
}
