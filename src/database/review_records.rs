use crate::row_factories::{REVIEW_RECORD_COLUMNS, ReviewRecordRowFactory, format_timestamp};
use crate::spaced_repetition::{ReviewKey, ReviewRecord};
use crate::time_format::format_time_difference;
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{Connection, Result, params};

pub struct ReviewRecordsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> ReviewRecordsRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        ReviewRecordsRepository { conn }
    }

    pub fn upsert(&self, record: &ReviewRecord) -> Result<()> {
        debug!(
            "Upserting review record {}: reps={}, interval={} days, ease={:.2}, lapses={}, next review: {}",
            record.key,
            record.repetitions,
            record.interval_days,
            record.ease_factor,
            record.lapse_count,
            format_time_difference(record.last_reviewed_at, record.next_review_date)
        );

        self.conn.execute(
            "INSERT INTO review_records
                (user_id, quiz_id, question_id, repetitions, ease_factor,
                 interval_days, next_review_date, last_reviewed_at, lapse_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (user_id, quiz_id, question_id) DO UPDATE SET
                repetitions = excluded.repetitions,
                ease_factor = excluded.ease_factor,
                interval_days = excluded.interval_days,
                next_review_date = excluded.next_review_date,
                last_reviewed_at = excluded.last_reviewed_at,
                lapse_count = excluded.lapse_count",
            params![
                record.key.user_id,
                record.key.quiz_id,
                record.key.question_id,
                record.repetitions,
                record.ease_factor,
                record.interval_days,
                format_timestamp(record.next_review_date),
                format_timestamp(record.last_reviewed_at),
                record.lapse_count
            ],
        )?;
        Ok(())
    }

    pub fn find(&self, key: &ReviewKey) -> Result<Option<ReviewRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM review_records
             WHERE user_id = ?1 AND quiz_id = ?2 AND question_id = ?3",
            REVIEW_RECORD_COLUMNS
        ))?;

        let mut rows = stmt.query(params![key.user_id, key.quiz_id, key.question_id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(ReviewRecordRowFactory::from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// All records of a user, soonest due first
    pub fn find_all_by_user(&self, user_id: &str) -> Result<Vec<ReviewRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM review_records
             WHERE user_id = ?1
             ORDER BY next_review_date ASC, quiz_id ASC, question_id ASC",
            REVIEW_RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map([user_id], ReviewRecordRowFactory::from_row)?
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Retrieved {} review records for user {}",
            records.len(),
            user_id
        );
        Ok(records)
    }

    pub fn find_due_for_user(
        &self,
        user_id: &str,
        before_date: DateTime<Utc>,
    ) -> Result<Vec<ReviewRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM review_records
             WHERE user_id = ?1 AND next_review_date <= ?2
             ORDER BY next_review_date ASC, quiz_id ASC, question_id ASC",
            REVIEW_RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map(
                params![user_id, format_timestamp(before_date)],
                ReviewRecordRowFactory::from_row,
            )?
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Retrieved {} due review records for user {}",
            records.len(),
            user_id
        );
        Ok(records)
    }

    pub fn count_due_for_user(&self, user_id: &str, before_date: DateTime<Utc>) -> Result<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM review_records WHERE user_id = ?1 AND next_review_date <= ?2",
            params![user_id, format_timestamp(before_date)],
            |row| row.get(0),
        )
    }

    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM review_records", [], |row| row.get(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::init_connection;
    use chrono::{Duration, NaiveDate};

    fn create_test_db() -> Connection {
        init_connection(":memory:").expect("Failed to create test database")
    }

    fn fixed_date() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn record(user: &str, quiz: &str, question: &str, due: DateTime<Utc>) -> ReviewRecord {
        ReviewRecord {
            next_review_date: due,
            ..ReviewRecord::initial(ReviewKey::new(user, quiz, question).unwrap(), fixed_date())
        }
    }

    #[test]
    fn test_upsert_inserts_new_record() {
        let conn = create_test_db();
        let repo = ReviewRecordsRepository::new(&conn);

        let item = record("alice", "quiz-1", "q1", fixed_date());
        repo.upsert(&item).unwrap();

        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.find(&item.key).unwrap(), Some(item));
    }

    #[test]
    fn test_upsert_updates_existing_record() {
        let conn = create_test_db();
        let repo = ReviewRecordsRepository::new(&conn);

        let mut item = record("alice", "quiz-1", "q1", fixed_date());
        repo.upsert(&item).unwrap();

        item.repetitions = 3;
        item.interval_days = 15;
        item.ease_factor = 2.7;
        item.lapse_count = 1;
        item.next_review_date = fixed_date() + Duration::days(15);
        repo.upsert(&item).unwrap();

        assert_eq!(repo.count().unwrap(), 1);
        let updated = repo.find(&item.key).unwrap().unwrap();
        assert_eq!(updated.repetitions, 3);
        assert_eq!(updated.interval_days, 15);
        assert_eq!(updated.ease_factor, 2.7);
        assert_eq!(updated.lapse_count, 1);
        assert_eq!(updated.next_review_date, fixed_date() + Duration::days(15));
    }

    #[test]
    fn test_get_nonexistent_review_record() {
        let conn = create_test_db();
        let repo = ReviewRecordsRepository::new(&conn);
        let key = ReviewKey::new("nobody", "quiz", "question").unwrap();
        assert!(repo.find(&key).unwrap().is_none());
    }

    #[test]
    fn test_find_all_by_user_orders_by_due_date() {
        let conn = create_test_db();
        let repo = ReviewRecordsRepository::new(&conn);

        repo.upsert(&record("alice", "quiz-1", "late", fixed_date() + Duration::days(6)))
            .unwrap();
        repo.upsert(&record("alice", "quiz-2", "soon", fixed_date() + Duration::days(1)))
            .unwrap();
        repo.upsert(&record("alice", "quiz-1", "now", fixed_date()))
            .unwrap();
        repo.upsert(&record("bob", "quiz-1", "other", fixed_date()))
            .unwrap();

        let questions: Vec<String> = repo
            .find_all_by_user("alice")
            .unwrap()
            .into_iter()
            .map(|item| item.key.question_id)
            .collect();
        assert_eq!(questions, vec!["now", "soon", "late"]);
    }

    #[test]
    fn test_find_all_by_user_without_records() {
        let conn = create_test_db();
        let repo = ReviewRecordsRepository::new(&conn);
        assert!(repo.find_all_by_user("alice").unwrap().is_empty());
    }

    #[test]
    fn test_find_due_for_user() {
        let conn = create_test_db();
        let repo = ReviewRecordsRepository::new(&conn);

        let past = fixed_date() - Duration::days(1);
        let future = fixed_date() + Duration::days(1);

        repo.upsert(&record("alice", "quiz-1", "past", past)).unwrap();
        repo.upsert(&record("alice", "quiz-1", "exact", fixed_date()))
            .unwrap();
        repo.upsert(&record("alice", "quiz-1", "future", future))
            .unwrap();
        repo.upsert(&record("bob", "quiz-1", "past", past)).unwrap();

        let due: Vec<String> = repo
            .find_due_for_user("alice", fixed_date())
            .unwrap()
            .into_iter()
            .map(|item| item.key.question_id)
            .collect();
        assert_eq!(due, vec!["past", "exact"]);
        assert_eq!(repo.count_due_for_user("alice", fixed_date()).unwrap(), 2);
        assert_eq!(repo.count_due_for_user("bob", fixed_date()).unwrap(), 1);
    }

    #[test]
    fn test_same_question_in_different_quizzes_is_tracked_separately() {
        let conn = create_test_db();
        let repo = ReviewRecordsRepository::new(&conn);

        let first = record("alice", "quiz-1", "q1", fixed_date());
        let second = record("alice", "quiz-2", "q1", fixed_date());
        repo.upsert(&first).unwrap();
        repo.upsert(&second).unwrap();

        assert_eq!(repo.count().unwrap(), 2);
        assert_ne!(
            repo.find(&first.key).unwrap().unwrap().key,
            repo.find(&second.key).unwrap().unwrap().key
        );
    }

    #[test]
    fn test_record_at_interval_cap_reads_back() {
        use crate::spaced_repetition::MAX_INTERVAL_DAYS;

        let conn = create_test_db();
        let repo = ReviewRecordsRepository::new(&conn);

        let mut item = record("alice", "quiz-1", "q1", fixed_date());
        item.repetitions = 20;
        item.ease_factor = 4.5;
        item.interval_days = MAX_INTERVAL_DAYS;
        item.next_review_date = fixed_date() + Duration::days(MAX_INTERVAL_DAYS as i64);
        repo.upsert(&item).unwrap();

        assert_eq!(repo.find(&item.key).unwrap(), Some(item.clone()));
        assert_eq!(repo.find_all_by_user("alice").unwrap(), vec![item]);
    }
}
