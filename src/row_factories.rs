use crate::spaced_repetition::{ReviewKey, ReviewRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

/// Columns selected for every review record query, in the order
/// `ReviewRecordRowFactory::from_row` expects them
pub const REVIEW_RECORD_COLUMNS: &str = "user_id, quiz_id, question_id, repetitions, ease_factor,
     interval_days, next_review_date, last_reviewed_at, lapse_count";

/// Factory for creating ReviewRecord objects from database rows
pub struct ReviewRecordRowFactory;

impl ReviewRecordRowFactory {
    pub fn from_row(row: &Row) -> rusqlite::Result<ReviewRecord> {
        Ok(ReviewRecord {
            key: ReviewKey {
                user_id: row.get(0)?,
                quiz_id: row.get(1)?,
                question_id: row.get(2)?,
            },
            repetitions: row.get(3)?,
            ease_factor: row.get(4)?,
            interval_days: row.get(5)?,
            next_review_date: timestamp_column(row, 6)?,
            last_reviewed_at: timestamp_column(row, 7)?,
            lapse_count: row.get(8)?,
        })
    }
}

/// Fixed-width RFC 3339 so stored instants sort lexically
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
