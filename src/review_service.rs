use crate::date_provider::DateProvider;
use crate::error::Result;
use crate::spaced_repetition::{Quality, ReviewKey, ReviewRecord, ReviewScheduler, require_id};
use crate::store::ScheduleStore;
use crate::time_format::format_time_difference;
use log::{info, warn};
use std::sync::Arc;

/// Entry point for request handlers: review submission and schedule queries
pub struct ReviewService<S: ScheduleStore> {
    store: S,
    scheduler: ReviewScheduler,
    date_provider: Arc<dyn DateProvider>,
}

impl<S: ScheduleStore> ReviewService<S> {
    pub fn new(store: S, date_provider: Arc<dyn DateProvider>) -> Self {
        Self {
            store,
            scheduler: ReviewScheduler::new(),
            date_provider,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All of the user's records, soonest due first
    pub fn get_review_schedule_for_user(&self, user_id: &str) -> Result<Vec<ReviewRecord>> {
        let user_id = require_id("userId", user_id)?;
        let mut records = self.store.find_all_by_user(&user_id)?;
        sort_by_due_date(&mut records);
        Ok(records)
    }

    /// Records a review and returns the rescheduled record
    ///
    /// Input is validated before the store is touched; an invalid rating
    /// leaves storage untouched.
    pub fn update_review_schedule(
        &self,
        user_id: &str,
        quiz_id: &str,
        question_id: &str,
        quality: i64,
    ) -> Result<ReviewRecord> {
        let (key, quality) = match validate_submission(user_id, quiz_id, question_id, quality) {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Rejected review submission: {}", e);
                return Err(e);
            }
        };

        let now = self.date_provider.get_current_time();
        let next = self.store.atomically(|store| {
            let previous = store.find(&key)?;
            let next = self
                .scheduler
                .compute_next_review(&key, previous.as_ref(), quality, now);
            store.upsert(&next)?;
            Ok(next)
        })?;

        info!(
            "Review: {} | Quality: {} | Next review: {} | Reps: {}, Interval: {} days, Ease: {:.2}, Lapses: {}",
            key,
            quality,
            format_time_difference(now, next.next_review_date),
            next.repetitions,
            next.interval_days,
            next.ease_factor,
            next.lapse_count
        );

        Ok(next)
    }

    /// Records due now, soonest first
    pub fn get_due_reviews(&self, user_id: &str) -> Result<Vec<ReviewRecord>> {
        let user_id = require_id("userId", user_id)?;
        let now = self.date_provider.get_current_time();
        let mut records = self.store.find_due_for_user(&user_id, now)?;
        sort_by_due_date(&mut records);
        info!("Found {} review(s) due for user {}", records.len(), user_id);
        Ok(records)
    }

    pub fn count_due_reviews(&self, user_id: &str) -> Result<usize> {
        Ok(self.get_due_reviews(user_id)?.len())
    }

    /// What each rating would do to the record, without saving anything
    pub fn preview_review(
        &self,
        user_id: &str,
        quiz_id: &str,
        question_id: &str,
    ) -> Result<Vec<(Quality, ReviewRecord)>> {
        let key = ReviewKey::new(user_id, quiz_id, question_id)?;
        let previous = self.store.find(&key)?;
        let now = self.date_provider.get_current_time();
        Ok(self.scheduler.preview(&key, previous.as_ref(), now))
    }
}

fn validate_submission(
    user_id: &str,
    quiz_id: &str,
    question_id: &str,
    quality: i64,
) -> Result<(ReviewKey, Quality)> {
    let key = ReviewKey::new(user_id, quiz_id, question_id)?;
    let quality = Quality::new(quality)?;
    Ok((key, quality))
}

// Ties are broken by key so repeated reads come back in the same order.
fn sort_by_due_date(records: &mut [ReviewRecord]) {
    records.sort_by(|a, b| {
        a.next_review_date
            .cmp(&b.next_review_date)
            .then_with(|| a.key.cmp(&b.key))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_provider::FixedDateProvider;
    use crate::store::InMemoryScheduleStore;
    use chrono::{DateTime, Duration, NaiveDate, Utc};

    fn fixed_now() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn service_at(now: DateTime<Utc>) -> ReviewService<InMemoryScheduleStore> {
        ReviewService::new(
            InMemoryScheduleStore::new(),
            Arc::new(FixedDateProvider::new(now)),
        )
    }

    #[test]
    fn test_first_review_creates_record() {
        let service = service_at(fixed_now());
        let record = service
            .update_review_schedule("alice", "quiz-1", "q1", 4)
            .unwrap();

        assert_eq!(record.repetitions, 1);
        assert_eq!(record.interval_days, 1);
        assert_eq!(record.last_reviewed_at, fixed_now());
        assert_eq!(service.store().find(&record.key).unwrap(), Some(record));
    }

    #[test]
    fn test_subsequent_review_builds_on_stored_record() {
        let service = service_at(fixed_now());
        service
            .update_review_schedule("alice", "quiz-1", "q1", 5)
            .unwrap();
        let second = service
            .update_review_schedule("alice", "quiz-1", "q1", 5)
            .unwrap();

        assert_eq!(second.repetitions, 2);
        assert_eq!(second.interval_days, 6);
        assert_eq!(second.ease_factor, 2.7);
        assert_eq!(service.store().len(), 1);
    }

    #[test]
    fn test_invalid_quality_is_rejected_without_storing() {
        let service = service_at(fixed_now());
        for quality in [-1, 6] {
            let err = service
                .update_review_schedule("alice", "quiz-1", "q1", quality)
                .unwrap_err();
            assert!(err.is_validation());
        }
        assert!(service.store().is_empty());
    }

    #[test]
    fn test_missing_identifier_is_rejected() {
        let service = service_at(fixed_now());
        let err = service
            .update_review_schedule("alice", "", "q1", 3)
            .unwrap_err();
        assert!(err.is_validation());
        assert!(service.get_review_schedule_for_user(" ").unwrap_err().is_validation());
    }

    #[test]
    fn test_schedule_sorted_soonest_first() {
        let service = service_at(fixed_now());
        let store = service.store();
        for (question, days) in [("c", 6), ("a", 1), ("b", 3)] {
            let key = ReviewKey::new("alice", "quiz-1", question).unwrap();
            store
                .upsert(&ReviewRecord {
                    next_review_date: fixed_now() + Duration::days(days),
                    ..ReviewRecord::initial(key, fixed_now())
                })
                .unwrap();
        }

        let order: Vec<String> = service
            .get_review_schedule_for_user("alice")
            .unwrap()
            .into_iter()
            .map(|record| record.key.question_id)
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_schedule_for_unknown_user_is_empty() {
        let service = service_at(fixed_now());
        assert!(service.get_review_schedule_for_user("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_due_reviews_respect_clock() {
        let service = service_at(fixed_now());
        service
            .update_review_schedule("alice", "quiz-1", "q1", 5)
            .unwrap();
        assert_eq!(service.count_due_reviews("alice").unwrap(), 0);

        let later = ReviewService::new(
            InMemoryScheduleStore::new(),
            Arc::new(FixedDateProvider::new(fixed_now() + Duration::days(1))),
        );
        let record = service.store().find_all_by_user("alice").unwrap().remove(0);
        later.store().upsert(&record).unwrap();
        assert_eq!(later.get_due_reviews("alice").unwrap(), vec![record]);
    }

    #[test]
    fn test_preview_does_not_persist() {
        let service = service_at(fixed_now());
        let preview = service.preview_review("alice", "quiz-1", "q1").unwrap();

        assert_eq!(preview.len(), 6);
        assert!(service.store().is_empty());
    }
}
