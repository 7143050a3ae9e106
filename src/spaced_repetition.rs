use crate::error::{ReviewError, Result};
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Ease factor given to an item that has never been reviewed
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Lower bound for the ease factor
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Upper bound for the review interval (about a century)
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Ease penalty applied on a lapse
const LAPSE_EASE_PENALTY: f64 = 0.2;

/// Lowest quality that still counts as a successful recall
const PASSING_QUALITY: u8 = 3;

/// Self-assessed recall quality for a single review
///
/// Quality scale:
/// - 0: Complete blackout
/// - 1: Incorrect, but the answer was recognized
/// - 2: Incorrect, but the answer seemed easy once shown
/// - 3: Correct with serious difficulty
/// - 4: Correct after hesitation
/// - 5: Perfect recall
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    /// Validates a caller-supplied rating
    pub fn new(value: i64) -> Result<Self> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(ReviewError::Validation(format!(
                "quality must be between 0 and {}, got {}",
                Self::MAX,
                value
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_pass(self) -> bool {
        self.0 >= PASSING_QUALITY
    }

    /// All ratings from 0 to 5
    pub fn all() -> impl Iterator<Item = Quality> {
        (0..=Self::MAX).map(Quality)
    }

    pub fn description(self) -> &'static str {
        match self.0 {
            0 => "Blackout",
            1 => "Incorrect",
            2 => "Incorrect (easy recall)",
            3 => "Serious difficulty",
            4 => "After hesitation",
            _ => "Perfect",
        }
    }
}

impl TryFrom<i64> for Quality {
    type Error = ReviewError;

    fn try_from(value: i64) -> Result<Self> {
        Quality::new(value)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grade{} ({})", self.0, self.description())
    }
}

/// Identifies the review record of one question for one user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReviewKey {
    pub user_id: String,
    pub quiz_id: String,
    pub question_id: String,
}

impl ReviewKey {
    /// Builds a key, rejecting blank identifiers
    pub fn new(user_id: &str, quiz_id: &str, question_id: &str) -> Result<Self> {
        Ok(ReviewKey {
            user_id: require_id("userId", user_id)?,
            quiz_id: require_id("quizId", quiz_id)?,
            question_id: require_id("questionId", question_id)?,
        })
    }
}

impl fmt::Display for ReviewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.user_id, self.quiz_id, self.question_id)
    }
}

/// Trims an identifier and fails if nothing is left
pub fn require_id(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ReviewError::Validation(format!("{} is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Scheduling state of one (user, quiz, question) triple
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub key: ReviewKey,
    /// Consecutive successful reviews
    pub repetitions: u32,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub next_review_date: DateTime<Utc>,
    pub last_reviewed_at: DateTime<Utc>,
    pub lapse_count: u32,
}

impl ReviewRecord {
    /// State assumed for a question that has never been reviewed
    pub fn initial(key: ReviewKey, now: DateTime<Utc>) -> Self {
        ReviewRecord {
            key,
            repetitions: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 0,
            next_review_date: now,
            last_reviewed_at: now,
            lapse_count: 0,
        }
    }

    pub fn is_due(&self, at: DateTime<Utc>) -> bool {
        self.next_review_date <= at
    }
}

/// SM-2 review scheduler
///
/// Stateless: every call derives the successor purely from its arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewScheduler;

impl ReviewScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Computes the record that follows `previous` after a review rated `quality`
    ///
    /// A missing `previous` is treated as a fresh item. The returned record is
    /// reviewed at `now` and due `interval_days` days later.
    pub fn compute_next_review(
        &self,
        key: &ReviewKey,
        previous: Option<&ReviewRecord>,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> ReviewRecord {
        let start = previous
            .cloned()
            .unwrap_or_else(|| ReviewRecord::initial(key.clone(), now));

        let (repetitions, ease_factor, interval_days, lapse_count) = if quality.is_pass() {
            let repetitions = start.repetitions.saturating_add(1);
            let ease_factor = next_ease_factor(start.ease_factor, quality);
            let interval_days = match repetitions {
                1 => 1,
                2 => 6,
                _ => ((start.interval_days as f64 * ease_factor).round() as u32)
                    .clamp(1, MAX_INTERVAL_DAYS),
            };
            (repetitions, ease_factor, interval_days, start.lapse_count)
        } else {
            let ease_factor =
                round_ease((start.ease_factor - LAPSE_EASE_PENALTY).max(MIN_EASE_FACTOR));
            (0, ease_factor, 1, start.lapse_count.saturating_add(1))
        };
        let (interval_days, next_review_date) = due_after(now, interval_days);

        ReviewRecord {
            key: key.clone(),
            repetitions,
            ease_factor,
            interval_days,
            next_review_date,
            last_reviewed_at: now,
            lapse_count,
        }
    }

    /// Outcome of every possible rating, without persisting anything
    pub fn preview(
        &self,
        key: &ReviewKey,
        previous: Option<&ReviewRecord>,
        now: DateTime<Utc>,
    ) -> Vec<(Quality, ReviewRecord)> {
        Quality::all()
            .map(|quality| {
                (
                    quality,
                    self.compute_next_review(key, previous, quality, now),
                )
            })
            .collect()
    }
}

/// Due date `interval_days` after `now`, shortened if it would pass the
/// latest instant chrono can represent
fn due_after(now: DateTime<Utc>, interval_days: u32) -> (u32, DateTime<Utc>) {
    let headroom = (DateTime::<Utc>::MAX_UTC - now).num_days().max(0);
    let days = (interval_days as i64).min(headroom);
    match now.checked_add_signed(Duration::days(days)) {
        Some(next) => (days as u32, next),
        None => (0, now),
    }
}

/// EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)), floored at 1.3
fn next_ease_factor(ease_factor: f64, quality: Quality) -> f64 {
    let distance = (Quality::MAX - quality.value()) as f64;
    let updated = ease_factor + (0.1 - distance * (0.08 + distance * 0.02));
    round_ease(updated.max(MIN_EASE_FACTOR))
}

// Two decimals keep stored values free of accumulated float noise.
fn round_ease(ease_factor: f64) -> f64 {
    (ease_factor * 100.0).round() / 100.0
}
