use crate::spaced_repetition::{Quality, ReviewRecord};
use crate::time_format::format_time_difference;
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

fn styled(text: &str, color: bool, style: fn(&str) -> ColoredString) -> String {
    if color {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

/// One line describing a record and when it is next due
pub fn render_record(record: &ReviewRecord, now: DateTime<Utc>, color: bool) -> String {
    let due = if record.is_due(now) {
        styled("due now", color, |s| s.red().bold())
    } else {
        styled(
            &format_time_difference(now, record.next_review_date),
            color,
            |s| s.green(),
        )
    };

    format!(
        "{}/{} | Reps: {} | Interval: {} | Ease: {:.2} | Lapses: {} | Next: {} ({})",
        record.key.quiz_id,
        record.key.question_id,
        record.repetitions,
        record.interval_days,
        record.ease_factor,
        record.lapse_count,
        record.next_review_date.format("%Y-%m-%d %H:%M UTC"),
        due
    )
}

pub fn render_schedule(
    user_id: &str,
    records: &[ReviewRecord],
    now: DateTime<Utc>,
    color: bool,
) -> String {
    if records.is_empty() {
        return format!("No reviews scheduled for {}.", user_id);
    }

    let mut lines = vec![styled(
        &format!("Review schedule for {} ({} items)", user_id, records.len()),
        color,
        |s| s.bold(),
    )];
    lines.extend(records.iter().map(|record| render_record(record, now, color)));
    lines.join("\n")
}

/// Table of outcomes, one line per rating
pub fn render_preview(preview: &[(Quality, ReviewRecord)], now: DateTime<Utc>, color: bool) -> String {
    preview
        .iter()
        .map(|(quality, record)| {
            let grade = format!("{:<32}", quality.to_string());
            let grade = if quality.is_pass() {
                styled(&grade, color, |s| s.green())
            } else {
                styled(&grade, color, |s| s.red())
            };
            format!(
                "{}| Next review: {} | Reps: {} | Interval: {} | Ease: {:.2}",
                grade,
                format_time_difference(now, record.next_review_date),
                record.repetitions,
                record.interval_days,
                record.ease_factor
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
