use chrono::{DateTime, Utc};

/// Formats how far `to` lies after `from`, for log lines and CLI output
///
/// Examples:
/// - Same instant or earlier: "now"
/// - 30 seconds later: "in 30 seconds"
/// - 1 minute later: "in 1 minute"
/// - 2 hours later: "in 2 hours"
/// - 1 day later: "tomorrow"
/// - 6 days later: "in 6 days"
/// - 30 days or more: "on 2025-02-14"
pub fn format_time_difference(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    let duration = to.signed_duration_since(from);

    if duration.num_seconds() <= 0 {
        "now".to_string()
    } else if duration.num_seconds() < 60 {
        plural("second", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        plural("minute", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        plural("hour", duration.num_hours())
    } else if duration.num_days() == 1 {
        "tomorrow".to_string()
    } else if duration.num_days() < 30 {
        plural("day", duration.num_days())
    } else {
        format!("on {}", to.format("%Y-%m-%d"))
    }
}

fn plural(unit: &str, count: i64) -> String {
    format!("in {} {}{}", count, unit, if count == 1 { "" } else { "s" })
}
