//! Relative time labels ("3 minutes ago")

const MS_PER_SECOND: i64 = 1000;

/// Format `timestamp` relative to `now` (both epoch milliseconds).
///
/// Each unit is the floor of the previous one, and the largest non-zero unit
/// wins. Timestamps in the future read "Just now". Out-of-range stored
/// timestamps saturate instead of overflowing.
pub fn format_relative_time(timestamp: i64, now: i64) -> String {
    let diff = now.saturating_sub(timestamp);
    let seconds = diff.div_euclid(MS_PER_SECOND);
    let minutes = seconds.div_euclid(60);
    let hours = minutes.div_euclid(60);
    let days = hours.div_euclid(24);
    let weeks = days.div_euclid(7);

    if weeks > 0 {
        plural(weeks, "week")
    } else if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        "Just now".to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count > 1 {
        format!("{} {}s ago", count, unit)
    } else {
        format!("{} {} ago", count, unit)
    }
}
