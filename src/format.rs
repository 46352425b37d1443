//! Display helpers shared by every view of run data

/// Placeholder shown where a metric has no value
pub const NO_VALUE: &str = "—";

/// Format minutes-per-mile as `M:SS`.
///
/// Seconds are the rounded fractional minute; a rounding result of 60
/// carries into the minutes so values just under a whole minute never
/// render as `6:60`.
pub fn format_pace(min_per_mile: f64) -> String {
    if !min_per_mile.is_finite() || min_per_mile < 0.0 {
        return NO_VALUE.to_string();
    }

    let mut minutes = min_per_mile.trunc() as u64;
    let mut seconds = ((min_per_mile - min_per_mile.trunc()) * 60.0).round() as u64;
    if seconds >= 60 {
        minutes += 1;
        seconds -= 60;
    }
    format!("{}:{:02}", minutes, seconds)
}

/// Format an optional pace, using the placeholder when there is none
pub fn format_optional_pace(min_per_mile: Option<f64>) -> String {
    min_per_mile.map_or_else(|| NO_VALUE.to_string(), format_pace)
}

/// Format a minute count as `Xh Ym`, or `Ym` under an hour
pub fn format_duration(minutes: u64) -> String {
    let hours = minutes / 60;
    let remaining = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, remaining)
    } else {
        format!("{}m", remaining)
    }
}

/// Format a growth percentage as `+N%`; no growth renders as the placeholder
pub fn format_growth(percent: f64) -> String {
    if percent > 0.0 {
        format!("+{}%", percent.trunc() as i64)
    } else {
        NO_VALUE.to_string()
    }
}
