//! Timestamp parsing and formatting.
//!
//! The alignment service reports clip boundaries as `MM:SS` or
//! `HH:MM:SS[.fff]` strings relative to the analyzed window; everything
//! downstream works in absolute seconds. These are pure functions with
//! no I/O.

/// Parse a timestamp string into seconds.
///
/// Accepts `HH:MM:SS`, `MM:SS`, or a bare seconds value, with optional
/// fractional seconds on the last component. Returns `None` for empty
/// or unparseable input rather than guessing.
pub fn parse_timestamp(timestamp: &str) -> Option<f64> {
    let trimmed = timestamp.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parts: Vec<f64> = trimmed
        .split(':')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;

    let seconds = match parts.as_slice() {
        [h, m, s] => h * 3600.0 + m * 60.0 + s,
        [m, s] => m * 60.0 + s,
        [s] => *s,
        _ => return None,
    };

    if seconds.is_finite() && seconds >= 0.0 {
        Some(seconds)
    } else {
        None
    }
}

/// Format seconds as a zero-padded `HH:MM:SS.mmm` string.
///
/// Negative inputs clamp to zero.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0);
    let hours = (total / 3600.0) as u64;
    let minutes = ((total % 3600.0) / 60.0) as u64;
    let secs = total % 60.0;
    format!("{:02}:{:02}:{:06.3}", hours, minutes, secs)
}
