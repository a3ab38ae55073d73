//! Clip boundary parsing.

use crate::error::{WorkerError, WorkerResult};

/// Parse `SS`, `MM:SS` or `HH:MM:SS`, each with optional fractional seconds.
pub fn parse_timecode(input: &str) -> WorkerResult<f64> {
    let invalid = || WorkerError::invalid_request(format!("invalid timecode '{}'", input));

    let parts: Vec<&str> = input.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(invalid());
    }

    let (seconds, units) = parts.split_last().ok_or_else(invalid)?;
    let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
    if !seconds.is_finite() || seconds < 0.0 || (!units.is_empty() && seconds >= 60.0) {
        return Err(invalid());
    }

    let mut total = 0.0;
    for (i, unit) in units.iter().enumerate() {
        let value: u32 = unit.parse().map_err(|_| invalid())?;
        // minutes are bounded when hours are present
        if i == 1 && value >= 60 {
            return Err(invalid());
        }
        total = total * 60.0 + value as f64;
    }

    Ok(total * 60.0 + seconds)
}
