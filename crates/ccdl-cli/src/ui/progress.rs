//! Transfer progress formatting.

use std::time::{Duration, Instant};

use super::theme::format_size;

/// Minimum time between two redraws of the same transfer line.
pub const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

/// Truncate or pad `name` to exactly `width` characters.
pub fn fit(name: &str, width: usize) -> String {
    let count = name.chars().count();
    if count <= width {
        format!("{name:<width$}")
    } else {
        let keep: String = name.chars().take(width.saturating_sub(1)).collect();
        format!("{keep}…")
    }
}

/// `12.0 MB / 48.0 MB  25%`, or just the transferred size when the total
/// is unknown.
pub fn format_transfer(current: u64, total: Option<u64>) -> String {
    match total.filter(|t| *t > 0) {
        Some(total) => {
            let percent = (current.min(total) * 100) / total;
            format!("{} / {}  {percent:>3}%", format_size(current), format_size(total))
        }
        None => format_size(current),
    }
}

/// Rate limiter for redraws of the active transfer line.
#[derive(Debug, Clone)]
pub struct Throttle {
    last: Option<Instant>,
    interval: Duration,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            last: None,
            interval,
        }
    }

    /// Whether enough time has passed to draw again. Completion is always
    /// drawn.
    pub fn ready(&mut self, finished: bool) -> bool {
        let now = Instant::now();
        let due = finished || self.last.is_none_or(|last| now.duration_since(last) >= self.interval);
        if due {
            self.last = Some(now);
        }
        due
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(REDRAW_INTERVAL)
    }
}
