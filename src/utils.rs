use chrono::{Timelike, Utc};
use std::time::Duration;
use tokio::sync::Notify;

/// Waits for either shutdown signal or delay. Returns true if shutdown was triggered.
pub async fn check_shutdown_or_delay(shutdown: &Notify, duration: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = shutdown.notified() => true,
    }
}

/// Whether the current UTC hour falls inside [start, end], inclusive on
/// both ends.
pub fn within_utc_hours(start: u32, end: u32) -> bool {
    hour_in_window(Utc::now().hour(), start, end)
}

pub fn hour_in_window(hour: u32, start: u32, end: u32) -> bool {
    hour >= start && hour <= end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_window_is_inclusive() {
        assert!(hour_in_window(9, 9, 17));
        assert!(hour_in_window(17, 9, 17));
        assert!(!hour_in_window(8, 9, 17));
        assert!(!hour_in_window(18, 9, 17));
    }

    #[test]
    fn full_day_window_accepts_everything() {
        for hour in 0..24 {
            assert!(hour_in_window(hour, 0, 23));
        }
    }
}
