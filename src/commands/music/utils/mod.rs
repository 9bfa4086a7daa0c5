use std::time::Duration;

// Export music utilities
pub mod embedded_messages;
pub mod event_handlers;
pub mod music_manager;
pub mod queue_manager;
pub mod session;
pub mod track_cache;
pub mod voice;

/// Format a duration into a human-readable string (e.g., "3:45" or "1:23:45")
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, "0:00")]
    #[test_case(59, "0:59")]
    #[test_case(225, "3:45")]
    #[test_case(5025, "1:23:45")]
    fn test_format_duration(secs: u64, expected: &str) {
        assert_eq!(format_duration(Duration::from_secs(secs)), expected);
    }
}
