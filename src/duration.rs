// ABOUTME: Human-readable rendering of the idle-eviction timeout.
// ABOUTME: Produces strings like "1 hour 2 minutes 3 seconds" for warnings.

/// Render a number of seconds as hours, minutes and seconds.
///
/// Zero components are omitted and a unit is pluralized only when its value
/// is greater than one. Zero seconds renders as an empty string.
pub fn format_idle_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    [(hours, "hour"), (minutes, "minute"), (seconds, "second")]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| {
            let suffix = if value > 1 { "s" } else { "" };
            format!("{} {}{}", value, unit, suffix)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_components() {
        assert_eq!(format_idle_duration(3723), "1 hour 2 minutes 3 seconds");
    }

    #[test]
    fn test_minutes_and_seconds() {
        assert_eq!(format_idle_duration(90), "1 minute 30 seconds");
    }

    #[test]
    fn test_seconds_only() {
        assert_eq!(format_idle_duration(30), "30 seconds");
    }

    #[test]
    fn test_singular_units() {
        assert_eq!(format_idle_duration(3661), "1 hour 1 minute 1 second");
    }

    #[test]
    fn test_zero_components_omitted() {
        assert_eq!(format_idle_duration(7200), "2 hours");
        assert_eq!(format_idle_duration(3605), "1 hour 5 seconds");
        assert_eq!(format_idle_duration(120), "2 minutes");
    }

    #[test]
    fn test_zero_is_empty() {
        assert_eq!(format_idle_duration(0), "");
    }
}
