//! Human-readable numbers for CLI summaries and the server banner
use indicatif::{HumanBytes, HumanCount, HumanDuration};
use std::time::Duration;

/// Binary-prefixed size, e.g. `1.50 KiB`
pub fn format_bytes(bytes: u64) -> String {
    HumanBytes(bytes).to_string()
}

/// Count with thousands separators, e.g. `27,105`
pub fn format_number<T: TryInto<u64>>(value: T) -> String {
    HumanCount(value.try_into().unwrap_or(u64::MAX)).to_string()
}

/// Lookup timings keep sub-millisecond precision below 100ms
pub fn format_duration_ms(duration: Duration) -> String {
    let ms = duration.as_secs_f64() * 1000.0;
    if ms < 100.0 {
        format!("{:.3}ms", ms)
    } else {
        format!("{:.0}ms", ms)
    }
}

pub fn format_duration_auto(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 1.0 {
        format_duration_ms(duration)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        HumanDuration(duration).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KiB");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0u64), "0");
        assert_eq!(format_number(27_105usize), "27,105");
        assert_eq!(format_number(1_234_567u64), "1,234,567");
    }

    #[test]
    fn test_format_durations() {
        assert_eq!(format_duration_ms(Duration::from_micros(1_500)), "1.500ms");
        assert_eq!(format_duration_ms(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration_auto(Duration::from_millis(2_500)), "2.5s");
    }
}
