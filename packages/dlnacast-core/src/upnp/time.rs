//! UPnP duration strings (`H+:MM:SS[.F+]`).

use std::time::Duration;

/// Parses a UPnP duration such as `0:03:25` or `1:02:03.500`.
///
/// Returns `None` for `NOT_IMPLEMENTED`, empty strings and anything else that
/// is not a duration.
pub fn parse_upnp_time(s: &str) -> Option<Duration> {
    let s = s.trim();
    let mut parts = s.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds = parts.next()?;
    if parts.next().is_some() || minutes >= 60 {
        return None;
    }

    let (whole, fraction) = match seconds.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (seconds, None),
    };
    let whole: u64 = whole.parse().ok()?;
    if whole >= 60 {
        return None;
    }
    let millis = match fraction {
        Some(f) if !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()) => {
            // Keep millisecond precision
            let padded = format!("{:0<3}", &f[..f.len().min(3)]);
            padded.parse::<u64>().ok()?
        }
        Some(_) => return None,
        None => 0,
    };

    Some(Duration::from_millis(
        ((hours * 60 + minutes) * 60 + whole) * 1000 + millis,
    ))
}

/// Formats a duration as `H:MM:SS`, truncating sub-second precision.
pub fn format_upnp_time(d: Duration) -> String {
    let total = d.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_forms() {
        assert_eq!(parse_upnp_time("0:03:25"), Some(Duration::from_secs(205)));
        assert_eq!(parse_upnp_time("01:00:00"), Some(Duration::from_secs(3600)));
        assert_eq!(
            parse_upnp_time("0:00:01.5"),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(
            parse_upnp_time("0:00:01.250000"),
            Some(Duration::from_millis(1250))
        );
    }

    #[test]
    fn rejects_non_durations() {
        for raw in ["", "NOT_IMPLEMENTED", "1:2", "0:61:00", "0:00:75", "a:b:c", "0:00:01."] {
            assert_eq!(parse_upnp_time(raw), None, "{raw}");
        }
    }

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_upnp_time(Duration::from_secs(0)), "0:00:00");
        assert_eq!(format_upnp_time(Duration::from_millis(90_900)), "0:01:30");
        assert_eq!(format_upnp_time(Duration::from_secs(3 * 3600 + 5)), "3:00:05");
    }
}
