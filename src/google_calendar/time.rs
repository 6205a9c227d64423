use crate::error::{time_error, AppResult};
use chrono::{DateTime, LocalResult, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};
use tracing::debug;

/// Format of a `datetime-local` form value once seconds are present
pub const LOCAL_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Length of a `datetime-local` value without seconds (`YYYY-MM-DDTHH:MM`)
const MINUTE_PRECISION_LEN: usize = 16;

/// Append `:00` to a `datetime-local` value that has no seconds
pub fn normalize_local_input(input: &str) -> String {
    let input = input.trim();
    if input.len() == MINUTE_PRECISION_LEN {
        format!("{}:00", input)
    } else {
        input.to_string()
    }
}

/// Interpret a form date and time in `tz` and convert it to UTC
pub fn local_to_utc(input: &str, tz: Tz) -> AppResult<DateTime<Utc>> {
    let normalized = normalize_local_input(input);
    debug!("Received task due date: {}", normalized);

    let naive = NaiveDateTime::parse_from_str(&normalized, LOCAL_INPUT_FORMAT).map_err(|e| {
        time_error(&format!(
            "time data '{}' does not match format '{}': {}",
            normalized, LOCAL_INPUT_FORMAT, e
        ))
    })?;

    let utc = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        // Repeated wall-clock hour when DST ends: take the standard-time reading
        LocalResult::Ambiguous(_, standard) => standard.with_timezone(&Utc),
        // Hour skipped when DST starts: read it with the standard offset as well
        LocalResult::None => {
            let standard = tz.offset_from_utc_datetime(&naive).base_utc_offset();
            debug!("{} falls in a DST gap in {}, using the standard offset", normalized, tz);
            Utc.from_utc_datetime(&(naive - standard))
        }
    };

    debug!("Converted task due date to UTC: {}", to_google_datetime(&utc));
    Ok(utc)
}

/// RFC 3339 with whole seconds and an explicit `+00:00` offset
pub fn to_google_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{America, Asia, Europe};

    #[test]
    fn test_normalize_appends_seconds() {
        assert_eq!(normalize_local_input("2024-05-01T09:15"), "2024-05-01T09:15:00");
    }

    #[test]
    fn test_normalize_keeps_seconds() {
        assert_eq!(normalize_local_input("2024-05-01T09:15:42"), "2024-05-01T09:15:42");
    }

    #[test]
    fn test_kolkata_to_utc() {
        let utc = local_to_utc("2024-05-01T09:15", Asia::Kolkata).unwrap();
        assert_eq!(to_google_datetime(&utc), "2024-05-01T03:45:00+00:00");
    }

    #[test]
    fn test_standard_time_offset() {
        let utc = local_to_utc("2024-01-15T09:30", America::New_York).unwrap();
        assert_eq!(to_google_datetime(&utc), "2024-01-15T14:30:00+00:00");
    }

    #[test]
    fn test_daylight_time_offset() {
        let utc = local_to_utc("2024-07-15T09:30", America::New_York).unwrap();
        assert_eq!(to_google_datetime(&utc), "2024-07-15T13:30:00+00:00");

        let utc = local_to_utc("2024-07-15T09:30:00", Europe::Helsinki).unwrap();
        assert_eq!(to_google_datetime(&utc), "2024-07-15T06:30:00+00:00");
    }

    #[test]
    fn test_ambiguous_time_uses_standard_offset() {
        // 01:30 happens twice on 2024-11-03 in New York
        let utc = local_to_utc("2024-11-03T01:30", America::New_York).unwrap();
        assert_eq!(to_google_datetime(&utc), "2024-11-03T06:30:00+00:00");
    }

    #[test]
    fn test_skipped_time_uses_standard_offset() {
        // 02:30 never happens on 2024-03-10 in New York; EST puts it at 07:30Z
        let utc = local_to_utc("2024-03-10T02:30", America::New_York).unwrap();
        assert_eq!(to_google_datetime(&utc), "2024-03-10T07:30:00+00:00");

        // East of UTC the gap falls after the switch instant; still CET
        let utc = local_to_utc("2024-03-31T02:30", Europe::Berlin).unwrap();
        assert_eq!(to_google_datetime(&utc), "2024-03-31T01:30:00+00:00");
    }

    #[test]
    fn test_garbage_input_is_rejected() {
        let err = local_to_utc("tomorrow-ish", Asia::Kolkata).unwrap_err();
        assert!(err.to_string().contains("does not match format"));
    }
}
