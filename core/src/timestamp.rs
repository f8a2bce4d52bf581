use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Tolker en ISO-8601-streng til UTC.
/// Godtar RFC 3339 (med `Z` eller offset), dato-tid uten sone (tolkes som UTC)
/// og ren dato (UTC midnatt).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Millisekunder siden epoch, eller None om strengen ikke kan tolkes.
pub fn timestamp_millis(s: &str) -> Option<i64> {
    parse_timestamp(s).map(|dt| dt.timestamp_millis())
}

/// Samme format som nettleserens `toISOString()`: `2024-05-01T10:15:30.123Z`.
pub fn format_iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_zulu_offset_and_naive() {
        let a = parse_timestamp("2024-05-01T10:00:00Z").unwrap();
        let b = parse_timestamp("2024-05-01T12:00:00+02:00").unwrap();
        let c = parse_timestamp("2024-05-01T10:00:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(parse_timestamp("i går").is_none());
    }

    #[test]
    fn iso_format_has_millis_and_z() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 10, 15, 30).unwrap();
        assert_eq!(format_iso(dt), "2024-05-01T10:15:30.000Z");
    }
}
