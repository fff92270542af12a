use chrono::{DateTime, Utc};

/// RFC 822 layout used by RSS `lastBuildDate` and the health endpoint.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

/// Formats a timestamp as an RFC 822 date in UTC.
///
/// `None` formats the current time.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use rssify::util::http_date;
///
/// let ts = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
/// assert_eq!(http_date(Some(ts)), "Tue, 05 Mar 2024 07:08:09 +0000");
/// ```
pub fn http_date(ts: Option<DateTime<Utc>>) -> String {
    ts.unwrap_or_else(Utc::now)
        .format(HTTP_DATE_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_timestamp() {
        let ts = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(http_date(Some(ts)), "Sun, 31 Dec 2023 23:59:58 +0000");
    }

    #[test]
    fn test_single_digit_fields_are_zero_padded() {
        let ts = Utc.with_ymd_and_hms(2001, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(http_date(Some(ts)), "Tue, 02 Jan 2001 03:04:05 +0000");
    }

    #[test]
    fn test_default_is_now_in_utc() {
        let formatted = http_date(None);
        assert!(formatted.ends_with(" +0000"));
        // "Mon, 01 Jan 2024 00:00:00 +0000"
        assert_eq!(formatted.len(), 31);
        assert_eq!(&formatted[3..5], ", ");
    }
}
