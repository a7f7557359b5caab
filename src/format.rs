//! Human-readable sizes and dates, and parsing of `dd.mm.yyyy` input.

use chrono::{DateTime, Local, NaiveDate};

use crate::error::{Error, Result};

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count in 1024 steps, rounded to two decimals.
///
/// # Examples
///
/// ```
/// use filegod::format::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 B");
/// assert_eq!(format_file_size(1024), "1 KB");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut scale = 1u64;
    while unit + 1 < SIZE_UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }

    let value = (bytes as f64 / scale as f64 * 100.0).round() / 100.0;
    format!("{} {}", value, SIZE_UNITS[unit])
}

/// Formats a timestamp as `dd.mm.yyyy HH:MM` in local time.
pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format("%d.%m.%Y %H:%M").to_string()
}

/// Formats a calendar date as `dd.mm.yyyy`.
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Parses `dd.mm.yyyy`.
///
/// The input must have exactly three dot-separated numeric parts that form a
/// real calendar date.
///
/// # Examples
///
/// ```
/// use filegod::format::parse_date;
///
/// let date = parse_date("05.03.2024").unwrap();
/// assert_eq!(date.to_string(), "2024-03-05");
/// assert!(parse_date("2024-03-05").is_err());
/// ```
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let invalid = || Error::InvalidDate(input.to_string());

    let parts: Vec<&str> = input.trim().split('.').collect();
    let [day, month, year] = parts[..] else {
        return Err(invalid());
    };

    let number = |part: &str| -> Result<u32> {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        part.parse().map_err(|_| invalid())
    };

    let day = number(day)?;
    let month = number(month)?;
    let year = i32::try_from(number(year)?).map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size_units() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1), "1 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1024 * 1024), "1 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5 GB");
        assert_eq!(format_file_size(1024u64.pow(4)), "1 TB");
    }

    #[test]
    fn test_format_file_size_rounding() {
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1500), "1.46 KB");
    }

    #[test]
    fn test_format_file_size_caps_at_terabytes() {
        assert_eq!(format_file_size(2048 * 1024u64.pow(4)), "2048 TB");
    }

    #[test]
    fn test_parse_date_valid() {
        let date = parse_date("31.12.2023").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(
            parse_date(" 1.2.2024 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_date_rejects_wrong_shape() {
        assert!(parse_date("").is_err());
        assert!(parse_date("31.12").is_err());
        assert!(parse_date("31.12.2023.1").is_err());
        assert!(parse_date("31/12/2023").is_err());
        assert!(parse_date("aa.bb.cccc").is_err());
        assert!(parse_date("-1.12.2023").is_err());
    }

    #[test]
    fn test_parse_date_rejects_impossible_dates() {
        assert!(parse_date("31.02.2023").is_err());
        assert!(parse_date("00.01.2023").is_err());
        assert!(parse_date("01.13.2023").is_err());
    }

    #[test]
    fn test_format_date_round_trip_shape() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_date(&date), "05.03.2024");
    }
}
