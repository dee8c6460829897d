use chrono::{DateTime, TimeZone};

/// Format an integer with `,` thousands separators (`1000` -> `"1,000"`).
pub fn format_number(num: i64) -> String {
    let digits = num.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if num < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Long-form date and time for the header clock, e.g.
/// `Monday, January 1, 2024 at 09:05:03 AM`.
pub fn format_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%A, %B %-d, %Y at %I:%M:%S %p").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_000_000), "1,000,000");
        assert_eq!(format_number(12_345_678), "12,345,678");
    }

    #[test]
    fn keeps_sign_outside_grouping() {
        assert_eq!(format_number(-1_234_567), "-1,234,567");
        assert_eq!(format_number(-12), "-12");
        assert_eq!(format_number(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn datetime_uses_long_weekday_and_twelve_hour_clock() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 21, 5, 3).unwrap();
        assert_eq!(format_datetime(&at), "Monday, January 1, 2024 at 09:05:03 PM");
    }
}
