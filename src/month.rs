//! Helpers for the `YYYY-MM` month keys used in filters and summaries.

use time::{Date, Month};

use crate::Error;

/// Format `date`'s year and month as a `YYYY-MM` key.
pub fn key(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), date.month() as u8)
}

/// Parse a `YYYY-MM` key into the first day of that month.
///
/// # Errors
/// Returns [Error::InvalidMonthKey] unless `key` is a four digit year
/// and a two digit month joined by a dash.
pub fn parse_key(key: &str) -> Result<Date, Error> {
    let invalid = || Error::InvalidMonthKey(key.to_owned());

    let (year_text, month_text) = key.split_once('-').ok_or_else(invalid)?;
    if year_text.len() != 4 || month_text.len() != 2 {
        return Err(invalid());
    }

    let year: i32 = year_text.parse().map_err(|_| invalid())?;
    let month_number: u8 = month_text.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month_number).map_err(|_| invalid())?;

    Date::from_calendar_date(year, month, 1).map_err(|_| invalid())
}

/// Whether two dates fall in the same calendar month.
pub fn same(a: Date, b: Date) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// The first day of `date`'s month.
pub fn first_day(date: Date) -> Date {
    date.replace_day(1).unwrap()
}

/// Serializes [Date]s as `YYYY-MM` keys for summary payloads.
pub mod serde_key {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use time::Date;

    /// Serialize `date` as a `YYYY-MM` key, dropping its day.
    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::key(*date))
    }

    /// Deserialize a `YYYY-MM` key into the first day of that month.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        super::parse_key(&text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod month_tests {
    use time::macros::date;

    use crate::Error;

    use super::{first_day, key, parse_key, same};

    #[test]
    fn formats_zero_padded_keys() {
        assert_eq!(key(date!(2024 - 03 - 15)), "2024-03");
        assert_eq!(key(date!(2024 - 12 - 01)), "2024-12");
    }

    #[test]
    fn parses_keys_to_the_first_of_the_month() {
        assert_eq!(parse_key("2024-03"), Ok(date!(2024 - 03 - 01)));
        assert_eq!(parse_key("1999-12"), Ok(date!(1999 - 12 - 01)));
    }

    #[test]
    fn key_and_parse_key_round_trip() {
        let month = date!(2026 - 08 - 01);

        assert_eq!(parse_key(&key(month)), Ok(month));
    }

    #[test]
    fn rejects_malformed_keys() {
        for text in ["2024", "2024-", "24-01", "2024-1", "2024-13", "2024-00", "abcd-ef", "2024-01-01"] {
            assert_eq!(
                parse_key(text),
                Err(Error::InvalidMonthKey(text.to_owned())),
                "{text} should be rejected",
            );
        }
    }

    #[test]
    fn same_ignores_the_day() {
        assert!(same(date!(2024 - 03 - 01), date!(2024 - 03 - 31)));
        assert!(!same(date!(2024 - 03 - 01), date!(2024 - 04 - 01)));
        assert!(!same(date!(2023 - 03 - 01), date!(2024 - 03 - 01)));
    }

    #[test]
    fn first_day_resets_the_day() {
        assert_eq!(first_day(date!(2024 - 02 - 29)), date!(2024 - 02 - 01));
    }
}
