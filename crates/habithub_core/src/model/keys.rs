//! Date key formatting and validation.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static DATE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date key regex"));
static YEAR_MONTH_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])$").expect("valid year-month key regex"));

/// Rejected key value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Expected `YYYY-MM-DD` naming a real calendar day.
    InvalidDate(String),
    /// Expected `YYYY-MM`.
    InvalidYearMonth(String),
}

impl Display for KeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => {
                write!(f, "invalid date key `{value}`; expected YYYY-MM-DD")
            }
            Self::InvalidYearMonth(value) => {
                write!(f, "invalid year-month key `{value}`; expected YYYY-MM")
            }
        }
    }
}

impl Error for KeyError {}

/// Formats a calendar day as its storage key, e.g. `2025-07-15`.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formats the month containing `date`, e.g. `2025-07`.
pub fn year_month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Checks that `value` is a zero-padded date naming a real day.
pub fn validate_date_key(value: &str) -> Result<(), KeyError> {
    if !DATE_KEY_RE.is_match(value) || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err(KeyError::InvalidDate(value.to_string()));
    }
    Ok(())
}

/// Checks that `value` is a zero-padded `YYYY-MM` key.
pub fn validate_year_month_key(value: &str) -> Result<(), KeyError> {
    if !YEAR_MONTH_KEY_RE.is_match(value) {
        return Err(KeyError::InvalidYearMonth(value.to_string()));
    }
    Ok(())
}
