/// Field validators and date parsing shared by the request types
///
/// The `#[validate(custom(function = ...))]` hooks below cover the checks
/// the validator crate has no built-in for. Each attribute site supplies its
/// own client-facing message.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};
use snackfund_shared::models::user::{age_on, is_valid_phone, MIN_AGE_YEARS};
use validator::ValidationError;

/// Rejects empty or whitespace-only strings
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Rejects zero, negative and non-finite amounts
pub fn positive_amount(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::new("not_positive"));
    }
    Ok(())
}

/// Rejects negative and non-finite amounts
pub fn non_negative_amount(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::new("negative"));
    }
    Ok(())
}

pub fn valid_phone(value: &str) -> Result<(), ValidationError> {
    if !is_valid_phone(value) {
        return Err(ValidationError::new("phone"));
    }
    Ok(())
}

/// Requires the account holder to be at least 18 today
pub fn adult_dob(dob: &NaiveDate) -> Result<(), ValidationError> {
    if age_on(*dob, Utc::now().date_naive()) < MIN_AGE_YEARS {
        return Err(ValidationError::new("underage"));
    }
    Ok(())
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date
///
/// A bare date means midnight UTC. The flag reports whether the input was
/// date-only, so range ends can be widened to the end of that day.
///
/// Query strings decode an unescaped `+` as a space, so a timestamp like
/// `2025-03-14T09:30:00 02:00` is read as having a `+02:00` offset.
pub fn parse_datetime(raw: &str) -> Option<(DateTime<Utc>, bool)> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some((ts.with_timezone(&Utc), false));
    }

    if let Some(idx) = raw.rfind(' ').filter(|&idx| raw[..idx].contains('T')) {
        let restored = format!("{}+{}", &raw[..idx], &raw[idx + 1..]);
        if let Ok(ts) = DateTime::parse_from_rfc3339(&restored) {
            return Some((ts.with_timezone(&Utc), false));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| (date.and_time(NaiveTime::MIN).and_utc(), true))
}

/// Serde hook for optional `date` fields accepting either format
pub fn deserialize_optional_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;

    match raw {
        None => Ok(None),
        Some(s) => parse_datetime(&s).map(|(ts, _)| Some(ts)).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid date '{}': expected RFC 3339 or YYYY-MM-DD",
                s
            ))
        }),
    }
}
