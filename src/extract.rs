use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;

/// Timestamp layout used in notification bodies and for DB storage.
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A captured field that failed to normalize after a structural match.
/// The dispatcher treats this the same as a non-match for that pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("unparsable amount: {0:?}")]
    Amount(String),

    #[error("unparsable timestamp: {0:?}")]
    Timestamp(String),

    #[error("amount must be positive, got {0:?}")]
    NonPositiveAmount(String),
}

/// Parse a digit string with comma thousands separators into an exact value.
/// "1,234,567" -> 1234567. Anything but digits and commas is rejected.
pub fn parse_amount(raw: &str) -> Result<Decimal, ExtractionError> {
    let cleaned = raw.replace(',', "");
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ExtractionError::Amount(raw.to_string()));
    }
    Decimal::from_str(&cleaned).map_err(|_| ExtractionError::Amount(raw.to_string()))
}

/// Like `parse_amount` but rejects zero. Transaction amounts must be > 0;
/// fees and balances go through `parse_amount` directly.
pub fn parse_positive_amount(raw: &str) -> Result<Decimal, ExtractionError> {
    let amount = parse_amount(raw)?;
    if amount.is_zero() {
        return Err(ExtractionError::NonPositiveAmount(raw.to_string()));
    }
    Ok(amount)
}

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp, naive local time.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ExtractionError> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT)
        .map_err(|_| ExtractionError::Timestamp(raw.to_string()))
}
