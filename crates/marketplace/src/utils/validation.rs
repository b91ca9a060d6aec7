//! Input validation helpers.

use chrono::NaiveDate;

use crate::types::{MarketplaceError, MarketplaceResult};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_iso_date(field: &str, value: &str) -> MarketplaceResult<NaiveDate> {
    let value = value.trim();
    if value.len() != 10 {
        return Err(invalid_date(field, value));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid_date(field, value))
}

fn invalid_date(field: &str, value: &str) -> MarketplaceError {
    MarketplaceError::validation(format!("{field} must be a date in YYYY-MM-DD format, got `{value}`"))
}

/// Parse a half-open `[start, end)` range, requiring both ends and `end > start`.
pub fn parse_date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> MarketplaceResult<(NaiveDate, NaiveDate)> {
    let (Some(start), Some(end)) = (non_empty(start), non_empty(end)) else {
        return Err(MarketplaceError::validation(
            "start_date and end_date parameters are required",
        ));
    };
    let start = parse_iso_date("start_date", start)?;
    let end = parse_iso_date("end_date", end)?;
    if stay_nights(start, end) <= 0 {
        return Err(MarketplaceError::validation("end_date must be after start_date"));
    }
    Ok((start, end))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Whole nights between two dates; zero or negative for empty ranges.
pub fn stay_nights(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// `nights * price_per_night`, refusing empty stays and overflowing totals.
pub fn total_price(nights: i64, price_per_night: i64) -> MarketplaceResult<i64> {
    if nights <= 0 {
        return Err(MarketplaceError::validation("a booking must cover at least one night"));
    }
    nights
        .checked_mul(price_per_night)
        .ok_or_else(|| MarketplaceError::validation("total price is too large"))
}

/// Trim `value` and require it to be non-empty.
pub fn required_text(field: &str, value: &str) -> MarketplaceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MarketplaceError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_owned())
}

pub fn validate_rating(rating: i64) -> MarketplaceResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(MarketplaceError::validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    Ok(())
}

pub fn validate_non_negative(field: &str, value: i64) -> MarketplaceResult<()> {
    if value < 0 {
        return Err(MarketplaceError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

pub fn validate_guest_capacity(max_guests: i64) -> MarketplaceResult<()> {
    if max_guests < 1 {
        return Err(MarketplaceError::validation("max_guests must be at least 1"));
    }
    Ok(())
}
