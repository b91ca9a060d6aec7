//! Database repository implementations

pub mod booking_repository;
pub mod listing_repository;
pub mod profile_repository;
pub mod review_repository;

pub use booking_repository::BookingRepository;
pub use listing_repository::ListingRepository;
pub use profile_repository::ProfileRepository;
pub use review_repository::ReviewRepository;

use sqlx::{QueryBuilder, Sqlite};

/// `LIKE` pattern matching `text` as a literal substring, or `None` when blank.
///
/// Case folding is ASCII-only, the same as SQLite's `LOWER()`.
pub(crate) fn contains_pattern(text: Option<&str>) -> Option<String> {
    let text = text.map(str::trim).filter(|text| !text.is_empty())?;
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch.to_ascii_lowercase());
    }
    pattern.push('%');
    Some(pattern)
}

/// Push `LOWER(column) LIKE pattern` with `\` as the escape character.
pub(crate) fn push_like(query: &mut QueryBuilder<'_, Sqlite>, column: &str, pattern: &str) {
    query
        .push("LOWER(")
        .push(column)
        .push(") LIKE ")
        .push_bind(pattern.to_owned())
        .push(" ESCAPE '\\'");
}
