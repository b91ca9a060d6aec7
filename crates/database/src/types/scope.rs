//! Visibility of booking and review rows relative to the requesting profile.

use sqlx::{QueryBuilder, Sqlite};

/// Which rows of a scoped collection a requester may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordScope {
    /// Every row (administrators).
    Everything,
    /// Rows whose parent listing is hosted by this profile id.
    HostedBy(i64),
    /// Rows authored by this profile id.
    AuthoredBy(i64),
    /// No rows at all.
    Nothing,
}

impl RecordScope {
    pub fn is_nothing(&self) -> bool {
        matches!(self, RecordScope::Nothing)
    }

    /// Append the scope as an `AND` clause to a query whose `WHERE` is already open.
    pub(crate) fn push_predicate(
        &self,
        query: &mut QueryBuilder<'_, Sqlite>,
        host_column: &str,
        author_column: &str,
    ) {
        match self {
            RecordScope::Everything => {}
            RecordScope::HostedBy(profile_id) => {
                query.push(format!(" AND {host_column} = "));
                query.push_bind(*profile_id);
            }
            RecordScope::AuthoredBy(profile_id) => {
                query.push(format!(" AND {author_column} = "));
                query.push_bind(*profile_id);
            }
            RecordScope::Nothing => {
                query.push(" AND 0");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(scope: RecordScope) -> String {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT 1 FROM bookings b WHERE 1=1");
        scope.push_predicate(&mut query, "l.host_id", "b.guest_id");
        query.sql().to_string()
    }

    #[test]
    fn scope_renders_expected_predicates() {
        assert_eq!(render(RecordScope::Everything), "SELECT 1 FROM bookings b WHERE 1=1");
        assert!(render(RecordScope::HostedBy(7)).ends_with("AND l.host_id = ?"));
        assert!(render(RecordScope::AuthoredBy(7)).ends_with("AND b.guest_id = ?"));
        assert!(render(RecordScope::Nothing).ends_with("AND 0"));
    }
}
