//! Role-based visibility for booking and review collections.

use staybook_database::{RecordScope, Role, UserProfile};

/// Scope of the booking and review rows visible to `profile`.
///
/// A requester without a profile sees nothing; admins see everything; hosts
/// see rows tied to the listings they own; guests see rows they authored.
pub fn record_scope(profile: Option<&UserProfile>) -> RecordScope {
    match profile {
        None => RecordScope::Nothing,
        Some(profile) => match profile.role {
            Role::Admin => RecordScope::Everything,
            Role::Host => RecordScope::HostedBy(profile.id),
            Role::Guest => RecordScope::AuthoredBy(profile.id),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile(id: i64, role: Role) -> UserProfile {
        UserProfile {
            id,
            user_id: id,
            public_id: format!("p{id}"),
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            first_name: None,
            last_name: None,
            role,
            email_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn scope_follows_role() {
        assert_eq!(record_scope(None), RecordScope::Nothing);
        assert_eq!(
            record_scope(Some(&profile(1, Role::Admin))),
            RecordScope::Everything
        );
        assert_eq!(
            record_scope(Some(&profile(2, Role::Host))),
            RecordScope::HostedBy(2)
        );
        assert_eq!(
            record_scope(Some(&profile(3, Role::Guest))),
            RecordScope::AuthoredBy(3)
        );
    }
}
