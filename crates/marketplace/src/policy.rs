//! Authorization table for marketplace actions.
//!
//! Every guarded action maps to exactly one [`Rule`]. A rule is evaluated
//! against the requester's role and how the requester relates to the record
//! being touched.

use staybook_database::Role;
use tracing::warn;

use crate::types::MarketplaceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    UpdateProfile,
    ChangeRole,
    VerifyEmail,
    ViewGuestBookings,
    UpdateListing,
    DeleteListing,
    ModerateListing,
    ConfirmBooking,
    CancelBooking,
    RescheduleBooking,
    DeleteBooking,
    CreateReview,
    UpdateReview,
    DeleteReview,
    RespondToReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The requester owns or authored the record.
    Subject,
    /// The requester hosts the listing the record belongs to.
    Host,
    SubjectOrHost,
    SubjectOrAdmin,
    AdminOnly,
}

/// How the requester relates to the record under consideration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relationship {
    pub is_subject: bool,
    pub is_host: bool,
}

impl Relationship {
    pub fn subject(is_subject: bool) -> Self {
        Self {
            is_subject,
            is_host: false,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

impl Action {
    pub const ALL: [Action; 15] = [
        Action::UpdateProfile,
        Action::ChangeRole,
        Action::VerifyEmail,
        Action::ViewGuestBookings,
        Action::UpdateListing,
        Action::DeleteListing,
        Action::ModerateListing,
        Action::ConfirmBooking,
        Action::CancelBooking,
        Action::RescheduleBooking,
        Action::DeleteBooking,
        Action::CreateReview,
        Action::UpdateReview,
        Action::DeleteReview,
        Action::RespondToReview,
    ];

    pub const fn rule(self) -> Rule {
        match self {
            Action::UpdateProfile => Rule::SubjectOrAdmin,
            Action::ChangeRole | Action::VerifyEmail => Rule::AdminOnly,
            Action::ViewGuestBookings => Rule::SubjectOrAdmin,
            Action::UpdateListing | Action::DeleteListing => Rule::SubjectOrAdmin,
            Action::ModerateListing => Rule::AdminOnly,
            Action::ConfirmBooking => Rule::Host,
            Action::CancelBooking => Rule::SubjectOrHost,
            Action::RescheduleBooking => Rule::SubjectOrAdmin,
            Action::DeleteBooking => Rule::AdminOnly,
            Action::CreateReview | Action::UpdateReview => Rule::Subject,
            Action::DeleteReview => Rule::SubjectOrAdmin,
            Action::RespondToReview => Rule::Host,
        }
    }

    fn denial(self) -> &'static str {
        match self {
            Action::UpdateProfile => "you can only update your own profile",
            Action::ChangeRole => "only administrators can change roles",
            Action::VerifyEmail => "only administrators can verify email addresses",
            Action::ViewGuestBookings => "you can only view your own bookings",
            Action::UpdateListing => "only the listing host can update this listing",
            Action::DeleteListing => "only the listing host can delete this listing",
            Action::ModerateListing => "only administrators can change a listing's status",
            Action::ConfirmBooking => "only the property host can confirm bookings",
            Action::CancelBooking => {
                "you can only cancel your own bookings or those of your properties"
            }
            Action::RescheduleBooking => "you can only change the dates of your own bookings",
            Action::DeleteBooking => "only administrators can delete bookings",
            Action::CreateReview => "you can only review your own bookings",
            Action::UpdateReview => "you can only edit your own reviews",
            Action::DeleteReview => "you can only delete your own reviews",
            Action::RespondToReview => "only the property host can respond to reviews",
        }
    }
}

impl Rule {
    pub fn permits(self, role: Role, relation: Relationship) -> bool {
        let is_admin = role == Role::Admin;
        match self {
            Rule::Subject => relation.is_subject,
            Rule::Host => relation.is_host,
            Rule::SubjectOrHost => relation.is_subject || relation.is_host,
            Rule::SubjectOrAdmin => relation.is_subject || is_admin,
            Rule::AdminOnly => is_admin,
        }
    }
}

pub fn is_allowed(role: Role, relation: Relationship, action: Action) -> bool {
    action.rule().permits(role, relation)
}

/// Check `action` and turn a refusal into [`MarketplaceError::PermissionDenied`].
pub fn authorize(role: Role, relation: Relationship, action: Action) -> Result<(), MarketplaceError> {
    if is_allowed(role, relation, action) {
        return Ok(());
    }
    warn!(?action, role = %role, ?relation, "action denied");
    Err(MarketplaceError::permission_denied(action.denial()))
}

/// Roles a new account may pick for itself.
pub fn is_self_assignable(role: Role) -> bool {
    matches!(role, Role::Guest | Role::Host)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBJECT: Relationship = Relationship {
        is_subject: true,
        is_host: false,
    };
    const HOST: Relationship = Relationship {
        is_subject: false,
        is_host: true,
    };
    const STRANGER: Relationship = Relationship {
        is_subject: false,
        is_host: false,
    };

    #[test]
    fn admin_only_ignores_relationship() {
        for action in [Action::ChangeRole, Action::DeleteBooking, Action::ModerateListing] {
            assert!(is_allowed(Role::Admin, STRANGER, action));
            assert!(!is_allowed(Role::Host, HOST, action));
            assert!(!is_allowed(Role::Guest, SUBJECT, action));
        }
    }

    #[test]
    fn confirm_requires_the_listing_host() {
        assert!(is_allowed(Role::Host, HOST, Action::ConfirmBooking));
        assert!(!is_allowed(Role::Admin, STRANGER, Action::ConfirmBooking));
        assert!(!is_allowed(Role::Guest, SUBJECT, Action::ConfirmBooking));
    }

    #[test]
    fn cancel_allows_guest_or_host() {
        assert!(is_allowed(Role::Guest, SUBJECT, Action::CancelBooking));
        assert!(is_allowed(Role::Host, HOST, Action::CancelBooking));
        assert!(!is_allowed(Role::Host, STRANGER, Action::CancelBooking));
    }

    #[test]
    fn subject_or_admin_admits_both() {
        assert!(is_allowed(Role::Guest, SUBJECT, Action::UpdateProfile));
        assert!(is_allowed(Role::Admin, STRANGER, Action::UpdateProfile));
        assert!(!is_allowed(Role::Host, HOST, Action::UpdateProfile));
    }

    #[test]
    fn every_action_has_a_denial_message() {
        for action in Action::ALL {
            assert!(!action.denial().is_empty());
        }
    }

    #[test]
    fn nobody_can_assign_admin_to_themselves() {
        assert!(is_self_assignable(Role::Guest));
        assert!(is_self_assignable(Role::Host));
        assert!(!is_self_assignable(Role::Admin));
    }

    #[test]
    fn authorize_reports_permission_denied() {
        let err = authorize(Role::Guest, STRANGER, Action::RespondToReview).unwrap_err();
        assert!(matches!(err, MarketplaceError::PermissionDenied { .. }));
    }
}
