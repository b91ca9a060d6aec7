//! Profile service: provisioning, lookup and updates.

use sqlx::{SqliteConnection, SqlitePool};
use staybook_database::{
    Page, PageRequest, ProfileChanges, ProfileFilter, ProfileRepository, Role, UserProfile,
};
use tracing::info;

use crate::policy::{self, Action, Relationship};
use crate::types::{MarketplaceError, MarketplaceResult, UpdateProfile};
use crate::utils::validation::required_text;

#[derive(Clone)]
pub struct ProfileService {
    profiles: ProfileRepository,
}

impl ProfileService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool),
        }
    }

    /// Return the profile of `user_id`, creating it with `default_role` if absent.
    pub async fn provision(&self, user_id: i64, default_role: Role) -> MarketplaceResult<UserProfile> {
        let profile = self.profiles.provision(user_id, default_role).await?;
        Ok(profile)
    }

    /// Provision on `conn`, typically the transaction that created the account.
    pub async fn provision_in(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        default_role: Role,
    ) -> MarketplaceResult<UserProfile> {
        let profile = ProfileRepository::provision_in(conn, user_id, default_role).await?;
        Ok(profile)
    }

    /// Profile of `user_id` if it has been provisioned.
    pub async fn find_for_user(&self, user_id: i64) -> MarketplaceResult<Option<UserProfile>> {
        Ok(self.profiles.find_by_user_id(user_id).await?)
    }

    /// The requester's own profile.
    pub async fn me(&self, user_id: i64) -> MarketplaceResult<UserProfile> {
        self.find_for_user(user_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("profile", "me"))
    }

    pub async fn get(&self, public_id: &str) -> MarketplaceResult<UserProfile> {
        self.profiles
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("profile", public_id))
    }

    pub async fn list(
        &self,
        filter: &ProfileFilter,
        page: PageRequest,
    ) -> MarketplaceResult<Page<UserProfile>> {
        Ok(self.profiles.list(filter, page).await?)
    }

    /// Update a profile. Account fields need the owner or an admin; role and
    /// verification changes need an admin.
    pub async fn update(
        &self,
        user_id: i64,
        public_id: &str,
        request: UpdateProfile,
    ) -> MarketplaceResult<UserProfile> {
        let target = self.get(public_id).await?;
        let requester = self.find_for_user(user_id).await?;
        let requester_role = requester.as_ref().map(|p| p.role).unwrap_or(Role::Guest);
        let relation = Relationship::subject(target.user_id == user_id);

        policy::authorize(requester_role, relation, Action::UpdateProfile)?;
        if request.role.is_some() {
            policy::authorize(requester_role, relation, Action::ChangeRole)?;
        }
        if request.email_verified.is_some() {
            policy::authorize(requester_role, relation, Action::VerifyEmail)?;
        }

        let email = request
            .email
            .as_deref()
            .map(validate_email)
            .transpose()?;

        let changes = ProfileChanges {
            email,
            first_name: request.first_name.map(|name| name.trim().to_owned()),
            last_name: request.last_name.map(|name| name.trim().to_owned()),
            role: request.role,
            email_verified: request.email_verified,
        };

        let updated = self.profiles.update(target.id, &changes).await.map_err(|err| {
            if err.is_duplicate() {
                MarketplaceError::conflict("email address is already in use")
            } else {
                err.into()
            }
        })?;

        if updated.role != target.role {
            info!(profile = %updated.public_id, from = %target.role, to = %updated.role, "profile role changed");
        }
        Ok(updated)
    }

    /// Move a guest profile to the host role. Returns the current profile.
    pub(crate) async fn ensure_host(&self, profile: UserProfile) -> MarketplaceResult<UserProfile> {
        if profile.role != Role::Guest {
            return Ok(profile);
        }
        if self.profiles.promote_to_host(profile.id).await? {
            info!(profile = %profile.public_id, "guest promoted to host");
        }
        self.profiles
            .find_by_id(profile.id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("profile", profile.public_id))
    }
}

fn validate_email(email: &str) -> MarketplaceResult<String> {
    let email = required_text("email", email)?.to_lowercase();
    let well_formed = matches!(
        email.split_once('@'),
        Some((local, domain)) if !local.is_empty() && domain.contains('.')
    );
    if !well_formed {
        return Err(MarketplaceError::validation("email address is invalid"));
    }
    Ok(email)
}
