//! Listing service: public catalogue, host management and availability.

use sqlx::SqlitePool;
use staybook_database::{
    BookingRepository, Listing, ListingChanges, ListingFilter, ListingRepository, ListingStatus,
    NewListing, Page, PageRequest, Role, UserProfile,
};
use tracing::info;

use crate::policy::{self, Action, Relationship};
use crate::services::ProfileService;
use crate::types::{
    Availability, CreateListing, MarketplaceError, MarketplaceResult, UpdateListing,
};
use crate::utils::validation::{
    parse_date_range, required_text, validate_guest_capacity, validate_non_negative,
};

#[derive(Clone)]
pub struct ListingService {
    listings: ListingRepository,
    bookings: BookingRepository,
    profiles: ProfileService,
}

impl ListingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            listings: ListingRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            profiles: ProfileService::new(pool),
        }
    }

    /// Approved listings matching `filter`. Any status in the filter is overridden.
    pub async fn list_approved(
        &self,
        mut filter: ListingFilter,
        page: PageRequest,
    ) -> MarketplaceResult<Page<Listing>> {
        filter.status = Some(ListingStatus::Approved);
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(MarketplaceError::validation(
                    "min_price cannot be greater than max_price",
                ));
            }
        }
        Ok(self.listings.list(&filter, page).await?)
    }

    /// Listing by public id, whatever its moderation status.
    pub async fn get(&self, public_id: &str) -> MarketplaceResult<Listing> {
        self.listings
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("listing", public_id))
    }

    /// Listings owned by the profile with `host_public_id`.
    pub async fn list_for_host(
        &self,
        host_public_id: &str,
        page: PageRequest,
    ) -> MarketplaceResult<Page<Listing>> {
        let host = self.profiles.get(host_public_id).await?;
        let filter = ListingFilter {
            host_id: Some(host.id),
            ..Default::default()
        };
        Ok(self.listings.list(&filter, page).await?)
    }

    /// Create a listing owned by the requester.
    ///
    /// The requester's profile is provisioned as a host, and an existing guest
    /// profile is promoted. New listings await moderation.
    pub async fn create(&self, user_id: i64, request: CreateListing) -> MarketplaceResult<Listing> {
        let name = required_text("name", &request.name)?;
        let city = required_text("city", &request.city)?;
        validate_non_negative("price_per_night", request.price_per_night)?;
        validate_non_negative("bedrooms", request.bedrooms)?;
        validate_guest_capacity(request.max_guests)?;

        let profile = self.profiles.provision(user_id, Role::Host).await?;
        let host = self.profiles.ensure_host(profile).await?;

        let listing = self
            .listings
            .create(&NewListing {
                host_id: host.id,
                name,
                description: request.description.trim().to_owned(),
                city,
                county: request.county.trim().to_owned(),
                price_per_night: request.price_per_night,
                bedrooms: request.bedrooms,
                max_guests: request.max_guests,
            })
            .await?;

        info!(listing = %listing.public_id, host = %host.public_id, "listing created");
        Ok(listing)
    }

    pub async fn update(
        &self,
        user_id: i64,
        public_id: &str,
        request: UpdateListing,
    ) -> MarketplaceResult<Listing> {
        let listing = self.get(public_id).await?;
        let requester = self.requester(user_id).await?;
        let relation = Relationship::subject(listing.host_id == requester.id);

        policy::authorize(requester.role, relation, Action::UpdateListing)?;
        if request.status.is_some() {
            policy::authorize(requester.role, relation, Action::ModerateListing)?;
        }

        let changes = ListingChanges {
            name: request
                .name
                .as_deref()
                .map(|name| required_text("name", name))
                .transpose()?,
            description: request.description.map(|text| text.trim().to_owned()),
            city: request
                .city
                .as_deref()
                .map(|city| required_text("city", city))
                .transpose()?,
            county: request.county.map(|county| county.trim().to_owned()),
            price_per_night: request
                .price_per_night
                .map(|price| validate_non_negative("price_per_night", price).map(|_| price))
                .transpose()?,
            bedrooms: request
                .bedrooms
                .map(|count| validate_non_negative("bedrooms", count).map(|_| count))
                .transpose()?,
            max_guests: request
                .max_guests
                .map(|count| validate_guest_capacity(count).map(|_| count))
                .transpose()?,
            status: request.status,
        };

        if changes.is_empty() {
            return Ok(listing);
        }

        let updated = self.listings.update(listing.id, &changes).await?;
        if updated.status != listing.status {
            info!(listing = %updated.public_id, status = %updated.status, "listing moderated");
        }
        Ok(updated)
    }

    pub async fn delete(&self, user_id: i64, public_id: &str) -> MarketplaceResult<()> {
        let listing = self.get(public_id).await?;
        let requester = self.requester(user_id).await?;
        let relation = Relationship::subject(listing.host_id == requester.id);
        policy::authorize(requester.role, relation, Action::DeleteListing)?;

        if !self.listings.delete(listing.id).await? {
            return Err(MarketplaceError::not_found("listing", public_id));
        }
        info!(listing = %listing.public_id, "listing deleted");
        Ok(())
    }

    /// Count pending or confirmed bookings overlapping `[start_date, end_date)`.
    pub async fn availability(
        &self,
        public_id: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> MarketplaceResult<Availability> {
        let listing = self.get(public_id).await?;
        let (start, end) = parse_date_range(start_date, end_date)?;

        let conflicting = self
            .bookings
            .count_overlapping(listing.id, start, end)
            .await?;

        Ok(Availability {
            listing_id: listing.public_id,
            start_date: start,
            end_date: end,
            available: conflicting == 0,
            conflicting_bookings: conflicting,
        })
    }

    async fn requester(&self, user_id: i64) -> MarketplaceResult<UserProfile> {
        self.profiles.find_for_user(user_id).await?.ok_or_else(|| {
            MarketplaceError::permission_denied("a profile is required for this action")
        })
    }
}
