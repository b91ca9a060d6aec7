//! Booking service: reservations, pricing and the booking lifecycle.

use sqlx::SqlitePool;
use staybook_database::{
    Booking, BookingFilter, BookingRepository, BookingStatus, ListingRepository, ListingStatus,
    NewBooking, Page, PageRequest, RecordScope, Role, UserProfile,
};
use tracing::{info, warn};

use crate::policy::{self, Action, Relationship};
use crate::scope::record_scope;
use crate::services::ProfileService;
use crate::types::{CreateBooking, MarketplaceError, MarketplaceResult, RescheduleBooking};
use crate::utils::validation::{parse_date_range, stay_nights, total_price};

#[derive(Clone)]
pub struct BookingService {
    bookings: BookingRepository,
    listings: ListingRepository,
    profiles: ProfileService,
}

impl BookingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            bookings: BookingRepository::new(pool.clone()),
            listings: ListingRepository::new(pool.clone()),
            profiles: ProfileService::new(pool),
        }
    }

    /// Bookings visible to the requester.
    pub async fn list(&self, user_id: i64, page: PageRequest) -> MarketplaceResult<Page<Booking>> {
        let scope = self.scope_for(user_id).await?;
        Ok(self
            .bookings
            .list(scope, &BookingFilter::default(), page)
            .await?)
    }

    /// Booking by public id; bookings outside the requester's scope are not found.
    pub async fn get(&self, user_id: i64, public_id: &str) -> MarketplaceResult<Booking> {
        let scope = self.scope_for(user_id).await?;
        self.bookings
            .find_by_public_id(public_id, scope)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("booking", public_id))
    }

    /// Bookings made by the guest `guest_public_id`; visible to that guest and admins.
    pub async fn list_for_guest(
        &self,
        user_id: i64,
        guest_public_id: &str,
        page: PageRequest,
    ) -> MarketplaceResult<Page<Booking>> {
        let guest = self.profiles.get(guest_public_id).await?;
        let requester_role = self
            .profiles
            .find_for_user(user_id)
            .await?
            .map(|profile| profile.role)
            .unwrap_or(Role::Guest);
        let relation = Relationship::subject(guest.user_id == user_id);
        policy::authorize(requester_role, relation, Action::ViewGuestBookings)?;

        let filter = BookingFilter {
            guest_id: Some(guest.id),
            ..Default::default()
        };
        Ok(self
            .bookings
            .list(RecordScope::Everything, &filter, page)
            .await?)
    }

    /// Reserve a listing for the requester.
    ///
    /// The requester's profile is provisioned as a guest if needed. The overlap
    /// check and the insert run as one statement; losing a race for the same
    /// dates yields [`MarketplaceError::Conflict`].
    pub async fn create(&self, user_id: i64, request: CreateBooking) -> MarketplaceResult<Booking> {
        let guest = self.profiles.provision(user_id, Role::Guest).await?;

        let listing = self
            .listings
            .find_by_public_id(&request.listing_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("listing", &request.listing_id))?;
        if listing.status != ListingStatus::Approved {
            return Err(MarketplaceError::validation(
                "this listing is not open for bookings",
            ));
        }

        let (start, end) =
            parse_date_range(Some(&request.start_date), Some(&request.end_date))?;
        let nights = stay_nights(start, end);
        let total = total_price(nights, listing.price_per_night)?;

        let booking = self
            .bookings
            .create_if_available(&NewBooking {
                listing_id: listing.id,
                guest_id: guest.id,
                start_date: start,
                end_date: end,
                total_price: total,
            })
            .await?
            .ok_or_else(|| {
                warn!(listing = %listing.public_id, %start, %end, "booking dates unavailable");
                MarketplaceError::conflict("the listing is already booked for these dates")
            })?;

        info!(
            booking = %booking.public_id,
            listing = %listing.public_id,
            guest = %guest.public_id,
            nights,
            total_price = booking.total_price,
            "booking created"
        );
        Ok(booking)
    }

    /// Move a pending booking to new dates and reprice it.
    pub async fn reschedule(
        &self,
        user_id: i64,
        public_id: &str,
        request: RescheduleBooking,
    ) -> MarketplaceResult<Booking> {
        let (requester, booking) = self.load_for_action(user_id, public_id).await?;
        policy::authorize(
            requester.role,
            relationship(&requester, &booking),
            Action::RescheduleBooking,
        )?;
        if booking.status != BookingStatus::Pending {
            return Err(MarketplaceError::validation(
                "only pending bookings can be rescheduled",
            ));
        }

        let (start, end) =
            parse_date_range(Some(&request.start_date), Some(&request.end_date))?;
        let listing = self
            .listings
            .find_by_id(booking.listing_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("listing", &booking.listing_public_id))?;
        let total = total_price(stay_nights(start, end), listing.price_per_night)?;

        if !self
            .bookings
            .reschedule_if_available(booking.id, start, end, total)
            .await?
        {
            return Err(MarketplaceError::conflict(
                "the booking changed or the new dates are already booked",
            ));
        }

        info!(booking = %booking.public_id, %start, %end, "booking rescheduled");
        self.reload(&booking).await
    }

    /// Remove a booking outright. Administrators only.
    pub async fn delete(&self, user_id: i64, public_id: &str) -> MarketplaceResult<()> {
        let (requester, booking) = self.load_for_action(user_id, public_id).await?;
        policy::authorize(
            requester.role,
            relationship(&requester, &booking),
            Action::DeleteBooking,
        )?;
        self.bookings.delete(booking.id).await?;
        info!(booking = %booking.public_id, "booking deleted");
        Ok(())
    }

    /// Confirm a pending booking. Only the listing's host may confirm.
    pub async fn confirm(&self, user_id: i64, public_id: &str) -> MarketplaceResult<Booking> {
        self.transition(
            user_id,
            public_id,
            Action::ConfirmBooking,
            BookingStatus::Confirmed,
        )
        .await
    }

    /// Cancel a pending or confirmed booking. The guest or the listing's host may cancel.
    pub async fn cancel(&self, user_id: i64, public_id: &str) -> MarketplaceResult<Booking> {
        self.transition(
            user_id,
            public_id,
            Action::CancelBooking,
            BookingStatus::Cancelled,
        )
        .await
    }

    async fn transition(
        &self,
        user_id: i64,
        public_id: &str,
        action: Action,
        next: BookingStatus,
    ) -> MarketplaceResult<Booking> {
        let (requester, booking) = self.load_for_action(user_id, public_id).await?;
        policy::authorize(requester.role, relationship(&requester, &booking), action)?;

        if !booking.status.can_transition_to(next) {
            warn!(booking = %booking.public_id, from = %booking.status, to = %next, "invalid booking transition");
            return Err(MarketplaceError::permission_denied(format!(
                "a {} booking cannot be {}",
                booking.status, next
            )));
        }

        if !self
            .bookings
            .transition_status(booking.id, booking.status, next)
            .await?
        {
            return Err(MarketplaceError::conflict(
                "the booking was modified concurrently, retry the request",
            ));
        }

        info!(booking = %booking.public_id, from = %booking.status, to = %next, "booking status changed");
        self.reload(&booking).await
    }

    /// Requester profile plus the booking, looked up without scoping so that
    /// unauthorized callers get a permission error rather than a miss.
    async fn load_for_action(
        &self,
        user_id: i64,
        public_id: &str,
    ) -> MarketplaceResult<(UserProfile, Booking)> {
        let booking = self
            .bookings
            .find_by_public_id(public_id, RecordScope::Everything)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("booking", public_id))?;
        let requester = self.profiles.find_for_user(user_id).await?.ok_or_else(|| {
            MarketplaceError::permission_denied("a profile is required for this action")
        })?;
        Ok((requester, booking))
    }

    async fn reload(&self, booking: &Booking) -> MarketplaceResult<Booking> {
        self.bookings
            .find_by_id(booking.id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("booking", &booking.public_id))
    }

    async fn scope_for(&self, user_id: i64) -> MarketplaceResult<RecordScope> {
        let profile = self.profiles.find_for_user(user_id).await?;
        Ok(record_scope(profile.as_ref()))
    }
}

fn relationship(requester: &UserProfile, booking: &Booking) -> Relationship {
    Relationship {
        is_subject: booking.guest_id == requester.id,
        is_host: booking.host_id == requester.id,
    }
}
