//! Review service: guest reviews and the host's one-time response.

use chrono::Utc;
use sqlx::SqlitePool;
use staybook_database::{
    BookingRepository, BookingStatus, ListingRepository, NewReview, Page, PageRequest,
    RecordScope, Review, ReviewChanges, ReviewFilter, ReviewRepository, Role, UserProfile,
};
use tracing::info;

use crate::policy::{self, Action, Relationship};
use crate::scope::record_scope;
use crate::services::ProfileService;
use crate::types::{CreateReview, MarketplaceError, MarketplaceResult, UpdateReview};
use crate::utils::validation::{required_text, validate_rating};

#[derive(Clone)]
pub struct ReviewService {
    reviews: ReviewRepository,
    bookings: BookingRepository,
    listings: ListingRepository,
    profiles: ProfileService,
}

impl ReviewService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            reviews: ReviewRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            listings: ListingRepository::new(pool.clone()),
            profiles: ProfileService::new(pool),
        }
    }

    /// Reviews visible to the requester.
    pub async fn list(&self, user_id: i64, page: PageRequest) -> MarketplaceResult<Page<Review>> {
        let scope = self.scope_for(user_id).await?;
        Ok(self
            .reviews
            .list(scope, &ReviewFilter::default(), page)
            .await?)
    }

    pub async fn get(&self, user_id: i64, public_id: &str) -> MarketplaceResult<Review> {
        let scope = self.scope_for(user_id).await?;
        self.reviews
            .find_by_public_id(public_id, scope)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("review", public_id))
    }

    /// Public reviews of one listing.
    pub async fn list_for_listing(
        &self,
        listing_public_id: &str,
        page: PageRequest,
    ) -> MarketplaceResult<Page<Review>> {
        let listing = self
            .listings
            .find_by_public_id(listing_public_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("listing", listing_public_id))?;
        let filter = ReviewFilter {
            listing_id: Some(listing.id),
        };
        Ok(self
            .reviews
            .list(RecordScope::Everything, &filter, page)
            .await?)
    }

    /// Review a confirmed stay. Only the booking's guest may review it, once.
    pub async fn create(&self, user_id: i64, request: CreateReview) -> MarketplaceResult<Review> {
        let author = self.profiles.provision(user_id, Role::Guest).await?;
        let booking = self
            .bookings
            .find_by_public_id(&request.booking_id, RecordScope::Everything)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("booking", &request.booking_id))?;

        policy::authorize(
            author.role,
            Relationship::subject(booking.guest_id == author.id),
            Action::CreateReview,
        )?;
        if booking.status != BookingStatus::Confirmed {
            return Err(MarketplaceError::validation(
                "only confirmed bookings can be reviewed",
            ));
        }
        validate_rating(request.rating)?;
        let body = required_text("body", &request.body)?;

        let review = self
            .reviews
            .create(&NewReview {
                booking_id: booking.id,
                listing_id: booking.listing_id,
                author_id: author.id,
                rating: request.rating,
                body,
            })
            .await
            .map_err(|err| {
                if err.is_duplicate() {
                    MarketplaceError::conflict("this booking has already been reviewed")
                } else {
                    err.into()
                }
            })?;

        info!(review = %review.public_id, booking = %booking.public_id, rating = review.rating, "review created");
        Ok(review)
    }

    pub async fn update(
        &self,
        user_id: i64,
        public_id: &str,
        request: UpdateReview,
    ) -> MarketplaceResult<Review> {
        let (requester, review) = self.load_for_action(user_id, public_id).await?;
        policy::authorize(
            requester.role,
            relationship(&requester, &review),
            Action::UpdateReview,
        )?;

        if let Some(rating) = request.rating {
            validate_rating(rating)?;
        }
        let changes = ReviewChanges {
            rating: request.rating,
            body: request
                .body
                .as_deref()
                .map(|body| required_text("body", body))
                .transpose()?,
        };

        let updated = self.reviews.update(review.id, &changes).await?;
        info!(review = %updated.public_id, "review updated");
        Ok(updated)
    }

    pub async fn delete(&self, user_id: i64, public_id: &str) -> MarketplaceResult<()> {
        let (requester, review) = self.load_for_action(user_id, public_id).await?;
        policy::authorize(
            requester.role,
            relationship(&requester, &review),
            Action::DeleteReview,
        )?;
        self.reviews.delete(review.id).await?;
        info!(review = %review.public_id, "review deleted");
        Ok(())
    }

    /// Attach the host's reply. Only the listing's host may reply, and only once.
    pub async fn respond(
        &self,
        user_id: i64,
        public_id: &str,
        response: &str,
    ) -> MarketplaceResult<Review> {
        let (requester, review) = self.load_for_action(user_id, public_id).await?;
        policy::authorize(
            requester.role,
            relationship(&requester, &review),
            Action::RespondToReview,
        )?;

        let response = required_text("host_response", response)?;
        if review.host_response.is_some() {
            return Err(already_responded());
        }

        if !self
            .reviews
            .set_host_response(review.id, &response, Utc::now())
            .await?
        {
            return Err(already_responded());
        }

        info!(review = %review.public_id, host = %requester.public_id, "host responded to review");
        self.reviews
            .find_by_id(review.id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("review", public_id))
    }

    async fn load_for_action(
        &self,
        user_id: i64,
        public_id: &str,
    ) -> MarketplaceResult<(UserProfile, Review)> {
        let review = self
            .reviews
            .find_by_public_id(public_id, RecordScope::Everything)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("review", public_id))?;
        let requester = self.profiles.find_for_user(user_id).await?.ok_or_else(|| {
            MarketplaceError::permission_denied("a profile is required for this action")
        })?;
        Ok((requester, review))
    }

    async fn scope_for(&self, user_id: i64) -> MarketplaceResult<RecordScope> {
        let profile = self.profiles.find_for_user(user_id).await?;
        Ok(record_scope(profile.as_ref()))
    }
}

fn relationship(requester: &UserProfile, review: &Review) -> Relationship {
    Relationship {
        is_subject: review.author_id == requester.id,
        is_host: review.host_id == requester.id,
    }
}

fn already_responded() -> MarketplaceError {
    MarketplaceError::conflict("the host has already responded to this review")
}
