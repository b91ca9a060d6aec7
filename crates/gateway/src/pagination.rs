//! Page-numbered list envelopes.

use axum::http::Uri;
use serde::{Deserialize, Serialize};
use staybook_config::PaginationConfig;
use staybook_database::{Page, PageRequest};
use url::form_urlencoded;
use utoipa::{IntoParams, ToSchema};

use crate::routes::models::{BookingResponse, ListingResponse, ProfileResponse, ReviewResponse};
use crate::ApiError;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub page_size: u32,
}

impl PageQuery {
    pub fn resolve(&self, config: &PaginationConfig) -> Result<PageParams, ApiError> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::bad_request("page must be a positive integer"));
        }
        let page_size = self
            .page_size
            .filter(|size| *size > 0)
            .unwrap_or(config.page_size)
            .min(config.max_page_size)
            .max(1);
        Ok(PageParams { page, page_size })
    }
}

impl PageParams {
    pub fn request(&self) -> PageRequest {
        PageRequest::from_page(self.page, self.page_size)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    ProfilePage = Paginated<ProfileResponse>,
    ListingPage = Paginated<ListingResponse>,
    BookingPage = Paginated<BookingResponse>,
    ReviewPage = Paginated<ReviewResponse>
)]
pub struct Paginated<T> {
    /// Total number of results across all pages.
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new<S>(page: Page<S>, params: PageParams, uri: &Uri) -> Self
    where
        S: Into<T>,
    {
        let shown = u64::from(params.page) * u64::from(params.page_size);
        let has_next = u64::try_from(page.total).map_or(false, |total| shown < total);

        Self {
            count: page.total,
            page: params.page,
            page_size: params.page_size,
            next: has_next.then(|| page_link(uri, params.page + 1, params.page_size)),
            previous: (params.page > 1).then(|| page_link(uri, params.page - 1, params.page_size)),
            results: page.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// `uri` with its `page` and `page_size` query values replaced.
fn page_link(uri: &Uri, page: u32, page_size: u32) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(existing) = uri.query() {
        for (key, value) in form_urlencoded::parse(existing.as_bytes()) {
            if key != "page" && key != "page_size" {
                query.append_pair(&key, &value);
            }
        }
    }
    query.append_pair("page", &page.to_string());
    query.append_pair("page_size", &page_size.to_string());

    format!("{}?{}", uri.path(), query.finish())
}
