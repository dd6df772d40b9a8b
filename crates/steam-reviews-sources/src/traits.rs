use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use steam_reviews_models::{ReviewFilters, ReviewPage};

use crate::error::SourceError;

/// A paginated remote listing of reviews for one application
#[async_trait]
pub trait ReviewSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Upper bound for one [`ReviewSource::fetch_page`] call when each HTTP
    /// request is bounded by `request_timeout`
    fn call_timeout(&self, request_timeout: Duration) -> Duration {
        request_timeout
    }

    /// Fetch the page that starts at `cursor`.
    ///
    /// `cursor` is opaque to callers; [`steam_reviews_models::FIRST_PAGE_CURSOR`]
    /// asks for the first page. Filters are forwarded as-is; interpreting
    /// unknown values is up to the implementation.
    async fn fetch_page(
        &self,
        source_id: &str,
        filters: &ReviewFilters,
        page_size: u32,
        cursor: &str,
    ) -> Result<ReviewPage, SourceError>;
}

/// Resolves author identifiers to display labels
#[async_trait]
pub trait IdentitySource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Look up one batch. The result may cover only part of `ids`.
    async fn lookup(&self, ids: &[String]) -> Result<HashMap<String, String>, SourceError>;
}
