//! Construction of the remote collaborators from configuration.
//!
//! Keeps the choice between the JSON endpoint and the community listing,
//! and whether identity lookups happen at all, in one place.

use std::sync::Arc;
use steam_reviews_config::{FetchConfig, IdentityConfig, SourceKind};
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::steam::{CommunityReviewScraper, SteamPlayerSummaries, SteamReviewApi};
use crate::traits::{IdentitySource, ReviewSource};

/// Create the review source selected by `kind`
pub fn create_review_source(kind: SourceKind, fetch: &FetchConfig) -> Result<Arc<dyn ReviewSource>, SourceError> {
    let source: Arc<dyn ReviewSource> = match kind {
        SourceKind::Api => Arc::new(SteamReviewApi::new(fetch.request_timeout())?),
        SourceKind::Community => Arc::new(CommunityReviewScraper::new(
            fetch.request_timeout(),
            fetch.page_delay(),
        )?),
    };
    debug!("Using review source '{}'", source.source_name());
    Ok(source)
}

/// Create the identity source, or `None` when lookups are disabled or no API key is available
pub fn create_identity_source(
    identity: &IdentityConfig,
    api_key: Option<String>,
) -> Result<Option<Arc<dyn IdentitySource>>, SourceError> {
    if !identity.enabled {
        debug!("Identity lookups disabled in configuration");
        return Ok(None);
    }

    match api_key {
        Some(key) => {
            let source = SteamPlayerSummaries::new(key, identity.timeout())?;
            Ok(Some(Arc::new(source)))
        }
        None => {
            warn!("No Steam API key configured; authors will be shown by their Steam id");
            Ok(None)
        }
    }
}
