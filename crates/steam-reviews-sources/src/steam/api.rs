use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use steam_reviews_models::{RawReview, ReviewFilters, ReviewPage};
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::steam::client::{check_status, create_steam_client};
use crate::traits::ReviewSource;

const APP_REVIEWS_URL: &str = "https://store.steampowered.com/appreviews";

#[derive(Debug, Deserialize)]
struct AppReviewsResponse {
    #[serde(default)]
    success: Option<i64>,
    #[serde(default)]
    reviews: Vec<ApiReview>,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiReview {
    #[serde(default)]
    author: ApiAuthor,
    review: Option<String>,
    voted_up: Option<bool>,
    timestamp_created: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiAuthor {
    steamid: Option<String>,
    playtime_forever: Option<u64>, // Minutes
}

impl From<ApiReview> for RawReview {
    fn from(review: ApiReview) -> Self {
        RawReview {
            author_id: review.author.steamid,
            body: review.review,
            recommended: review.voted_up,
            timestamp_created: review.timestamp_created,
            playtime_minutes: review.author.playtime_forever,
        }
    }
}

/// Parse one `appreviews?json=1` response body into a page
pub fn parse_reviews_response(body: &str) -> Result<ReviewPage, SourceError> {
    let response: AppReviewsResponse = serde_json::from_str(body)?;

    if let Some(success) = response.success {
        if success != 1 {
            return Err(SourceError::Api(format!("appreviews returned success={}", success)));
        }
    }

    let next_cursor = response.cursor.filter(|c| !c.is_empty());
    Ok(ReviewPage {
        reviews: response.reviews.into_iter().map(RawReview::from).collect(),
        next_cursor,
    })
}

/// Reviews from the store's JSON review endpoint
#[derive(Clone)]
pub struct SteamReviewApi {
    client: Arc<Client>,
}

impl SteamReviewApi {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self::with_client(create_steam_client(timeout)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl ReviewSource for SteamReviewApi {
    fn source_name(&self) -> &str {
        "steam-api"
    }

    async fn fetch_page(
        &self,
        source_id: &str,
        filters: &ReviewFilters,
        page_size: u32,
        cursor: &str,
    ) -> Result<ReviewPage, SourceError> {
        let url = format!("{}/{}", APP_REVIEWS_URL, source_id);
        let page_size = page_size.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("json", "1"),
                ("filter", "recent"),
                ("review_type", filters.review_type.as_str()),
                ("purchase_type", "all"),
                ("language", filters.language.as_str()),
                ("num_per_page", page_size.as_str()),
                ("cursor", cursor),
            ])
            .send()
            .await?;
        let response = check_status(response)?;
        let body = response.text().await?;

        let page = match parse_reviews_response(&body) {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    "Failed to parse Steam reviews response: {}. Response length: {}, URL: {}",
                    e,
                    body.len(),
                    url
                );
                if body.len() < 500 {
                    debug!("Steam reviews raw response: {}", body);
                }
                return Err(e);
            }
        };

        debug!(
            "Steam reviews API: app={}, cursor={}, items_on_page={}, has_next={}",
            source_id,
            cursor,
            page.reviews.len(),
            page.next_cursor.is_some()
        );

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "success": 1,
        "query_summary": {"num_reviews": 2},
        "reviews": [
            {
                "recommendationid": "1",
                "author": {"steamid": "76561197960287930", "playtime_forever": 4521},
                "language": "english",
                "review": "Still the best.",
                "timestamp_created": 1700000000,
                "voted_up": true
            },
            {
                "recommendationid": "2",
                "author": {"steamid": "76561197960287931"},
                "review": "Crashes on launch",
                "timestamp_created": 1699990000,
                "voted_up": false
            }
        ],
        "cursor": "AoJwq9fV8YsDeL7y1QI="
    }"#;

    #[test]
    fn test_parse_reviews_response() {
        let page = parse_reviews_response(SAMPLE).unwrap();
        assert_eq!(page.reviews.len(), 2);
        assert_eq!(page.next_cursor.as_deref(), Some("AoJwq9fV8YsDeL7y1QI="));

        let first = &page.reviews[0];
        assert_eq!(first.author_id.as_deref(), Some("76561197960287930"));
        assert_eq!(first.body.as_deref(), Some("Still the best."));
        assert_eq!(first.recommended, Some(true));
        assert_eq!(first.timestamp_created, Some(1_700_000_000));
        assert_eq!(first.playtime_minutes, Some(4521));

        assert_eq!(page.reviews[1].playtime_minutes, None);
        assert_eq!(page.reviews[1].recommended, Some(false));
    }

    #[test]
    fn test_parse_empty_page_without_cursor() {
        let page = parse_reviews_response(r#"{"success": 1, "reviews": [], "cursor": ""}"#).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_parse_reports_api_failure() {
        let result = parse_reviews_response(r#"{"success": 2}"#);
        assert!(matches!(result, Err(SourceError::Api(_))));
    }

    #[test]
    fn test_parse_rejects_malformed_body() {
        let result = parse_reviews_response("<html>Access denied</html>");
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_missing_author_block() {
        let page = parse_reviews_response(r#"{"success": 1, "reviews": [{"review": "ok"}]}"#).unwrap();
        assert_eq!(page.reviews[0].author_id, None);
        assert_eq!(page.next_cursor, None);
    }
}
