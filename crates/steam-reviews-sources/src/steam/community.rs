use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use steam_reviews_models::{RawReview, ReviewFilters, ReviewPage, ReviewType, FIRST_PAGE_CURSOR};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::steam::client::{check_status, create_steam_client};
use crate::traits::ReviewSource;

const COMMUNITY_URL: &str = "https://steamcommunity.com/app";

/// Listing pages skipped in one call when the verdict filter rejects every card
const MAX_FILTERED_PAGES: u32 = 5;

/// Scrapes the community review listing.
///
/// The cursor is the listing page number. The listing has no server-side
/// verdict filter, so `review_type` is applied to the scraped cards.
#[derive(Clone)]
pub struct CommunityReviewScraper {
    client: Arc<Client>,
    page_delay: Duration,
}

impl CommunityReviewScraper {
    pub fn new(timeout: Duration, page_delay: Duration) -> Result<Self, SourceError> {
        Ok(Self::with_client(create_steam_client(timeout)?, page_delay))
    }

    pub fn with_client(client: Client, page_delay: Duration) -> Self {
        Self {
            client: Arc::new(client),
            page_delay,
        }
    }

    async fn fetch_listing(&self, source_id: &str, language: &str, page: u32) -> Result<String, SourceError> {
        let url = format!("{}/{}/reviews/", COMMUNITY_URL, source_id);
        let page = page.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("p", page.as_str()),
                ("browsefilter", "mostrecent"),
                ("filterLanguage", language),
            ])
            .send()
            .await?;
        let response = check_status(response)?;
        Ok(response.text().await?)
    }
}

fn parse_page_cursor(cursor: &str) -> Result<u32, SourceError> {
    if cursor == FIRST_PAGE_CURSOR {
        return Ok(1);
    }
    cursor
        .parse::<u32>()
        .ok()
        .filter(|page| *page > 0)
        .ok_or_else(|| SourceError::Parse(format!("Invalid listing page cursor: {}", cursor)))
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse(format!("Invalid selector '{}': {}", css, e)))
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Review text without the "Posted: ..." line nested inside it
fn card_body(content: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    for child in content.children() {
        if let Some(element) = ElementRef::wrap(child) {
            if element.value().classes().any(|c| c == "date_posted") {
                continue;
            }
            lines.extend(element.text().map(str::trim).filter(|t| !t.is_empty()).map(str::to_string));
        } else if let Some(text) = child.value().as_text() {
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }
    }
    lines.join("\n")
}

/// "12.3 hrs on record" -> 738 minutes
pub fn parse_hours_on_record(text: &str) -> Option<u64> {
    let hours: f64 = text.split_whitespace().next()?.replace(',', "").parse().ok()?;
    if hours < 0.0 {
        return None;
    }
    Some((hours * 60.0).round() as u64)
}

/// Parse "Posted: 3 March, 2023" or "Posted: March 3" (current year) into unix seconds at midnight UTC
pub fn parse_posted_date(text: &str, current_year: i32) -> Option<i64> {
    let trimmed = text.trim();
    let date_text = trimmed.strip_prefix("Posted:").unwrap_or(trimmed).trim().trim_end_matches('.');
    let with_year = format!("{}, {}", date_text, current_year);

    let date = parse_listing_date(date_text).or_else(|| parse_listing_date(&with_year))?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

fn parse_listing_date(text: &str) -> Option<NaiveDate> {
    ["%B %d, %Y", "%d %B, %Y", "%B %d %Y", "%d %B %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Extract the account segment from a profile link (`/profiles/<id>/` or `/id/<vanity>/`)
pub fn author_from_profile_url(href: &str) -> Option<String> {
    let mut parts = href.trim_end_matches('/').rsplit('/');
    let id = parts.next()?;
    match parts.next()? {
        "profiles" | "id" if !id.is_empty() => Some(id.to_string()),
        _ => None,
    }
}

/// Parse every review card on one listing page, in page order
pub fn parse_review_cards(html: &str, current_year: i32) -> Result<Vec<RawReview>, SourceError> {
    let document = Html::parse_document(html);
    let card_sel = selector("div.apphub_Card")?;
    let content_sel = selector("div.apphub_CardTextContent")?;
    let date_sel = selector("div.date_posted")?;
    let title_sel = selector("div.title")?;
    let hours_sel = selector("div.hours")?;
    let author_sel = selector("div.apphub_CardContentAuthorName a")?;

    let mut reviews = Vec::new();
    for card in document.select(&card_sel) {
        let Some(content) = card.select(&content_sel).next() else {
            continue;
        };

        let timestamp_created = content
            .select(&date_sel)
            .next()
            .and_then(|date| parse_posted_date(&collapse_text(date), current_year));

        let recommended = card
            .select(&title_sel)
            .next()
            .map(|title| collapse_text(title).eq_ignore_ascii_case("Recommended"));

        let playtime_minutes = card
            .select(&hours_sel)
            .next()
            .and_then(|hours| parse_hours_on_record(&collapse_text(hours)));

        let author_id = card.select(&author_sel).next().and_then(|link| {
            link.value()
                .attr("href")
                .and_then(author_from_profile_url)
                .or_else(|| Some(collapse_text(link)).filter(|name| !name.is_empty()))
        });

        reviews.push(RawReview {
            author_id,
            body: Some(card_body(content)),
            recommended,
            timestamp_created,
            playtime_minutes,
        });
    }

    Ok(reviews)
}

/// Decide what one scraped listing page yields.
///
/// Returns `None` when every card was rejected by the verdict filter and the
/// skip budget still allows reading the next listing page.
fn filter_listing_page(
    cards: Vec<RawReview>,
    page: u32,
    first_page: u32,
    review_type: &ReviewType,
) -> Option<ReviewPage> {
    if cards.is_empty() {
        return Some(ReviewPage::default());
    }

    let reviews: Vec<RawReview> = cards
        .into_iter()
        .filter(|r| review_type.accepts(r.recommended.unwrap_or(false)))
        .collect();

    if reviews.is_empty() && page - first_page + 1 < MAX_FILTERED_PAGES {
        return None;
    }
    if reviews.is_empty() {
        info!(
            "No {} reviews in {} consecutive listing pages, stopping",
            review_type, MAX_FILTERED_PAGES
        );
    }

    Some(ReviewPage {
        reviews,
        next_cursor: Some((page + 1).to_string()),
    })
}

#[async_trait]
impl ReviewSource for CommunityReviewScraper {
    fn source_name(&self) -> &str {
        "steam-community"
    }

    /// One call may walk several listing pages when the verdict filter empties them
    fn call_timeout(&self, request_timeout: Duration) -> Duration {
        request_timeout * MAX_FILTERED_PAGES + self.page_delay * (MAX_FILTERED_PAGES - 1)
    }

    async fn fetch_page(
        &self,
        source_id: &str,
        filters: &ReviewFilters,
        _page_size: u32,
        cursor: &str,
    ) -> Result<ReviewPage, SourceError> {
        let first_page = parse_page_cursor(cursor)?;
        let current_year = Utc::now().year();
        let mut page = first_page;

        loop {
            let html = self.fetch_listing(source_id, &filters.language, page).await?;
            let cards = parse_review_cards(&html, current_year)?;

            debug!(
                "Steam community listing: app={}, page={}, cards_on_page={}",
                source_id,
                page,
                cards.len()
            );

            if let Some(result) = filter_listing_page(cards, page, first_page, &filters.review_type) {
                return Ok(result);
            }

            page += 1;
            sleep(self.page_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
    <html><body>
      <div class="apphub_Card modalContentLink interactable">
        <div class="apphub_CardContentMain">
          <div class="apphub_UserReviewCardContent">
            <div class="vote_header">
              <div class="title">Recommended</div>
              <div class="hours">1,234.5 hrs on record</div>
            </div>
            <div class="apphub_CardTextContent">
              <div class="date_posted">Posted: 3 March, 2023</div>
              Fantastic co-op.<br>Bring friends.
            </div>
          </div>
        </div>
        <div class="apphub_CardContentAuthorBlock">
          <div class="apphub_CardContentAuthorName">
            <a href="https://steamcommunity.com/profiles/76561197960287930/">Rabscuttle</a>
          </div>
        </div>
      </div>
      <div class="apphub_Card">
        <div class="title">Not Recommended</div>
        <div class="hours">0.4 hrs on record</div>
        <div class="apphub_CardTextContent">
          <div class="date_posted">Posted: June 9</div>
          Refunded.
        </div>
        <div class="apphub_CardContentAuthorName">
          <a href="https://steamcommunity.com/id/vanityname/">Someone</a>
        </div>
      </div>
    </body></html>"#;

    #[test]
    fn test_parse_review_cards() {
        let reviews = parse_review_cards(LISTING, 2024).unwrap();
        assert_eq!(reviews.len(), 2);

        let first = &reviews[0];
        assert_eq!(first.author_id.as_deref(), Some("76561197960287930"));
        assert_eq!(first.body.as_deref(), Some("Fantastic co-op.\nBring friends."));
        assert_eq!(first.recommended, Some(true));
        assert_eq!(first.playtime_minutes, Some(74070));
        assert_eq!(first.timestamp_created, Some(1_677_801_600));

        let second = &reviews[1];
        assert_eq!(second.author_id.as_deref(), Some("vanityname"));
        assert_eq!(second.body.as_deref(), Some("Refunded."));
        assert_eq!(second.recommended, Some(false));
        assert_eq!(second.playtime_minutes, Some(24));
        assert_eq!(second.timestamp_created, Some(1_717_891_200));
    }

    #[test]
    fn test_parse_empty_listing() {
        let reviews = parse_review_cards("<html><body><div class=\"apphub_NoMoreContent\"></div></body></html>", 2024).unwrap();
        assert!(reviews.is_empty());
    }

    #[test]
    fn test_parse_posted_date_formats() {
        assert_eq!(parse_posted_date("Posted: March 3, 2023", 2024), Some(1_677_801_600));
        assert_eq!(parse_posted_date("Posted: 3 March, 2023", 2024), Some(1_677_801_600));
        assert_eq!(parse_posted_date("Posted: garbage", 2024), None);
    }

    #[test]
    fn test_parse_hours_on_record() {
        assert_eq!(parse_hours_on_record("12.3 hrs on record"), Some(738));
        assert_eq!(parse_hours_on_record("1,000 hrs on record"), Some(60000));
        assert_eq!(parse_hours_on_record("hrs"), None);
    }

    #[test]
    fn test_author_from_profile_url() {
        assert_eq!(
            author_from_profile_url("https://steamcommunity.com/profiles/76561197960287930/"),
            Some("76561197960287930".to_string())
        );
        assert_eq!(author_from_profile_url("https://steamcommunity.com/id/gaben"), Some("gaben".to_string()));
        assert_eq!(author_from_profile_url("https://example.com/"), None);
    }

    #[test]
    fn test_parse_page_cursor() {
        assert_eq!(parse_page_cursor("*").unwrap(), 1);
        assert_eq!(parse_page_cursor("7").unwrap(), 7);
        assert!(parse_page_cursor("0").is_err());
        assert!(parse_page_cursor("AoJw").is_err());
    }

    fn verdict_cards(verdicts: &[bool]) -> Vec<RawReview> {
        verdicts
            .iter()
            .enumerate()
            .map(|(i, recommended)| RawReview {
                author_id: Some(format!("author-{}", i)),
                body: Some("text".to_string()),
                recommended: Some(*recommended),
                ..RawReview::default()
            })
            .collect()
    }

    #[test]
    fn test_filtered_out_page_moves_on() {
        let cards = verdict_cards(&[true, true, true]);
        assert!(filter_listing_page(cards, 1, 1, &ReviewType::Negative).is_none());
    }

    #[test]
    fn test_surviving_reviews_return_with_next_page() {
        let cards = verdict_cards(&[true, false, true, false]);
        let page = filter_listing_page(cards, 3, 2, &ReviewType::Negative).unwrap();

        assert_eq!(page.reviews.len(), 2);
        assert!(page.reviews.iter().all(|r| r.recommended == Some(false)));
        assert_eq!(page.next_cursor.as_deref(), Some("4"));
    }

    #[test]
    fn test_exhausted_skip_budget_returns_empty_page() {
        let cards = verdict_cards(&[true, true]);
        let last = 1 + MAX_FILTERED_PAGES - 1;
        let page = filter_listing_page(cards, last, 1, &ReviewType::Negative).unwrap();

        assert!(page.is_empty());
    }

    #[test]
    fn test_listing_without_cards_is_the_end() {
        let page = filter_listing_page(Vec::new(), 4, 1, &ReviewType::All).unwrap();
        assert!(page.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_unfiltered_page_keeps_every_card() {
        let page = filter_listing_page(verdict_cards(&[true, false]), 1, 1, &ReviewType::All).unwrap();
        assert_eq!(page.reviews.len(), 2);
        assert_eq!(page.next_cursor.as_deref(), Some("2"));
    }

    #[test]
    fn test_call_timeout_covers_skipped_pages() {
        let scraper = CommunityReviewScraper::with_client(Client::new(), Duration::from_millis(250));
        let timeout = scraper.call_timeout(Duration::from_secs(15));
        assert_eq!(timeout, Duration::from_secs(75) + Duration::from_millis(1000));
    }
}
