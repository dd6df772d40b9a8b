pub mod api;
pub mod client;
pub mod community;
pub mod identity;
pub mod store;

pub use api::SteamReviewApi;
pub use client::create_steam_client;
pub use community::CommunityReviewScraper;
pub use identity::SteamPlayerSummaries;
pub use store::fetch_app_name;
