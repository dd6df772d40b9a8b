pub mod catalog;
pub mod error;
pub mod factory;
pub mod steam;
pub mod traits;

pub use catalog::{CatalogEntry, GameCatalog};
pub use error::SourceError;
pub use factory::{create_identity_source, create_review_source};
pub use steam::{fetch_app_name, CommunityReviewScraper, SteamPlayerSummaries, SteamReviewApi};
pub use traits::{IdentitySource, ReviewSource};
