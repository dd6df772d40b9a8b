pub mod export_format;
pub mod filters;
pub mod page;
pub mod review;

pub use export_format::ExportFormat;
pub use filters::{ReviewFilters, ReviewType};
pub use page::{RawReview, ReviewPage, FIRST_PAGE_CURSOR};
pub use review::{format_timestamp, ReviewEntry, TIMESTAMP_FORMAT};
