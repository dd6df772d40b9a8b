pub mod collector;
pub mod error;
pub mod export;
pub mod progress;
pub mod resolver;

pub use collector::{CollectorOptions, ReviewCollector};
pub use error::{CollectError, ExportError};
pub use export::{export, write_export, ExportContext, ExportRow};
pub use progress::{ProgressSink, ProgressTracker};
pub use resolver::{IdentityResolver, ResolverOptions};
