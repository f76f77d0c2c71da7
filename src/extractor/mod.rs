pub mod chain;
pub mod http;
pub mod mirror;
pub mod models;
pub mod platforms;
pub mod redirect;
pub mod resolver;
pub mod scrape;
pub mod traits;
pub mod vendor;
pub mod ytdlp;

pub use chain::{FallbackChain, FetchOutcome};
pub use models::{
    CanonicalUrl, ExtractionAttempt, MediaAsset, MediaLocation, Platform, PostReference,
};
pub use resolver::{resolve, resolve_reference};
pub use traits::{AttemptContext, Strategy};
pub use ytdlp::YtDlpStrategy;
