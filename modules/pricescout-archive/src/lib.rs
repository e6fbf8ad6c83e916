pub mod archive;
pub mod error;
pub mod extractor;
pub mod fetchers;
pub mod resolver;

pub use archive::{Archive, ArchiveConfig};
pub use error::{ArchiveError, Result};
pub use extractor::ContentExtractor;
pub use fetchers::{
    BrowserlessEngine, ChromeEngine, FetchOutcome, LightweightFetcher, RenderEngine,
    RenderFetcher, RenderedPage,
};
pub use resolver::{bare_domain, resolve_search_url, resolve_target};
