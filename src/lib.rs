//! Extract headline records (title, subtitle, link, lead image) from news
//! pages whose markup uses hashed CSS class names, and export batches of
//! records as a pivoted spreadsheet.

pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod extractors;
pub mod renderers;
pub mod resolver;
pub mod results;
pub mod server;

// Re-export commonly used types for convenience
pub use error::{EmptyBatchError, Error};
pub use renderers::{Extractor, RenderMode};
pub use resolver::resolve;
pub use results::{BatchEntry, ExtractedRecord, NOT_FOUND};
