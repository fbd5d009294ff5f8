//! Local-business directory search
//!
//! This crate wraps the third-party search API the bot draws suggestions from:
//! - **`BusinessDirectory`** - the seam the finder depends on (stubbed in tests)
//! - **`YelpDirectoryClient`** - Yelp Fusion `businesses/search` over HTTPS
//!
//! The client is stateless: one request in, one ordered list of businesses out.
//! An empty result set is reported as `DirectoryError::NoResults`, never as a
//! transport failure.

pub mod client;
mod types;

use async_trait::async_trait;
use happytaps_core::{Business, DirectoryError};

pub use client::YelpDirectoryClient;

#[async_trait]
pub trait BusinessDirectory: Send + Sync {
    async fn search(&self, location: &str) -> Result<Vec<Business>, DirectoryError>;
}
