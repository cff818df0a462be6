pub mod coincap;

use crate::error::Result;
use crate::types::{Asset, AssetResponse};
use async_trait::async_trait;

/// Number of assets requested per listing page.
pub const PAGE_SIZE: u64 = 10;

#[async_trait]
pub trait AssetSource: Send + Sync {
    fn name(&self) -> &str;

    /// One page of the asset list starting at `offset`.
    async fn list(&self, limit: u64, offset: u64) -> Result<Vec<Asset>>;

    /// A single asset, or the error message the upstream reported for it.
    async fn detail(&self, id: &str) -> Result<AssetResponse>;
}
