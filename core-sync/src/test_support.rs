//! Catalog mocks shared by the unit tests.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::{
    CollectionHandle, DestinationCatalog, ItemHandle, Listing, SourceCatalog,
};
use bytes::Bytes;
use mockall::mock;

mock! {
    pub Source {}

    #[async_trait]
    impl SourceCatalog for Source {
        async fn list(&self, path: &str) -> Result<Listing>;
        async fn fetch(&self, path: &str) -> Result<Bytes>;
    }
}

mock! {
    pub Destination {}

    #[async_trait]
    impl DestinationCatalog for Destination {
        async fn list_collections(&self) -> Result<Listing>;
        async fn list_items(&self, collection: &CollectionHandle) -> Result<Listing>;
        async fn upload(&self, data: Bytes, name: &str) -> Result<ItemHandle>;
        async fn create_collection(&self, name: &str, seed: &ItemHandle) -> Result<CollectionHandle>;
        async fn attach_item(&self, collection: &CollectionHandle, item: &ItemHandle) -> Result<()>;
    }
}
