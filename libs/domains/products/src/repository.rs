use async_trait::async_trait;

use crate::error::ProductResult;
use crate::models::{Product, ProductFilter};

/// Repository trait for Product persistence
///
/// Every method maps to a single store operation; business rules live in
/// [`ProductService`](crate::service::ProductService).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new product. Fails with `DuplicateId` if the id is taken.
    async fn insert(&self, product: Product) -> ProductResult<Product>;

    /// Every product in the collection
    async fn find_all(&self) -> ProductResult<Vec<Product>>;

    /// Products matching the filter, paged by its limit/offset
    async fn find(&self, filter: ProductFilter) -> ProductResult<Vec<Product>>;

    async fn find_by_id(&self, id: &str) -> ProductResult<Option<Product>>;

    /// Replace the product with the same id, inserting it if absent
    async fn save(&self, product: Product) -> ProductResult<Product>;

    /// Replace the product with the same id only if it still exists.
    /// Returns false when no document matched.
    async fn replace(&self, product: Product) -> ProductResult<bool>;

    /// Returns true if a document was removed
    async fn delete_by_id(&self, id: &str) -> ProductResult<bool>;

    /// Count products matching the filter; paging fields are ignored
    async fn count(&self, filter: ProductFilter) -> ProductResult<u64>;
}
