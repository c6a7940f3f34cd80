//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{FindOptions, IndexOptions},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ProductError, ProductResult, is_duplicate_key};
use crate::models::{Product, ProductFilter};
use crate::repository::ProductRepository;

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "products";

/// Stored shape of a product.
///
/// The price is kept as its decimal string so no precision is lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
}

impl From<Product> for ProductDocument {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
        }
    }
}

impl From<ProductDocument> for Product {
    fn from(d: ProductDocument) -> Self {
        Self {
            id: d.id,
            name: d.name,
            description: d.description,
            price: d.price,
        }
    }
}

/// MongoDB implementation of the ProductRepository
#[derive(Clone)]
pub struct MongoProductRepository {
    collection: Collection<ProductDocument>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, DEFAULT_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<ProductDocument>(collection_name);
        Self { collection }
    }

    /// Create the secondary index on `name` used by name filters.
    /// `_id` is indexed and unique already.
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().name("idx_name".to_string()).build())
            .build();

        self.collection.create_index(index).await?;
        tracing::info!(
            collection = self.collection.name(),
            "Product indexes created successfully"
        );
        Ok(())
    }

    /// Underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<ProductDocument> {
        &self.collection
    }

    fn build_filter(filter: &ProductFilter) -> Document {
        let mut doc = doc! {};

        if let Some(ref id) = filter.id {
            doc.insert("_id", id.as_str());
        }

        if let Some(ref name) = filter.name {
            doc.insert("name", name.as_str());
        }

        doc
    }

    async fn find_with(&self, filter: Document, options: FindOptions) -> ProductResult<Vec<Product>> {
        let cursor = self.collection.find(filter).with_options(options).await?;
        let documents: Vec<ProductDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(Product::from).collect())
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn insert(&self, product: Product) -> ProductResult<Product> {
        let id = product.id.clone();
        let document = ProductDocument::from(product);

        match self.collection.insert_one(&document).await {
            Ok(_) => {
                tracing::info!("Product created successfully");
                Ok(document.into())
            }
            Err(e) if is_duplicate_key(&e) => Err(ProductError::DuplicateId(id)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> ProductResult<Vec<Product>> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        self.find_with(doc! {}, options).await
    }

    #[instrument(skip(self))]
    async fn find(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let mut options = FindOptions::default();
        options.limit = filter.limit.map(i64::from);
        options.skip = filter.offset.map(u64::from);
        options.sort = Some(doc! { "_id": 1 });

        self.find_with(Self::build_filter(&filter), options).await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> ProductResult<Option<Product>> {
        let document = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(document.map(Product::from))
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn save(&self, product: Product) -> ProductResult<Product> {
        let document = ProductDocument::from(product);

        let result = self
            .collection
            .replace_one(doc! { "_id": document.id.as_str() }, &document)
            .upsert(true)
            .await?;

        tracing::info!(
            matched = result.matched_count,
            upserted = result.upserted_id.is_some(),
            "Product saved"
        );
        Ok(document.into())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn replace(&self, product: Product) -> ProductResult<bool> {
        let document = ProductDocument::from(product);

        let result = self
            .collection
            .replace_one(doc! { "_id": document.id.as_str() }, &document)
            .await?;

        if result.matched_count == 0 {
            tracing::debug!("Nothing to replace");
            return Ok(false);
        }

        tracing::info!("Product replaced");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> ProductResult<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;

        if result.deleted_count == 0 {
            tracing::debug!(product_id = %id, "Nothing to delete");
            return Ok(false);
        }

        tracing::info!(product_id = %id, "Product deleted successfully");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: ProductFilter) -> ProductResult<u64> {
        let count = self
            .collection
            .count_documents(Self::build_filter(&filter))
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;
    use rust_decimal_macros::dec;

    #[test]
    fn test_build_filter_empty() {
        let filter = MongoProductRepository::build_filter(&ProductFilter::default());
        assert!(filter.is_empty());
    }

    #[test]
    fn test_build_filter_maps_id_to_underscore_id() {
        let filter = ProductFilter {
            id: Some("p-1".into()),
            name: Some("Widget".into()),
            limit: Some(10),
            offset: Some(5),
        };
        let doc = MongoProductRepository::build_filter(&filter);

        assert_eq!(doc, doc! { "_id": "p-1", "name": "Widget" });
    }

    #[test]
    fn test_document_stores_price_as_exact_string() {
        let document = ProductDocument::from(Product {
            id: "p-1".into(),
            name: "Widget".into(),
            description: String::new(),
            price: dec!(19.99),
        });

        let stored = bson::to_document(&document).unwrap();
        assert_eq!(stored.get_str("_id").unwrap(), "p-1");
        assert_eq!(stored.get_str("price").unwrap(), "19.99");

        let back: ProductDocument = bson::from_document(stored).unwrap();
        assert_eq!(back, document);
    }
}
