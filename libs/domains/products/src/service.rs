//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::repository::ProductRepository;

/// Validation, id assignment and not-found mapping on top of a repository.
///
/// Input is validated here as well as in the HTTP extractor so non-HTTP
/// callers get the same guarantees.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a product; the id is generated unless the client chose one.
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<Product> {
        input.validate()?;
        self.repository.insert(Product::new(input)).await
    }

    /// List products; an empty filter returns the whole collection.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        filter.validate()?;
        if filter.is_empty() {
            return self.repository.find_all().await;
        }
        self.repository.find(filter).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &str) -> ProductResult<Product> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    /// Overwrite the given fields of an existing product.
    ///
    /// The write never recreates a product deleted after the read.
    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: &str, input: UpdateProduct) -> ProductResult<Product> {
        input.validate()?;

        let mut product = self.get_product(id).await?;
        product.apply_update(input);

        if !self.repository.replace(product.clone()).await? {
            return Err(ProductError::NotFound(id.to_string()));
        }
        Ok(product)
    }

    /// Delete by id. Deleting a missing product is not an error.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> ProductResult<()> {
        let deleted = self.repository.delete_by_id(id).await?;
        if !deleted {
            tracing::debug!(product_id = %id, "Delete of unknown product ignored");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn count_products(&self, filter: ProductFilter) -> ProductResult<u64> {
        self.repository.count(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockProductRepository;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    fn widget() -> Product {
        Product {
            id: "widget-1".into(),
            name: "Widget".into(),
            description: "A widget".into(),
            price: dec!(100),
        }
    }

    fn create_input(name: &str) -> CreateProduct {
        CreateProduct {
            id: None,
            name: name.into(),
            description: String::new(),
            price: dec!(1200),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_inserts() {
        let mut repo = MockProductRepository::new();
        repo.expect_insert()
            .withf(|p| !p.id.is_empty() && p.name == "Apple iPad 2023")
            .times(1)
            .returning(|p| Ok(p));

        let service = ProductService::new(repo);
        let product = service
            .create_product(create_input("Apple iPad 2023"))
            .await
            .unwrap();

        assert_eq!(product.price, dec!(1200));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input_without_touching_store() {
        let mut repo = MockProductRepository::new();
        repo.expect_insert().never();

        let service = ProductService::new(repo);
        let result = service.create_product(create_input("")).await;

        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_propagates_duplicate_id() {
        let mut repo = MockProductRepository::new();
        repo.expect_insert()
            .returning(|p| Err(ProductError::DuplicateId(p.id)));

        let service = ProductService::new(repo);
        let mut input = create_input("Widget");
        input.id = Some("widget-1".into());

        let result = service.create_product(input).await;
        assert!(matches!(result, Err(ProductError::DuplicateId(id)) if id == "widget-1"));
    }

    #[tokio::test]
    async fn test_list_without_filter_uses_find_all() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_all().times(1).returning(|| Ok(vec![widget()]));
        repo.expect_find().never();

        let service = ProductService::new(repo);
        let products = service.list_products(ProductFilter::default()).await.unwrap();

        assert_eq!(products, vec![widget()]);
    }

    #[tokio::test]
    async fn test_list_with_filter_uses_find() {
        let mut repo = MockProductRepository::new();
        repo.expect_find()
            .with(eq(ProductFilter::by_name("Widget")))
            .times(1)
            .returning(|_| Ok(vec![widget()]));

        let service = ProductService::new(repo);
        let products = service
            .list_products(ProductFilter::by_name("Widget"))
            .await
            .unwrap();

        assert_eq!(products.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_product_is_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = ProductService::new(repo);
        let result = service.get_product("missing").await;

        assert!(matches!(result, Err(ProductError::NotFound(id)) if id == "missing"));
    }

    #[tokio::test]
    async fn test_update_changes_price_and_keeps_other_fields() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id()
            .withf(|id| id == "widget-1")
            .returning(|_| Ok(Some(widget())));
        repo.expect_replace()
            .withf(|p| p.id == "widget-1" && p.name == "Widget" && p.price == dec!(200))
            .times(1)
            .returning(|_| Ok(true));
        repo.expect_save().never();

        let service = ProductService::new(repo);
        let update = UpdateProduct {
            price: Some(dec!(200)),
            ..Default::default()
        };
        let product = service.update_product("widget-1", update).await.unwrap();

        assert_eq!(product.description, "A widget");
    }

    #[tokio::test]
    async fn test_update_missing_product_does_not_save() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_replace().never();

        let service = ProductService::new(repo);
        let result = service
            .update_product("missing", UpdateProduct::default())
            .await;

        assert!(matches!(result, Err(ProductError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_of_product_deleted_after_read_is_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(Some(widget())));
        repo.expect_replace().times(1).returning(|_| Ok(false));
        repo.expect_save().never();

        let service = ProductService::new(repo);
        let update = UpdateProduct {
            price: Some(dec!(200)),
            ..Default::default()
        };
        let result = service.update_product("widget-1", update).await;

        assert!(matches!(result, Err(ProductError::NotFound(id)) if id == "widget-1"));
    }

    #[tokio::test]
    async fn test_list_rejects_zero_limit_without_touching_store() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().never();
        repo.expect_find_all().never();

        let service = ProductService::new(repo);
        let filter = ProductFilter {
            limit: Some(0),
            ..Default::default()
        };
        let result = service.list_products(filter).await;

        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_product_is_ok() {
        let mut repo = MockProductRepository::new();
        repo.expect_delete_by_id().times(1).returning(|_| Ok(false));

        let service = ProductService::new(repo);
        assert!(service.delete_product("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut repo = MockProductRepository::new();
        repo.expect_count()
            .returning(|_| Err(ProductError::Database("connection refused".into())));

        let service = ProductService::new(repo);
        let result = service.count_products(ProductFilter::default()).await;

        assert!(matches!(result, Err(ProductError::Database(_))));
    }
}
