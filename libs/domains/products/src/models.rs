use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier (stored as `_id`)
    #[schema(example = "3f0c8a52-6a6b-4d43-9f44-2d7b0b1ce2aa")]
    pub id: String,
    #[schema(example = "Apple iPad 2023")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "Apple iPad version 2023")]
    pub description: String,
    /// Unit price, never negative
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 1200)]
    pub price: Decimal,
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    /// Optional client-chosen id; a UUID v4 is generated when absent
    #[validate(length(min = 1, max = 200), custom(function = "validate_id"))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = f64, minimum = 0)]
    pub price: Decimal,
}

/// DTO for updating an existing product
///
/// Absent fields keep their stored value. An `id` in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<f64>, minimum = 0)]
    pub price: Option<Decimal>,
}

/// Equality filters for listing and counting products
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Match a single id
    pub id: Option<String>,
    /// Exact name match
    pub name: Option<String>,
    /// Maximum number of results; all matches when absent
    #[validate(range(min = 1))]
    pub limit: Option<u32>,
    /// Number of results to skip
    pub offset: Option<u32>,
}

/// Path segments routed ahead of `/{id}`; a product with one of these ids
/// could never be addressed.
pub const RESERVED_IDS: &[&str] = &["count"];

fn validate_id(id: &str) -> Result<(), ValidationError> {
    if RESERVED_IDS.contains(&id) {
        let mut err = ValidationError::new("reserved");
        err.message = Some(format!("'{}' is reserved and cannot be used as an id", id).into());
        return Err(err);
    }
    Ok(())
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("price must not be negative".into());
        return Err(err);
    }
    Ok(())
}

impl Product {
    /// Create a product from the DTO, generating an id when none was given
    pub fn new(input: CreateProduct) -> Self {
        Self {
            id: input.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: input.name,
            description: input.description,
            price: input.price,
        }
    }

    /// Overwrite the fields present in `update`; the id never changes
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
    }
}

impl ProductFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// No criteria and no paging
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn create(name: &str, price: Decimal) -> CreateProduct {
        CreateProduct {
            id: None,
            name: name.to_string(),
            description: String::new(),
            price,
        }
    }

    #[test]
    fn test_new_generates_uuid_when_id_absent() {
        let product = Product::new(create("Widget", dec!(100)));
        assert!(Uuid::parse_str(&product.id).is_ok());
    }

    #[test]
    fn test_new_keeps_client_id() {
        let mut input = create("Widget", dec!(100));
        input.id = Some("widget-1".into());
        assert_eq!(Product::new(input).id, "widget-1");
    }

    #[test]
    fn test_apply_update_overwrites_present_fields_only() {
        let mut product = Product::new(create("Widget", dec!(100)));
        let id = product.id.clone();

        product.apply_update(UpdateProduct {
            price: Some(dec!(200)),
            ..Default::default()
        });

        assert_eq!(product.id, id);
        assert_eq!(product.name, "Widget");
        assert_eq!(product.price, dec!(200));
    }

    #[test]
    fn test_validation_rejects_empty_name_and_negative_price() {
        assert!(create("Widget", dec!(0)).validate().is_ok());

        let errors = create("", dec!(1)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));

        let errors = create("Widget", dec!(-0.01)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));

        let update = UpdateProduct {
            price: Some(dec!(-5)),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_price_is_a_json_number() {
        let product = Product {
            id: "p-1".into(),
            name: "Apple iPad 2023".into(),
            description: "Apple iPad version 2023".into(),
            price: dec!(1200),
        };
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["price"].as_f64(), Some(1200.0));

        let input: CreateProduct =
            serde_json::from_value(json!({"name": "Widget", "price": 19.99})).unwrap();
        assert_eq!(input.price, dec!(19.99));
        assert_eq!(input.description, "");
    }

    #[test]
    fn test_update_ignores_body_id() {
        let update: UpdateProduct =
            serde_json::from_value(json!({"id": "other", "price": 200})).unwrap();
        assert_eq!(update.price, Some(dec!(200)));
        assert!(update.name.is_none());
    }

    #[test]
    fn test_reserved_id_is_rejected() {
        let mut input = create("Widget", dec!(1));
        input.id = Some("count".into());

        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("id"));

        input.id = Some("counter".into());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_filter_rejects_zero_limit() {
        let filter = ProductFilter {
            limit: Some(0),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
        assert!(ProductFilter { limit: Some(1), ..Default::default() }.validate().is_ok());
        assert!(ProductFilter::default().validate().is_ok());
    }

    #[test]
    fn test_filter_limit_is_unsigned() {
        let result: Result<ProductFilter, _> = serde_json::from_value(json!({"limit": -2}));
        assert!(result.is_err());
    }

    #[test]
    fn test_filter_is_empty() {
        assert!(ProductFilter::default().is_empty());
        assert!(!ProductFilter::by_name("Widget").is_empty());
    }
}
