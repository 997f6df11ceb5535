//! Catalog item types.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product as published in the remote catalog.
///
/// This is the shape returned by `GET /items/`. The cart copies these fields
/// into its line items so a cart remains displayable even if the catalog
/// cache has expired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique product key.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Short marketing description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price.
    pub price: Price,
    /// Product image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_src: Option<String>,
    /// Catalog category (e.g., "Featured").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_item_optional_fields_default() {
        let json = r#"{"id":1,"name":"Mug","price":{"amount":"9.99","currency_code":"USD"}}"#;
        let item: CatalogItem = serde_json::from_str(json).expect("deserialize");
        assert_eq!(item.id, ProductId::new(1));
        assert!(item.description.is_none());
        assert!(item.image_src.is_none());
        assert!(item.category.is_none());
    }
}
