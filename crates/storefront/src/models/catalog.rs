//! Catalog types: categories, products, and listing filters.

use bazaar_core::{CategoryId, Price, ProductId, ProductSnapshot};
use serde::{Deserialize, Serialize};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A product's category, sent either as a bare ID or as a nested object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(CategoryId),
    Nested(Category),
}

impl CategoryRef {
    #[must_use]
    pub const fn id(&self) -> CategoryId {
        match self {
            Self::Id(id) => *id,
            Self::Nested(category) => category.id,
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
    #[serde(default)]
    pub stock: Option<u32>,
}

const fn in_stock_default() -> bool {
    true
}

impl Product {
    /// Snapshot of the fields a cart line item keeps.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot::from(self)
    }
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            image: product.image.clone(),
        }
    }
}

/// Query filters for the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilters {
    pub category: Option<CategoryId>,
    pub search: Option<String>,
    pub in_stock: Option<bool>,
    /// 1-based page number
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ProductFilters {
    /// The storefront listing: in-stock products, one page at a time.
    #[must_use]
    pub fn storefront_page(page: u32, page_size: u32) -> Self {
        Self {
            in_stock: Some(true),
            page: Some(page.max(1)),
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_category(mut self, category: Option<CategoryId>) -> Self {
        self.category = category;
        self
    }

    /// Filter by a search term. Blank terms are dropped.
    #[must_use]
    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|s| !s.trim().is_empty());
        self
    }

    /// The filters as query parameters, in a stable order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(in_stock) = self.in_stock {
            pairs.push(("in_stock", in_stock.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size", page_size.to_string()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }

        pairs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_api_json() {
        let product: Product = serde_json::from_str(
            r#"{
                "id": 7,
                "name": "Electric kettle",
                "description": "1.7 L",
                "price": "2490.00",
                "image": "https://cdn.example.com/kettle.jpg",
                "category": 2,
                "in_stock": true,
                "stock": 12
            }"#,
        )
        .unwrap();

        assert_eq!(product.id, ProductId::new(7));
        assert_eq!(product.price, Price::from_minor(2_490_00));
        assert_eq!(product.category.as_ref().map(CategoryRef::id), Some(CategoryId::new(2)));
    }

    #[test]
    fn test_product_minimal_json_and_nested_category() {
        let product: Product = serde_json::from_str(
            r#"{"id": 1, "name": "Mug", "price": 350, "category": {"id": 4, "name": "Kitchen"}}"#,
        )
        .unwrap();

        assert!(product.in_stock);
        assert!(product.image.is_none());
        assert_eq!(product.category.unwrap().id(), CategoryId::new(4));
    }

    #[test]
    fn test_product_accepts_null_description() {
        let product: Product = serde_json::from_str(
            r#"{"id": 2, "name": "Teapot", "description": null, "price": "990.00", "image": null}"#,
        )
        .unwrap();

        assert_eq!(product.description, None);
        assert_eq!(product.snapshot().name, "Teapot");
    }

    #[test]
    fn test_snapshot_copies_display_fields() {
        let product = Product {
            id: ProductId::new(3),
            name: "Teapot".to_string(),
            description: None,
            price: Price::from_minor(990_00),
            image: Some("teapot.png".to_string()),
            category: None,
            in_stock: true,
            stock: None,
        };

        let snapshot = product.snapshot();

        assert_eq!(snapshot.product_id, ProductId::new(3));
        assert_eq!(snapshot.name, "Teapot");
        assert_eq!(snapshot.unit_price, Price::from_minor(990_00));
        assert_eq!(snapshot.image.as_deref(), Some("teapot.png"));
    }

    #[test]
    fn test_query_pairs() {
        let filters = ProductFilters::storefront_page(2, 8)
            .with_category(Some(CategoryId::new(5)))
            .with_search(Some("kettle".to_string()));

        assert_eq!(
            filters.query_pairs(),
            vec![
                ("in_stock", "true".to_string()),
                ("page", "2".to_string()),
                ("page_size", "8".to_string()),
                ("category", "5".to_string()),
                ("search", "kettle".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_search_is_dropped() {
        let filters = ProductFilters::default().with_search(Some("   ".to_string()));
        assert!(filters.query_pairs().is_empty());
    }

    #[test]
    fn test_page_zero_becomes_first_page() {
        assert_eq!(ProductFilters::storefront_page(0, 8).page, Some(1));
    }
}
