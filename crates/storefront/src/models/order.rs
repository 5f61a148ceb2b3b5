//! Order types.

use bazaar_core::{CartLineItem, Email, EmailError, OrderId, OrderItemId, OrderStatus, Price, ProductId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::user::User;

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    /// Human-readable status, localized by the API.
    #[serde(default)]
    pub status_display: Option<String>,
    pub created_at: DateTime<Utc>,
    pub total_price: Price,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// The status label to show: the API's display text when present.
    #[must_use]
    pub fn status_label(&self) -> &str {
        self.status_display
            .as_deref()
            .unwrap_or_else(|| self.status.as_str())
    }
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product: OrderProduct,
    pub quantity: u32,
    /// Unit price charged at order time.
    pub price: Price,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.line_total(self.quantity)
    }
}

/// Product summary nested in an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Delivery details entered at checkout.
///
/// Empty optional fields are sent as empty strings, as the form would.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub notes: String,
}

/// Why shipping details were rejected before submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShippingError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

impl ShippingInfo {
    /// Details prefilled from the signed-in user's account.
    #[must_use]
    pub fn prefill(user: &User) -> Self {
        let profile = user.profile.clone().unwrap_or_default();

        Self {
            full_name: user.full_name(),
            email: user.email.clone(),
            phone: profile.phone_number.unwrap_or_default(),
            address: profile.address.unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Check required fields and the email address.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in form order.
    pub fn validate(&self) -> Result<(), ShippingError> {
        let required = [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ShippingError::Missing(field));
            }
        }

        Email::parse(&self.email)?;

        Ok(())
    }
}

/// Request body for `orders/orders/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    #[serde(flatten)]
    pub shipping: ShippingInfo,
    pub total_price: Price,
    pub items: Vec<NewOrderItem>,
}

/// One requested line in a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl NewOrder {
    /// Build an order request from cart lines. The total is the sum of the
    /// cart's line totals.
    #[must_use]
    pub fn from_cart(items: &[CartLineItem], shipping: ShippingInfo) -> Self {
        Self {
            shipping,
            total_price: items.iter().map(CartLineItem::line_total).sum(),
            items: items
                .iter()
                .map(|item| NewOrderItem {
                    product_id: item.product_id(),
                    quantity: item.quantity(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{CartStore, MemoryStore, ProductSnapshot};

    use super::*;
    use crate::models::user::Profile;

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            full_name: "Anna Petrova".to_string(),
            email: "anna@example.com".to_string(),
            phone: "+7 900 000-00-00".to_string(),
            address: "Lenina 1".to_string(),
            city: "Kazan".to_string(),
            ..ShippingInfo::default()
        }
    }

    #[test]
    fn test_order_from_api_json() {
        let order: Order = serde_json::from_str(
            r#"{
                "id": 12,
                "status": "pending",
                "status_display": "В обработке",
                "created_at": "2024-05-01T12:30:00.123456+03:00",
                "total_price": "500.00",
                "full_name": "Anna Petrova",
                "items": [
                    {"id": 1, "product": {"id": 1, "name": "A", "image": null}, "quantity": 5, "price": "100.00"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(order.id, OrderId::new(12));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.status_label(), "В обработке");
        assert_eq!(order.created_at.to_rfc3339(), "2024-05-01T09:30:00.123456+00:00");
        assert_eq!(order.items.first().unwrap().line_total(), Price::from_minor(500_00));
        assert_eq!(order.city, "");
    }

    #[test]
    fn test_order_accepts_null_optional_fields() {
        let order: Order = serde_json::from_str(
            r#"{
                "id": 3,
                "status": "delivered",
                "created_at": "2024-05-01T12:30:00Z",
                "total_price": "90.00",
                "postal_code": null,
                "notes": null,
                "status_display": null
            }"#,
        )
        .unwrap();

        assert_eq!(order.postal_code, None);
        assert_eq!(order.notes, None);
        assert_eq!(order.status_label(), "delivered");
    }

    #[test]
    fn test_status_label_falls_back_to_wire_name() {
        let order: Order = serde_json::from_str(
            r#"{"id": 1, "status": "shipped", "created_at": "2024-05-01T12:30:00Z", "total_price": 1}"#,
        )
        .unwrap();

        assert_eq!(order.status_label(), "shipped");
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        assert_eq!(shipping().validate(), Ok(()));

        let info = ShippingInfo {
            phone: "  ".to_string(),
            city: String::new(),
            ..shipping()
        };
        assert_eq!(info.validate(), Err(ShippingError::Missing("phone")));
    }

    #[test]
    fn test_validate_checks_email() {
        let info = ShippingInfo {
            email: "anna at example".to_string(),
            ..shipping()
        };
        assert!(matches!(info.validate(), Err(ShippingError::InvalidEmail(_))));
    }

    #[test]
    fn test_prefill_from_user() {
        let user = User {
            id: bazaar_core::UserId::new(1),
            username: "anna".to_string(),
            email: "anna@example.com".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Petrova".to_string(),
            profile: Some(Profile {
                phone_number: Some("+7 900".to_string()),
                address: Some("Lenina 1".to_string()),
                profile_picture: None,
            }),
        };

        let info = ShippingInfo::prefill(&user);

        assert_eq!(info.full_name, "Anna Petrova");
        assert_eq!(info.phone, "+7 900");
        assert_eq!(info.address, "Lenina 1");
        assert_eq!(info.city, "");
    }

    #[test]
    fn test_new_order_from_cart() {
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add_item(
            ProductSnapshot {
                product_id: ProductId::new(1),
                name: "A".to_string(),
                unit_price: Price::from_minor(100_00),
                image: None,
            },
            2,
        );

        let order = NewOrder::from_cart(cart.items(), shipping());
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["full_name"], "Anna Petrova");
        assert_eq!(json["postal_code"], "");
        assert_eq!(json["total_price"], serde_json::json!(200.0));
        assert_eq!(json["items"], serde_json::json!([{"product_id": 1, "quantity": 2}]));
    }
}
