//! Checkout: turning the cart into an order, and cancelling orders.

use bazaar_core::{CartStore, KeyValueStore, OrderStatus};
use thiserror::Error;
use tracing::{info, instrument};

use crate::api::{ApiClient, ApiError};
use crate::models::{NewOrder, Order, ShippingError, ShippingInfo};
use crate::services::auth::AuthSession;

/// Errors that can occur while placing or cancelling an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("sign in to place an order")]
    NotAuthenticated,

    #[error("the cart is empty")]
    EmptyCart,

    #[error("invalid shipping details: {0}")]
    InvalidShipping(#[from] ShippingError),

    /// Only pending orders can be cancelled.
    #[error("an order that is {0} cannot be cancelled")]
    NotCancellable(OrderStatus),

    #[error("api error: {0}")]
    Api(#[from] ApiError),
}

/// Submit the cart as an order for the signed-in user.
///
/// The cart is cleared only once the API has accepted the order; on any
/// error it is left as it was.
///
/// # Errors
///
/// Returns `CheckoutError::NotAuthenticated`, `CheckoutError::EmptyCart` or
/// `CheckoutError::InvalidShipping` before contacting the API, and
/// `CheckoutError::Api` if the API rejects the order.
#[instrument(skip_all, fields(lines = cart.items().len(), total = %cart.total_price()))]
pub async fn place_order<A, C>(
    session: &AuthSession<A>,
    cart: &mut CartStore<C>,
    shipping: ShippingInfo,
) -> Result<Order, CheckoutError>
where
    A: KeyValueStore,
    C: KeyValueStore,
{
    if !session.is_authenticated() {
        return Err(CheckoutError::NotAuthenticated);
    }
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    shipping.validate()?;

    let order = NewOrder::from_cart(cart.items(), shipping);
    let placed = session.api().submit_order(&order).await?;

    cart.clear();
    info!(order_id = %placed.id, "Order placed");

    Ok(placed)
}

/// Cancel a pending order and return its updated state.
///
/// # Errors
///
/// Returns `CheckoutError::NotCancellable` if the order is past `pending`,
/// or `CheckoutError::Api` if either request fails.
#[instrument(skip_all, fields(order_id = %order.id, status = %order.status))]
pub async fn cancel_order(api: &ApiClient, order: &Order) -> Result<Order, CheckoutError> {
    if !order.status.is_cancellable() {
        return Err(CheckoutError::NotCancellable(order.status));
    }

    api.update_order_status(order.id, OrderStatus::Cancelled)
        .await?;
    let order = api.fetch_order(order.id).await?;

    info!("Order cancelled");
    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{MemoryStore, Price, ProductId, ProductSnapshot};
    use secrecy::SecretString;

    use super::*;
    use crate::api::CredentialSlot;
    use crate::config::ApiConfig;

    // Nothing listens here; every case below fails before any request.
    fn offline_session() -> AuthSession<MemoryStore> {
        let config = ApiConfig::for_base_url("http://127.0.0.1:9/").unwrap();
        let api = ApiClient::new(&config, CredentialSlot::new()).unwrap();
        AuthSession::anonymous(api, MemoryStore::new())
    }

    fn cart_with_item() -> CartStore<MemoryStore> {
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add_item(
            ProductSnapshot {
                product_id: ProductId::new(1),
                name: "A".to_string(),
                unit_price: Price::from_minor(100_00),
                image: None,
            },
            1,
        );
        cart
    }

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            full_name: "Anna Petrova".to_string(),
            email: "anna@example.com".to_string(),
            phone: "+7 900".to_string(),
            address: "Lenina 1".to_string(),
            city: "Kazan".to_string(),
            ..ShippingInfo::default()
        }
    }

    #[tokio::test]
    async fn test_refuses_anonymous_session() {
        let session = offline_session();
        let mut cart = cart_with_item();

        let err = place_order(&session, &mut cart, shipping()).await.unwrap_err();

        assert!(matches!(err, CheckoutError::NotAuthenticated));
        assert_eq!(cart.total_item_count(), 1);
    }

    #[tokio::test]
    async fn test_refuses_empty_cart() {
        let session = offline_session();
        session
            .api()
            .credential()
            .set(SecretString::from("abc123".to_string()));
        let mut cart = CartStore::open(MemoryStore::new());

        let err = place_order(&session, &mut cart, shipping()).await.unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn test_refuses_invalid_shipping_and_keeps_cart() {
        let session = offline_session();
        session
            .api()
            .credential()
            .set(SecretString::from("abc123".to_string()));
        let mut cart = cart_with_item();
        let info = ShippingInfo {
            city: String::new(),
            ..shipping()
        };

        let err = place_order(&session, &mut cart, info).await.unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::InvalidShipping(ShippingError::Missing("city"))
        ));
        assert_eq!(cart.total_item_count(), 1);
    }

    #[tokio::test]
    async fn test_only_pending_orders_cancel() {
        let session = offline_session();
        let order: Order = serde_json::from_str(
            r#"{"id": 3, "status": "shipped", "created_at": "2024-05-01T12:30:00Z", "total_price": "100.00"}"#,
        )
        .unwrap();

        let err = cancel_order(session.api(), &order).await.unwrap_err();

        assert!(matches!(err, CheckoutError::NotCancellable(OrderStatus::Shipped)));
    }
}
