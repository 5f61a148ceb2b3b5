//! Order history commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar orders list
//! bazaar orders show 12
//! bazaar orders cancel 12
//! ```

use std::io::Write;

use bazaar_core::{KeyValueStore, OrderId};
use bazaar_storefront::models::Order;
use bazaar_storefront::services::checkout;
use bazaar_storefront::state::AppState;

use super::CliError;

pub async fn list<S: KeyValueStore + Clone>(
    state: &AppState<S>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let orders = state.api().fetch_orders().await?;

    if orders.is_empty() {
        writeln!(out, "No orders yet.")?;
    }
    for order in &orders {
        writeln!(
            out,
            "#{:<6} {}  {:<12} {:>10}",
            order.id.as_i64(),
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.status_label(),
            order.total_price.to_string()
        )?;
    }

    Ok(())
}

pub async fn show<S: KeyValueStore + Clone>(
    state: &AppState<S>,
    out: &mut impl Write,
    id: OrderId,
) -> Result<(), CliError> {
    let order = state.api().fetch_order(id).await?;
    write_order(out, &order)?;
    Ok(())
}

/// Cancel a pending order and show the result.
pub async fn cancel<S: KeyValueStore + Clone>(
    state: &AppState<S>,
    out: &mut impl Write,
    id: OrderId,
) -> Result<(), CliError> {
    let order = state.api().fetch_order(id).await?;
    let order = checkout::cancel_order(state.api(), &order).await?;

    writeln!(out, "Order #{} is now {}.", order.id, order.status_label())?;
    Ok(())
}

fn write_order(out: &mut impl Write, order: &Order) -> std::io::Result<()> {
    writeln!(
        out,
        "Order #{} - {} - {}",
        order.id,
        order.created_at.format("%Y-%m-%d %H:%M"),
        order.status_label()
    )?;

    for item in &order.items {
        writeln!(
            out,
            "  {:<40} {:>4} x {:>10} = {:>10}",
            item.product.name,
            item.quantity,
            item.price.to_string(),
            item.line_total().to_string()
        )?;
    }
    writeln!(out, "Total: {}", order.total_price)?;

    writeln!(out, "\nShip to: {}", order.full_name)?;
    writeln!(
        out,
        "  {}, {} {}",
        order.address,
        order.city,
        order.postal_code.as_deref().unwrap_or_default()
    )?;
    writeln!(out, "  {} / {}", order.email, order.phone)?;
    if let Some(notes) = order.notes.as_deref().filter(|notes| !notes.is_empty()) {
        writeln!(out, "Notes: {notes}")?;
    }

    if order.status.is_cancellable() {
        writeln!(out, "\nCancel with `bazaar orders cancel {}`.", order.id)?;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_write_order() {
        let order: Order = serde_json::from_str(
            r#"{
                "id": 12,
                "status": "pending",
                "status_display": "Pending",
                "created_at": "2024-05-01T12:30:00Z",
                "total_price": "500.00",
                "full_name": "Anna Petrova",
                "email": "anna@example.com",
                "phone": "+7 900",
                "address": "Lenina 1",
                "city": "Kazan",
                "postal_code": "420000",
                "items": [
                    {"id": 1, "product": {"id": 1, "name": "A"}, "quantity": 5, "price": "100.00"}
                ]
            }"#,
        )
        .unwrap();

        let mut out = Vec::new();
        write_order(&mut out, &order).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Order #12 - 2024-05-01 12:30 - Pending\n"));
        assert!(text.contains("Total: 500.00\n"));
        assert!(text.contains("  Lenina 1, Kazan 420000\n"));
        assert!(text.ends_with("Cancel with `bazaar orders cancel 12`.\n"));
    }
}
