//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar cart show
//! bazaar cart add 7 -q 2
//! bazaar cart set 7 3
//! bazaar cart remove 7
//! bazaar cart clear
//! ```
//!
//! The cart lives in the state directory and is shared by every command.

use std::io::Write;

use bazaar_core::{CartState, KeyValueStore, ProductId};
use bazaar_storefront::state::AppState;

use super::CliError;

pub fn show<S: KeyValueStore + Clone>(
    state: &AppState<S>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    write_cart(out, state.cart().state())?;
    Ok(())
}

/// Fetch the product and add it to the cart.
pub async fn add<S: KeyValueStore + Clone>(
    state: &mut AppState<S>,
    out: &mut impl Write,
    id: ProductId,
    quantity: u32,
) -> Result<(), CliError> {
    let cart = state.add_to_cart(id, quantity).await?;

    if let Some(item) = cart.get(id) {
        writeln!(out, "{} x{} in cart.", item.name(), item.quantity())?;
    }
    write_summary(out, cart)?;
    Ok(())
}

pub fn remove<S: KeyValueStore + Clone>(
    state: &mut AppState<S>,
    out: &mut impl Write,
    id: ProductId,
) -> Result<(), CliError> {
    let cart = state.cart_mut().remove_item(id);
    write_summary(out, cart)?;
    Ok(())
}

pub fn set<S: KeyValueStore + Clone>(
    state: &mut AppState<S>,
    out: &mut impl Write,
    id: ProductId,
    quantity: u32,
) -> Result<(), CliError> {
    let cart = state.cart_mut().set_quantity(id, quantity);
    write_summary(out, cart)?;
    Ok(())
}

pub fn clear<S: KeyValueStore + Clone>(
    state: &mut AppState<S>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    state.cart_mut().clear();
    writeln!(out, "Cart cleared.")?;
    Ok(())
}

/// Render every line item followed by the totals.
pub fn write_cart(out: &mut impl Write, cart: &CartState) -> std::io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Your cart is empty.");
    }

    for item in cart.items() {
        writeln!(
            out,
            "{:>5}  {:<40} {:>4} x {:>10} = {:>10}",
            item.product_id().as_i64(),
            item.name(),
            item.quantity(),
            item.unit_price().to_string(),
            item.line_total().to_string()
        )?;
    }

    write_summary(out, cart)
}

fn write_summary(out: &mut impl Write, cart: &CartState) -> std::io::Result<()> {
    writeln!(
        out,
        "Items: {}  Total: {}",
        cart.total_item_count(),
        cart.total_price()
    )
}
