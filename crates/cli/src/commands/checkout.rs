//! Checkout command.
//!
//! # Usage
//!
//! ```bash
//! bazaar checkout --city Kazan --postal-code 420000 --notes 'Ring twice'
//! ```
//!
//! Name, email, phone and address default to the signed-in user's profile.

use std::io::Write;

use bazaar_core::KeyValueStore;
use bazaar_storefront::models::ShippingInfo;
use bazaar_storefront::services::checkout::CheckoutError;
use bazaar_storefront::state::AppState;
use clap::Args;

use super::CliError;
use super::cart::write_cart;

#[derive(Args, Default)]
pub struct CheckoutArgs {
    #[arg(long)]
    pub full_name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub postal_code: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

impl CheckoutArgs {
    /// Fill the fields not given on the command line from `prefill`.
    fn merge(self, prefill: ShippingInfo) -> ShippingInfo {
        ShippingInfo {
            full_name: self.full_name.unwrap_or(prefill.full_name),
            email: self.email.unwrap_or(prefill.email),
            phone: self.phone.unwrap_or(prefill.phone),
            address: self.address.unwrap_or(prefill.address),
            city: self.city.unwrap_or(prefill.city),
            postal_code: self.postal_code.unwrap_or(prefill.postal_code),
            notes: self.notes.unwrap_or(prefill.notes),
        }
    }
}

pub async fn run<S: KeyValueStore + Clone>(
    state: &mut AppState<S>,
    out: &mut impl Write,
    args: CheckoutArgs,
) -> Result<(), CliError> {
    if !state.session().is_authenticated() {
        return Err(CheckoutError::NotAuthenticated.into());
    }

    let prefill = ShippingInfo::prefill(state.session_mut().load_user().await?);
    let shipping = args.merge(prefill);

    write_cart(out, state.cart().state())?;
    let order = state.place_order(shipping).await?;

    writeln!(
        out,
        "\nOrder #{} placed ({}). Total: {}",
        order.id,
        order.status_label(),
        order.total_price
    )?;
    Ok(())
}
