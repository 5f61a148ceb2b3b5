//! Catalog commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar catalog list [--category 2] [--search kettle] [--page 2]
//! bazaar catalog categories
//! bazaar catalog show 7
//! ```

use std::io::Write;

use bazaar_core::{CategoryId, KeyValueStore, ProductId};
use bazaar_storefront::models::{CategoryRef, Product, ProductFilters};
use bazaar_storefront::state::AppState;

use super::CliError;

/// List one page of in-stock products.
pub async fn list<S: KeyValueStore + Clone>(
    state: &AppState<S>,
    out: &mut impl Write,
    category: Option<CategoryId>,
    search: Option<String>,
    page: u32,
) -> Result<(), CliError> {
    let page_size = state.config().catalog_page_size;
    let filters = ProductFilters::storefront_page(page, page_size)
        .with_category(category)
        .with_search(search);

    let listing = state.api().fetch_catalog(&filters).await?;

    if listing.results.is_empty() {
        writeln!(out, "No products found.")?;
        return Ok(());
    }

    for product in &listing.results {
        write_product_line(out, product)?;
    }

    writeln!(
        out,
        "\nPage {} of {} ({} products)",
        filters.page.unwrap_or(1),
        listing.total_pages(page_size),
        listing.count
    )?;

    Ok(())
}

/// List all categories.
pub async fn categories<S: KeyValueStore + Clone>(
    state: &AppState<S>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let categories = state.api().fetch_categories().await?;

    if categories.is_empty() {
        writeln!(out, "No categories.")?;
    }
    for category in &categories {
        writeln!(out, "{:>5}  {}", category.id.as_i64(), category.name)?;
    }

    Ok(())
}

/// Show one product in full.
pub async fn show<S: KeyValueStore + Clone>(
    state: &AppState<S>,
    out: &mut impl Write,
    id: ProductId,
) -> Result<(), CliError> {
    let product = state.api().fetch_product(id).await?;
    write_product_detail(out, &product)?;
    Ok(())
}

fn write_product_line(out: &mut impl Write, product: &Product) -> std::io::Result<()> {
    let stock = if product.in_stock { "" } else { "  (out of stock)" };
    writeln!(
        out,
        "{:>5}  {:<40} {:>10}{stock}",
        product.id.as_i64(),
        product.name,
        product.price.to_string()
    )
}

fn write_product_detail(out: &mut impl Write, product: &Product) -> std::io::Result<()> {
    writeln!(out, "{} (#{})", product.name, product.id)?;
    writeln!(out, "Price: {}", product.price)?;

    match (product.in_stock, product.stock) {
        (false, _) => writeln!(out, "Out of stock")?,
        (true, Some(stock)) => writeln!(out, "In stock: {stock}")?,
        (true, None) => writeln!(out, "In stock")?,
    }

    match &product.category {
        Some(CategoryRef::Nested(category)) => writeln!(out, "Category: {}", category.name)?,
        Some(CategoryRef::Id(id)) => writeln!(out, "Category: #{id}")?,
        None => {}
    }

    if let Some(description) = product.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        writeln!(out, "\n{description}")?;
    }

    Ok(())
}
