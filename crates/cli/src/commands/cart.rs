//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! gomarket add --id p1 --title Apple --price 1.50
//! gomarket increment p1
//! gomarket decrement p1
//! gomarket list
//! ```
//!
//! # Environment Variables
//!
//! - `GOMARKET_CART_KEY` - Storage key holding the cart
//! - `GOMARKET_STORAGE_PATH` - Storage file location

use gomarket_core::{CartProduct, Price, PriceError, ProductId};
use tracing::{info, instrument};

use super::{CartSession, CommandError};

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if the id is blank or the price is not a non-negative number.
#[instrument(skip(session, title, image_url))]
pub fn add(
    session: &CartSession,
    id: &str,
    title: &str,
    image_url: &str,
    price: &str,
) -> Result<(), CommandError> {
    let product = CartProduct::new(
        parse_id(id)?,
        title,
        image_url,
        price
            .parse::<Price>()
            .map_err(|e| CommandError::InvalidInput("price", e.to_string()))?,
    );

    session.cart()?.add_to_cart(product);
    info!("Added {id} to cart");
    Ok(())
}

/// Add one unit to an existing line.
///
/// # Errors
///
/// Returns an error if the product is not in the cart.
#[instrument(skip(session))]
pub fn increment(session: &CartSession, id: &str) -> Result<(), CommandError> {
    session.cart()?.increment(&parse_id(id)?)?;
    Ok(())
}

/// Remove one unit from a line.
///
/// # Errors
///
/// Returns an error if the product is not in the cart.
#[instrument(skip(session))]
pub fn decrement(session: &CartSession, id: &str) -> Result<(), CommandError> {
    session.cart()?.decrement(&parse_id(id)?)?;
    Ok(())
}

/// Log the cart contents.
///
/// # Errors
///
/// Returns an error if the cart is not mounted.
pub fn show(session: &CartSession) -> Result<(), CommandError> {
    let products = session.cart()?.products();

    if products.is_empty() {
        info!("Cart is empty");
        return Ok(());
    }

    info!("Cart");
    info!("====");
    for item in products.items() {
        info!(
            "  {} x{} {} ({} each, {})",
            item.id,
            item.quantity,
            item.title,
            item.price,
            format_total(item.line_total())
        );
    }
    info!(
        "  {} units, subtotal {}",
        products.total_quantity(),
        format_total(products.subtotal())
    );
    Ok(())
}

fn format_total(total: Result<Price, PriceError>) -> String {
    total.map_or_else(|_| "out of range".to_string(), |price| price.to_string())
}

fn parse_id(id: &str) -> Result<ProductId, CommandError> {
    ProductId::parse(id).map_err(|e| CommandError::InvalidInput("product id", e.to_string()))
}
