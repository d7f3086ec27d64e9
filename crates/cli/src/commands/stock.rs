//! Stock maintenance.

use yemeni_market_storefront::db::ProductRepository;

use super::{CliError, connect};

/// Set every product's stock to `quantity` and reactivate it.
pub async fn reset(quantity: i32) -> Result<(), CliError> {
    let quantity = quantity.max(0);
    let pool = connect().await?;

    let updated = ProductRepository::new(&pool)
        .reset_all_stock(quantity)
        .await?;

    tracing::info!("Updated {updated} products with {quantity} stock.");
    Ok(())
}

/// Log the stock level of every product.
pub async fn report() -> Result<(), CliError> {
    let pool = connect().await?;
    let levels = ProductRepository::new(&pool).stock_levels().await?;

    tracing::info!("Current stock levels ({} products):", levels.len());
    for level in &levels {
        let state = if level.is_active { "" } else { " (inactive)" };
        tracing::info!(
            "ID: {} | Name: {} | Stock: {}{state}",
            level.id,
            level.name,
            level.stock_quantity
        );
    }
    Ok(())
}
