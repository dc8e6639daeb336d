//! Inventory side effects of order placement and restoration.
//!
//! None of these workflows is atomic: each step is a separate store call and
//! concurrent requests touching the same product can interleave between them.

use std::sync::Arc;

use serde::Serialize;
use shared::{reserved_spaces, InventoryAdjustment, ValidationError};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::repository::{OrderRepository, ProductRepository, StoreError};

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct AdjustmentOutcome {
    pub adjusted: Vec<i64>,
    pub skipped: Vec<i64>,
}

#[derive(Clone)]
pub struct InventoryManager {
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl InventoryManager {
    pub fn new(products: Arc<dyn ProductRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { products, orders }
    }

    /// Checks and decrements stock for each `(product id, spaces)` pair in turn.
    ///
    /// Stops at the first missing product or short stock. Decrements already
    /// applied for earlier pairs stay applied.
    pub async fn reserve(&self, lines: &[(i64, i64)]) -> Result<(), ApiError> {
        for &(product_id, spaces) in lines {
            let stock = self
                .products
                .find_stock(product_id)
                .await?
                .ok_or_else(|| product_not_found(product_id))?;

            if !stock.can_fulfil(spaces) {
                return Err(ValidationError::InsufficientInventory {
                    product_id: stock.product_id,
                    available: stock.available_inventory,
                    requested: spaces,
                }
                .into());
            }

            if !self.products.adjust_inventory(product_id, -spaces).await? {
                return Err(product_not_found(product_id));
            }
            info!("Reserved {} spaces of product {}", spaces, product_id);
        }
        Ok(())
    }

    /// Applies a signed increment per pair. Unknown products are skipped.
    pub async fn adjust(
        &self,
        adjustment: &InventoryAdjustment,
    ) -> Result<AdjustmentOutcome, StoreError> {
        let mut outcome = AdjustmentOutcome::default();
        for &(product_id, quantity) in &adjustment.lines {
            let delta = adjustment.delta(quantity);
            if self.products.adjust_inventory(product_id, delta).await? {
                info!("Adjusted inventory of product {} by {}", product_id, delta);
                outcome.adjusted.push(product_id);
            } else {
                warn!("No product with id {}, skipping inventory adjustment", product_id);
                outcome.skipped.push(product_id);
            }
        }
        Ok(outcome)
    }

    /// Adds back every space reserved for `product_id` across all orders.
    ///
    /// Returns the number of spaces restored.
    pub async fn restore_reservations(&self, product_id: i64) -> Result<i64, ApiError> {
        let orders = self.orders.orders_referencing(product_id).await?;
        let restored = reserved_spaces(&orders, product_id);

        if !self.products.adjust_inventory(product_id, restored).await? {
            return Err(product_not_found(product_id));
        }
        info!(
            "Restored {} spaces of product {} from {} orders",
            restored,
            product_id,
            orders.len()
        );
        Ok(restored)
    }
}

fn product_not_found(product_id: i64) -> ApiError {
    ApiError::NotFound(format!("Product with id {product_id} not found"))
}
