//! Pure part of checkout: turns a loaded cart plus the locked product rows
//! into the order that will be written. No I/O happens here.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use num_traits::Zero;

use crate::error::{Result, ShopError};
use crate::models::{CartDetail, Product};

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedItem {
    pub product_id: i32,
    pub quantity: i32,
    /// Unit price copied from the product at checkout time.
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    pub total: BigDecimal,
    pub items: Vec<PlannedItem>,
}

/// Validates the cart against the freshly locked products and builds the
/// order items in cart order. Stock and price come from `locked`, not from
/// the possibly stale copies loaded with the cart. A product deleted since
/// it was added reads as missing.
pub fn plan_order(cart: &CartDetail, locked: &[Product]) -> Result<OrderPlan> {
    if cart.lines.is_empty() {
        return Err(ShopError::EmptyCart);
    }

    let by_id: HashMap<i32, &Product> = locked.iter().map(|p| (p.id, p)).collect();

    let mut total = BigDecimal::zero();
    let mut items = Vec::with_capacity(cart.lines.len());

    for line in &cart.lines {
        let product = by_id
            .get(&line.item.product_id)
            .copied()
            .filter(|p| p.deleted_at.is_none())
            .ok_or(ShopError::NotFound("product"))?;

        if product.stock < line.item.quantity {
            return Err(ShopError::InsufficientStock {
                product: product.name.clone(),
            });
        }

        total += &product.price * BigDecimal::from(line.item.quantity);
        items.push(PlannedItem {
            product_id: product.id,
            quantity: line.item.quantity,
            price: product.price.clone(),
        });
    }

    Ok(OrderPlan { total, items })
}
