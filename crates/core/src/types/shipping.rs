//! Shipping quotes and the chosen shipping method.

use serde::{Deserialize, Serialize};

use super::id::ShippingMethodId;
use super::price::Price;

/// A shipping method quoted by the backend for the cart's seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingOption {
    pub id: ShippingMethodId,
    pub title: String,
    pub cost: Price,
    pub duration: Option<String>,
}

impl ShippingOption {
    #[must_use]
    pub const fn selection(&self) -> ShippingSelection {
        ShippingSelection {
            method: self.id,
            cost: self.cost,
        }
    }
}

/// The shopper's chosen shipping method and its price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSelection {
    pub method: ShippingMethodId,
    pub cost: Price,
}
