//! The shopper's local cart.
//!
//! The storefront keeps its own cart alongside the backend's cart; the two
//! are maintained independently and can disagree. Checkout only reads this
//! one for line items, subtotal and seller grouping.

use serde::{Deserialize, Serialize};

use super::id::{ProductId, SellerId};
use super::price::Price;

/// Who sells a product: the platform itself or a marketplace seller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellerKind {
    #[default]
    Admin,
    Seller,
}

impl SellerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Seller => "seller",
        }
    }
}

/// A seller reference used to scope shipping lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellerRef {
    pub id: SellerId,
    pub kind: SellerKind,
}

impl SellerRef {
    /// The platform seller, whose shipping methods apply globally.
    #[must_use]
    pub const fn admin() -> Self {
        Self {
            id: SellerId::new(1),
            kind: SellerKind::Admin,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.kind, SellerKind::Admin)
    }
}

impl Default for SellerRef {
    fn default() -> Self {
        Self::admin()
    }
}

/// One product line in the local cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub variant: Option<String>,
    pub color: Option<String>,
    pub seller: SellerRef,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price * self.quantity
    }

    fn same_item(&self, other: &Self) -> bool {
        self.product_id == other.product_id
            && self.variant == other.variant
            && self.color == other.color
    }
}

/// Session-held cart contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCart {
    lines: Vec<CartLine>,
}

impl LocalCart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Add a line, merging quantities with an identical existing line.
    ///
    /// Lines with a zero quantity are ignored.
    pub fn add(&mut self, line: CartLine) {
        if line.quantity == 0 {
            return;
        }
        if let Some(existing) = self.lines.iter_mut().find(|l| l.same_item(&line)) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            self.lines.push(line);
        }
    }

    /// Remove the line at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<CartLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Distinct sellers in cart order.
    #[must_use]
    pub fn sellers(&self) -> Vec<SellerRef> {
        let mut sellers: Vec<SellerRef> = Vec::new();
        for line in &self.lines {
            if !sellers.contains(&line.seller) {
                sellers.push(line.seller);
            }
        }
        sellers
    }

    /// Seller whose shipping methods apply to this cart.
    ///
    /// The first line's seller, or the platform seller for an empty cart.
    #[must_use]
    pub fn shipping_seller(&self) -> SellerRef {
        self.lines
            .first()
            .map_or_else(SellerRef::admin, |line| line.seller)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;

    fn line(product: i64, price: &str, quantity: u32, seller: SellerRef) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            name: format!("Product {product}"),
            quantity,
            unit_price: Price::new(Decimal::from_str(price).unwrap()),
            variant: None,
            color: None,
            seller,
        }
    }

    fn seller(id: i64) -> SellerRef {
        SellerRef {
            id: SellerId::new(id),
            kind: SellerKind::Seller,
        }
    }

    #[test]
    fn test_subtotal_and_count() {
        let mut cart = LocalCart::new();
        cart.add(line(1, "4.750", 2, seller(7)));
        cart.add(line(2, "1.000", 1, seller(7)));
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Price::new(Decimal::from_str("10.5").unwrap()));
    }

    #[test]
    fn test_add_merges_identical_lines() {
        let mut cart = LocalCart::new();
        cart.add(line(1, "1", 1, seller(7)));
        cart.add(line(1, "1", 2, seller(7)));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 3);

        let mut variant = line(1, "1", 1, seller(7));
        variant.variant = Some("500ml".to_string());
        cart.add(variant);
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_zero_quantity_is_ignored() {
        let mut cart = LocalCart::new();
        cart.add(line(1, "1", 0, seller(7)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_shipping_seller_defaults_to_admin() {
        let mut cart = LocalCart::new();
        assert_eq!(cart.shipping_seller(), SellerRef::admin());

        cart.add(line(1, "1", 1, seller(7)));
        cart.add(line(2, "1", 1, SellerRef::admin()));
        assert_eq!(cart.shipping_seller(), seller(7));
        assert_eq!(cart.sellers(), vec![seller(7), SellerRef::admin()]);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut cart = LocalCart::new();
        cart.add(line(1, "1", 1, seller(7)));
        assert!(cart.remove(5).is_none());
        assert!(cart.remove(0).is_some());
        assert!(cart.is_empty());
    }
}
