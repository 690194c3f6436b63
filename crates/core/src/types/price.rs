//! Decimal prices and display formatting.
//!
//! Amounts are kept as [`Decimal`] end to end; floats only appear at the
//! backend boundary, where the backend sends numbers.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount in the store's default currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Raw (unformatted) rendering, normalized without trailing zeros.
///
/// Used for query parameters and as the display fallback when no
/// formatting rules are available.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Where the currency symbol goes relative to the amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Left,
    #[default]
    Right,
}

/// Currency formatting rules taken from the backend display configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFormat {
    pub symbol: String,
    pub position: SymbolPosition,
    pub decimals: u32,
}

impl Default for PriceFormat {
    /// Kuwaiti dinar, three decimal places.
    fn default() -> Self {
        Self {
            symbol: "د.ك".to_string(),
            position: SymbolPosition::Right,
            decimals: 3,
        }
    }
}

impl PriceFormat {
    /// Format a price, e.g. `2.500 د.ك` or `$2.50`.
    #[must_use]
    pub fn format(&self, price: Price) -> String {
        let decimals = self.decimals as usize;
        let amount = price.amount().round_dp(self.decimals);
        match self.position {
            SymbolPosition::Left => format!("{}{amount:.decimals$}", self.symbol),
            SymbolPosition::Right => format!("{amount:.decimals$} {}", self.symbol),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn price(s: &str) -> Price {
        Price::new(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_format_default_three_decimals() {
        assert_eq!(PriceFormat::default().format(price("2.5")), "2.500 د.ك");
    }

    #[test]
    fn test_format_symbol_left_rounds() {
        let format = PriceFormat {
            symbol: "$".to_string(),
            position: SymbolPosition::Left,
            decimals: 2,
        };
        assert_eq!(format.format(price("10.005")), "$10.00");
        assert_eq!(format.format(price("3")), "$3.00");
    }

    #[test]
    fn test_sum_and_multiply() {
        let total: Price = [price("1.250") * 2, price("2.500")].into_iter().sum();
        assert_eq!(total, price("5.000"));
    }

    #[test]
    fn test_display_is_normalized() {
        assert_eq!(price("12.500").to_string(), "12.5");
        assert_eq!(price("7.000").to_string(), "7");
    }
}
