//! Core types for the Awis checkout.
//!
//! This module provides type-safe wrappers for checkout domain concepts.

pub mod address;
pub mod cart;
pub mod email;
pub mod id;
pub mod locale;
pub mod payment;
pub mod price;
pub mod shipping;
pub mod tenant;

pub use address::{AddressDraft, AddressField, AddressType};
pub use cart::{CartLine, LocalCart, SellerKind, SellerRef};
pub use email::{Email, EmailError};
pub use id::*;
pub use locale::{Language, Message};
pub use payment::{PaymentMethod, PaymentMethodKind, PaymentSelection, with_cash_on_delivery};
pub use price::{Price, PriceFormat, SymbolPosition};
pub use shipping::{ShippingOption, ShippingSelection};
pub use tenant::{Branding, Tenant, TenantError};
