//! Session-backed models for the storefront.
//!
//! The checkout keeps no database: everything a shopper owns lives in their
//! session until it is handed to the commerce backend.

pub mod session;

pub use session::{ShopperSession, keys};
