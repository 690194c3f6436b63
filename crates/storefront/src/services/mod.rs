//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `guest` - Guest identity bootstrap
//! - `checkout` - Step-2 data loading, shipping persistence and order submission
//! - `views` - Per-guest cancellation of superseded checkout views

pub mod checkout;
pub mod guest;
pub mod views;

pub use checkout::{CheckoutError, OrderSubmission, SubmissionOutcome};
pub use guest::ensure_guest;
pub use views::ViewRegistry;
