//! Awis Core - Shared checkout types and the checkout wizard.
//!
//! This crate provides the types used by the storefront checkout:
//! - guest identity, addresses, carts, shipping and payment selections
//! - localized user-facing messages and tenant branding
//! - the pure checkout wizard state machine
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no sessions. Every wizard transition is a plain
//! `(state, event) -> state` function so it can be tested without rendering
//! or a backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers and checkout records
//! - [`wizard`] - The checkout step machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod wizard;

pub use types::*;
pub use wizard::{CheckoutStep, CheckoutWizard, Loadable, WizardEvent};
