//! Payment methods and their classification.
//!
//! A method's [`PaymentMethodKind`] is decided once, when the list is loaded
//! from the backend configuration. Submission branches on the kind and never
//! re-inspects keys or labels.

use serde::{Deserialize, Serialize};

use super::locale::Language;

/// Key substrings (case-insensitive) that mark cash on delivery.
const COD_TOKENS: [&str; 3] = ["cod", "cash", "نقد"];

/// How an order with this method is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    /// Paid at goods handoff; the order is placed directly.
    CashOnDelivery,
    /// Paid on an external hosted payment page.
    Digital,
}

impl PaymentMethodKind {
    /// Classify a backend payment key.
    #[must_use]
    pub fn classify(key: &str) -> Self {
        let key = key.to_lowercase();
        if COD_TOKENS.iter().any(|token| key.contains(token)) {
            Self::CashOnDelivery
        } else {
            Self::Digital
        }
    }

    #[must_use]
    pub const fn is_cash_on_delivery(self) -> bool {
        matches!(self, Self::CashOnDelivery)
    }
}

/// A payment method offered at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub key: String,
    pub label: String,
    pub kind: PaymentMethodKind,
}

impl PaymentMethod {
    /// Key used for the synthesized cash-on-delivery entry.
    pub const COD_KEY: &'static str = "cod";

    /// Build a method from a backend key, classifying it.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        let key = key.into();
        let kind = PaymentMethodKind::classify(&key);
        Self {
            key,
            label: label.into(),
            kind,
        }
    }

    /// The client-synthesized cash-on-delivery method.
    #[must_use]
    pub fn cash_on_delivery(lang: Language) -> Self {
        Self {
            key: Self::COD_KEY.to_string(),
            label: Self::cash_on_delivery_label(lang).to_string(),
            kind: PaymentMethodKind::CashOnDelivery,
        }
    }

    #[must_use]
    pub const fn cash_on_delivery_label(lang: Language) -> &'static str {
        match lang {
            Language::Ar => "الدفع عند الاستلام",
            Language::En => "Cash on Delivery",
        }
    }

    #[must_use]
    pub fn selection(&self) -> PaymentSelection {
        PaymentSelection {
            key: self.key.clone(),
            kind: self.kind,
        }
    }
}

/// The shopper's chosen payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSelection {
    pub key: String,
    pub kind: PaymentMethodKind,
}

/// Append cash on delivery when the backend enables it but leaves it out.
#[must_use]
pub fn with_cash_on_delivery(
    mut methods: Vec<PaymentMethod>,
    cod_enabled: bool,
    lang: Language,
) -> Vec<PaymentMethod> {
    if cod_enabled && !methods.iter().any(|m| m.kind.is_cash_on_delivery()) {
        methods.push(PaymentMethod::cash_on_delivery(lang));
    }
    methods
}
