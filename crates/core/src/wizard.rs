//! The checkout wizard state machine.
//!
//! ```text
//!   AddressEntry (1) ──valid address──▶ ShippingAndPayment (2) ──order──▶ Completed (4)
//!         ▲                                      │
//!         └───────────────── back ───────────────┘
//! ```
//!
//! Step numbers are kept as the storefront has always exposed them: there is
//! no step 3.
//!
//! Transitions are pure: [`CheckoutWizard::apply`] takes the current state
//! and an event and returns the next state. Events that make no sense in the
//! current step leave the state unchanged. Failures never change the step;
//! they are recorded in [`CheckoutWizard::error`] for inline display.

use serde::{Deserialize, Serialize};

use crate::types::{
    AddressDraft, Message, PaymentMethod, PaymentSelection, ShippingMethodId, ShippingOption,
    ShippingSelection,
};

/// A checkout step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CheckoutStep {
    #[default]
    AddressEntry,
    ShippingAndPayment,
    Completed,
}

impl CheckoutStep {
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::AddressEntry => 1,
            Self::ShippingAndPayment => 2,
            Self::Completed => 4,
        }
    }
}

impl From<CheckoutStep> for u8 {
    fn from(step: CheckoutStep) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for CheckoutStep {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::AddressEntry),
            2 => Ok(Self::ShippingAndPayment),
            4 => Ok(Self::Completed),
            other => Err(format!("invalid checkout step {other}")),
        }
    }
}

/// Independent loading state of one backend fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Loadable<T> {
    #[default]
    NotRequested,
    Loading,
    Ready(T),
    Failed(Message),
}

impl<T> Loadable<T> {
    #[must_use]
    pub fn from_result(result: Result<T, Message>) -> Self {
        result.map_or_else(Self::Failed, Self::Ready)
    }

    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&Message> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Something that happened to the checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    /// The shopper submitted the address form.
    AddressSubmitted(AddressDraft),
    /// Explicit back navigation to the address step.
    Back,
    ShippingOptionsLoaded(Result<Vec<ShippingOption>, Message>),
    PaymentMethodsLoaded(Result<Vec<PaymentMethod>, Message>),
    /// A shipping method was persisted to the backend for the cart group.
    ShippingChosen(ShippingMethodId),
    /// Persisting a shipping method failed; the previous choice stands.
    ShippingChoiceFailed(Message),
    PaymentChosen(String),
    /// The shopper asked to place the order.
    SubmissionStarted,
    SubmissionFailed(Message),
    /// The order was placed (or handed to the payment gateway and confirmed).
    OrderCompleted,
}

/// The whole wizard, as stored in the shopper's session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutWizard {
    pub step: CheckoutStep,
    pub draft: AddressDraft,
    pub shipping_options: Loadable<Vec<ShippingOption>>,
    pub payment_methods: Loadable<Vec<PaymentMethod>>,
    pub shipping: Option<ShippingSelection>,
    pub payment: Option<PaymentSelection>,
    pub error: Option<Message>,
    pub placing: bool,
}

impl CheckoutWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an event, returning the next state.
    #[must_use]
    pub fn apply(mut self, event: WizardEvent) -> Self {
        use CheckoutStep::{AddressEntry, ShippingAndPayment};

        match (self.step, event) {
            (AddressEntry, WizardEvent::AddressSubmitted(draft)) => {
                let complete = draft.is_complete();
                self.draft = draft;
                if complete {
                    self.step = ShippingAndPayment;
                    self.error = None;
                    self.shipping_options = Loadable::Loading;
                    self.payment_methods = Loadable::Loading;
                } else {
                    self.error = Some(Message::RequiredFieldsMissing);
                }
            }
            (_, WizardEvent::Back) => {
                self.step = AddressEntry;
                self.error = None;
                self.placing = false;
            }
            (ShippingAndPayment, WizardEvent::ShippingOptionsLoaded(result)) => {
                if let Ok(options) = &result {
                    let still_offered = self
                        .shipping
                        .is_some_and(|s| options.iter().any(|o| o.id == s.method));
                    if !still_offered {
                        self.shipping = options.first().map(ShippingOption::selection);
                    }
                }
                self.shipping_options = Loadable::from_result(result);
            }
            (ShippingAndPayment, WizardEvent::PaymentMethodsLoaded(result)) => {
                if let Ok(methods) = &result {
                    let still_offered = self
                        .payment
                        .as_ref()
                        .is_some_and(|p| methods.iter().any(|m| m.key == p.key));
                    if !still_offered {
                        self.payment = methods.first().map(PaymentMethod::selection);
                    }
                }
                self.payment_methods = Loadable::from_result(result);
            }
            (ShippingAndPayment, WizardEvent::ShippingChosen(id)) => {
                match self.shipping_option(id).map(ShippingOption::selection) {
                    Some(selection) => {
                        self.shipping = Some(selection);
                        self.error = None;
                    }
                    None => self.error = Some(Message::InvalidShippingOption),
                }
            }
            (ShippingAndPayment, WizardEvent::ShippingChoiceFailed(message)) => {
                self.error = Some(message);
            }
            (ShippingAndPayment, WizardEvent::PaymentChosen(key)) => {
                match self.payment_method(&key).map(PaymentMethod::selection) {
                    Some(selection) => {
                        self.payment = Some(selection);
                        self.error = None;
                    }
                    None => self.error = Some(Message::InvalidPaymentMethod),
                }
            }
            (ShippingAndPayment, WizardEvent::SubmissionStarted) => {
                match self.submission_selections() {
                    Ok(_) => {
                        self.placing = true;
                        self.error = None;
                    }
                    Err(message) => self.error = Some(message),
                }
            }
            (ShippingAndPayment, WizardEvent::SubmissionFailed(message)) => {
                self.placing = false;
                self.error = Some(message);
            }
            (ShippingAndPayment, WizardEvent::OrderCompleted) => {
                self.step = CheckoutStep::Completed;
                self.placing = false;
                self.error = None;
            }
            _ => {}
        }
        self
    }

    /// A quoted shipping option by id.
    #[must_use]
    pub fn shipping_option(&self, id: ShippingMethodId) -> Option<&ShippingOption> {
        self.shipping_options
            .ready()
            .and_then(|options| options.iter().find(|o| o.id == id))
    }

    /// A loaded payment method by key.
    #[must_use]
    pub fn payment_method(&self, key: &str) -> Option<&PaymentMethod> {
        self.payment_methods
            .ready()
            .and_then(|methods| methods.iter().find(|m| m.key == key))
    }

    /// The selections the order will be placed with.
    ///
    /// # Errors
    ///
    /// Returns the message to show when shipping or payment is unchosen.
    pub fn submission_selections(&self) -> Result<(ShippingSelection, PaymentSelection), Message> {
        let shipping = self.shipping.ok_or(Message::ShippingNotChosen)?;
        let payment = self.payment.clone().ok_or(Message::PaymentNotChosen)?;
        Ok((shipping, payment))
    }
}
