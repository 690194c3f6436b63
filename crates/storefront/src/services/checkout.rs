//! Checkout orchestration against the commerce backend.
//!
//! The wizard in `awis-core` decides *what* state the checkout is in; this
//! module performs the backend calls that feed it:
//!
//! - step-2 loading (shipping quotes and payment methods, concurrently)
//! - the allowed-country list for the address step
//! - persisting a chosen shipping method
//! - order submission, a strictly ordered sequence ending in either a
//!   cash-on-delivery order or a hand-off to the payment gateway
//!
//! Every function reports shopper-visible failures as [`Message`]s.

use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use awis_core::{
    AddressId, CartGroupId, CheckoutWizard, GuestId, Language, LocalCart, Message,
    OrderReference, PaymentMethod, PaymentSelection, Price, SellerRef, ShippingMethodId,
    ShippingOption, ShippingSelection,
};

use crate::backend::{
    BackendError, CommerceBackend, DigitalPaymentOutcome, DigitalPaymentRequest, NewAddress,
    PaymentFormTokenSource, PlaceOrderRequest, WebPaymentForm,
};
use crate::config::{CheckoutConfig, PaymentMode};
use crate::error::add_breadcrumb;
use crate::models::ShopperSession;

/// Address-list polls after an add-address response without an id.
pub const ADDRESS_POLL_ATTEMPTS: usize = 5;

/// Pause between address-list polls.
pub const ADDRESS_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Delay before the local cart is cleared after a cash-on-delivery order.
pub const CART_CLEAR_DELAY: Duration = Duration::from_millis(200);

// =============================================================================
// Step 2 data
// =============================================================================

/// Shipping quotes for the cart's seller, falling back to the platform
/// seller when that seller has none.
///
/// # Errors
///
/// `ShippingUnavailable` when no seller has any option, otherwise
/// `ShippingOptionsFailed`.
#[instrument(skip(backend, cart), fields(guest = %guest))]
pub async fn load_shipping_options(
    backend: &dyn CommerceBackend,
    cart: &LocalCart,
    guest: &GuestId,
) -> Result<Vec<ShippingOption>, Message> {
    let seller = cart.shipping_seller();
    let failed = |e: BackendError| {
        tracing::warn!(error = %e, "Failed to load shipping options");
        Message::ShippingOptionsFailed
    };

    let mut options = backend.shipping_methods(seller, guest).await.map_err(failed)?;
    if options.is_empty() && !seller.is_admin() {
        tracing::debug!(seller_id = %seller.id, "Seller has no shipping methods, using platform");
        options = backend
            .shipping_methods(SellerRef::admin(), guest)
            .await
            .map_err(failed)?;
    }

    if options.is_empty() {
        return Err(Message::ShippingUnavailable);
    }
    Ok(options)
}

/// Payment methods offered at checkout, localized.
///
/// # Errors
///
/// `PaymentMethodsFailed` when the configuration cannot be loaded.
#[instrument(skip(backend), fields(lang = lang.code()))]
pub async fn load_payment_methods(
    backend: &dyn CommerceBackend,
    lang: Language,
) -> Result<Vec<PaymentMethod>, Message> {
    backend
        .display_config(lang)
        .await
        .map(|config| config.checkout_payment_methods(lang))
        .map_err(|e| {
            tracing::warn!(error = %e, "Failed to load payment methods");
            Message::PaymentMethodsFailed
        })
}

/// Load both step-2 lists concurrently. Neither waits on the other.
pub async fn load_step_two(
    backend: &dyn CommerceBackend,
    cart: &LocalCart,
    guest: &GuestId,
    lang: Language,
) -> (
    Result<Vec<ShippingOption>, Message>,
    Result<Vec<PaymentMethod>, Message>,
) {
    tokio::join!(
        load_shipping_options(backend, cart, guest),
        load_payment_methods(backend, lang)
    )
}

/// Countries the store delivers to.
///
/// # Errors
///
/// `CountryListUnauthorized` on a 401, `CountryListUnreachable` when the
/// request never got an answer, `CountryListFailed` otherwise.
#[instrument(skip(backend), fields(guest = %guest))]
pub async fn load_countries(
    backend: &dyn CommerceBackend,
    guest: &GuestId,
) -> Result<Vec<String>, Message> {
    backend.allowed_countries(guest).await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to load country list");
        match e {
            BackendError::Unauthorized => Message::CountryListUnauthorized,
            BackendError::Http(_) => Message::CountryListUnreachable,
            _ => Message::CountryListFailed,
        }
    })
}

// =============================================================================
// Shipping persistence
// =============================================================================

/// Group id of the authoritative cart, `default` when the first line has none.
async fn cart_group(
    backend: &dyn CommerceBackend,
    guest: &GuestId,
) -> Result<Option<CartGroupId>, BackendError> {
    let lines = backend.cart(guest).await?;
    Ok(lines.into_iter().next().map(|line| {
        line.cart_group_id
            .filter(|group| !group.as_str().is_empty())
            .unwrap_or_else(CartGroupId::fallback)
    }))
}

/// Persist a shipping choice against the guest's current cart group.
///
/// # Errors
///
/// `CartNotSynced` when the backend cart is empty, `ShippingSaveFailed` for
/// any backend failure.
#[instrument(skip(backend), fields(method = %method, guest = %guest))]
pub async fn persist_shipping(
    backend: &dyn CommerceBackend,
    method: ShippingMethodId,
    guest: &GuestId,
) -> Result<(), Message> {
    let failed = |e: BackendError| {
        tracing::warn!(error = %e, "Failed to persist shipping method");
        Message::ShippingSaveFailed
    };

    let group = cart_group(backend, guest)
        .await
        .map_err(failed)?
        .ok_or(Message::CartNotSynced)?;
    backend
        .choose_shipping(method, &group, guest)
        .await
        .map_err(failed)
}

// =============================================================================
// Order submission
// =============================================================================

/// A step of order submission, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStep {
    Address,
    Cart,
    Shipping,
    Order,
    Payment,
}

impl std::fmt::Display for SubmissionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Address => "address",
            Self::Cart => "cart",
            Self::Shipping => "shipping",
            Self::Order => "order",
            Self::Payment => "payment",
        })
    }
}

/// Why an order submission stopped.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checked before any backend call.
    #[error("Checkout precondition failed: {0:?}")]
    Precondition(Message),

    /// The address was created but no id could be found for it.
    #[error("Address id not found in address list")]
    AddressNotSaved,

    /// The backend cart is empty.
    #[error("Backend cart is empty")]
    CartNotSynced,

    /// The shopper navigated away; nothing may be written for this view.
    #[error("Checkout view was superseded")]
    Superseded,

    #[error("Backend failed at {step} step: {source}")]
    Backend {
        step: SubmissionStep,
        #[source]
        source: BackendError,
    },

    /// Digital payment accepted without a gateway link.
    #[error("No redirect link from backend: {0}")]
    MissingRedirectLink(String),

    #[error("Payment form token unavailable: {0}")]
    PaymentFormUnavailable(#[source] BackendError),
}

impl CheckoutError {
    fn backend(step: SubmissionStep) -> impl FnOnce(BackendError) -> Self {
        move |source| Self::Backend { step, source }
    }

    /// The message shown to the shopper.
    #[must_use]
    pub fn message(&self) -> Message {
        match self {
            Self::Precondition(message) => message.clone(),
            Self::AddressNotSaved => Message::AddressSaveFailed,
            Self::CartNotSynced => Message::CartNotSynced,
            Self::Superseded => Message::PurchaseFailed,
            Self::Backend { step, source } => match (source.backend_message(), step) {
                (Some(message), _) => Message::BackendRejected(message.to_string()),
                (None, SubmissionStep::Address) => Message::AddressSaveFailed,
                (None, SubmissionStep::Shipping) => Message::ShippingSaveFailed,
                (None, SubmissionStep::Cart) => Message::CartNotSynced,
                (None, _) => Message::PurchaseFailed,
            },
            Self::MissingRedirectLink(detail) => Message::MissingRedirectLink(detail.clone()),
            Self::PaymentFormUnavailable(_) => Message::PaymentFormUnavailable,
        }
    }

    /// Whether this is a server-side fault worth reporting to Sentry.
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Backend { .. } | Self::MissingRedirectLink(_) | Self::PaymentFormUnavailable(_)
        )
    }
}

/// Where a successful submission sends the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Order placed; show the confirmation.
    CashOnDelivery { order: OrderReference, total: Price },
    /// Send the shopper to the hosted payment page.
    PaymentRedirect(String),
    /// Render an auto-submitting form to the payment-request page.
    PaymentForm(WebPaymentForm),
}

/// One order submission for one checkout view.
pub struct OrderSubmission<'a> {
    pub backend: &'a dyn CommerceBackend,
    pub token_source: &'a dyn PaymentFormTokenSource,
    pub settings: &'a CheckoutConfig,
    pub view: &'a CancellationToken,
}

impl OrderSubmission<'_> {
    /// Run the submission sequence.
    ///
    /// Preconditions are checked before any network call, in order:
    /// shipping chosen, payment chosen, local cart non-empty, guest ready.
    /// Nothing already persisted is rolled back on failure.
    ///
    /// # Errors
    ///
    /// Returns the first failing step; see [`CheckoutError::message`].
    #[instrument(skip_all, fields(guest = guest.map(GuestId::as_str)))]
    pub async fn submit(
        &self,
        wizard: &CheckoutWizard,
        cart: &LocalCart,
        guest: Option<&GuestId>,
    ) -> Result<SubmissionOutcome, CheckoutError> {
        let (shipping, payment) = wizard
            .submission_selections()
            .map_err(CheckoutError::Precondition)?;
        if cart.is_empty() {
            return Err(CheckoutError::Precondition(Message::CartEmpty));
        }
        let guest = guest.ok_or(CheckoutError::Precondition(Message::GuestNotReady))?;

        let address = NewAddress::from_draft(&wizard.draft, guest, &self.settings.fallback_email);
        let address_id = self.create_address(&address).await?;
        add_breadcrumb(
            "checkout",
            "Address saved",
            Some(&[("address_id", &address_id.to_string())]),
        );

        self.ensure_live()?;
        let group = cart_group(self.backend, guest)
            .await
            .map_err(CheckoutError::backend(SubmissionStep::Cart))?
            .ok_or(CheckoutError::CartNotSynced)?;

        self.ensure_live()?;
        self.backend
            .choose_shipping(shipping.method, &group, guest)
            .await
            .map_err(CheckoutError::backend(SubmissionStep::Shipping))?;

        self.ensure_live()?;
        if payment.kind.is_cash_on_delivery() {
            self.place_cash_order(&address, address_id, shipping, &payment, cart)
                .await
        } else {
            self.start_digital_payment(guest, address_id, &payment).await
        }
    }

    fn ensure_live(&self) -> Result<(), CheckoutError> {
        if self.view.is_cancelled() {
            return Err(CheckoutError::Superseded);
        }
        Ok(())
    }

    /// Create the address record, polling the address list when the
    /// response carries no id.
    async fn create_address(&self, address: &NewAddress) -> Result<AddressId, CheckoutError> {
        let created = self
            .backend
            .add_address(address)
            .await
            .map_err(CheckoutError::backend(SubmissionStep::Address))?;
        if let Some(id) = created {
            return Ok(id);
        }

        tracing::debug!("Address response had no id, polling address list");
        for attempt in 1..=ADDRESS_POLL_ATTEMPTS {
            self.ensure_live()?;
            let ids = self
                .backend
                .list_addresses(&address.guest_id)
                .await
                .map_err(CheckoutError::backend(SubmissionStep::Address))?;
            if let Some(id) = ids.into_iter().max() {
                tracing::debug!(attempt, address_id = %id, "Found address by polling");
                return Ok(id);
            }
            if attempt < ADDRESS_POLL_ATTEMPTS {
                tokio::select! {
                    () = self.view.cancelled() => return Err(CheckoutError::Superseded),
                    () = tokio::time::sleep(ADDRESS_POLL_INTERVAL) => {}
                }
            }
        }

        tracing::warn!(
            attempts = ADDRESS_POLL_ATTEMPTS,
            "Address never appeared in address list"
        );
        Err(CheckoutError::AddressNotSaved)
    }

    async fn place_cash_order(
        &self,
        address: &NewAddress,
        address_id: AddressId,
        shipping: ShippingSelection,
        payment: &PaymentSelection,
        cart: &LocalCart,
    ) -> Result<SubmissionOutcome, CheckoutError> {
        let request = PlaceOrderRequest::new(address, address_id, shipping, payment, cart.lines());
        let order = self
            .backend
            .place_order(&request)
            .await
            .map_err(CheckoutError::backend(SubmissionStep::Order))?;

        let total = cart.subtotal() + shipping.cost;
        tracing::info!(order = %order, total = %total, "Cash-on-delivery order placed");
        add_breadcrumb(
            "checkout",
            "Order placed",
            Some(&[("order_id", order.as_str())]),
        );
        Ok(SubmissionOutcome::CashOnDelivery { order, total })
    }

    async fn start_digital_payment(
        &self,
        guest: &GuestId,
        address_id: AddressId,
        payment: &PaymentSelection,
    ) -> Result<SubmissionOutcome, CheckoutError> {
        let callback = &self.settings.payment_callback_url;

        match self.settings.payment_mode {
            PaymentMode::Redirect => {
                let request = DigitalPaymentRequest::new(guest, address_id, payment, callback);
                let outcome = self
                    .backend
                    .digital_payment(&request)
                    .await
                    .map_err(CheckoutError::backend(SubmissionStep::Payment))?;
                match outcome {
                    DigitalPaymentOutcome::Redirect(link) => {
                        tracing::info!(method = %payment.key, "Redirecting to payment gateway");
                        Ok(SubmissionOutcome::PaymentRedirect(link))
                    }
                    DigitalPaymentOutcome::Rejected(message) => {
                        Err(CheckoutError::MissingRedirectLink(message))
                    }
                }
            }
            PaymentMode::Form => {
                let token = self
                    .token_source
                    .obtain_payment_form_token()
                    .await
                    .map_err(CheckoutError::PaymentFormUnavailable)?;
                Ok(SubmissionOutcome::PaymentForm(WebPaymentForm::new(
                    self.token_source.form_action(),
                    token,
                    guest,
                    payment,
                    Some(callback),
                    Some(address_id),
                    None,
                )))
            }
        }
    }
}

/// Clear the local cart shortly after a cash-on-delivery order.
///
/// The cart is kept if `view` is cancelled first; the navigation flag is
/// reset either way. The session is saved explicitly because the request
/// that scheduled this has already responded.
pub fn schedule_cart_clear(session: ShopperSession, view: CancellationToken) {
    tokio::spawn(async move {
        let cancelled = tokio::select! {
            () = view.cancelled() => true,
            () = tokio::time::sleep(CART_CLEAR_DELAY) => false,
        };

        let cleared = async {
            if !cancelled {
                session.save_cart(&LocalCart::new()).await?;
            }
            session.set_navigating_to_success(false).await?;
            session.inner().save().await
        };
        if let Err(e) = cleared.await {
            tracing::warn!(error = %e, "Failed to clear cart after order");
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use tower_sessions::{MemoryStore, Session};

    use awis_core::{
        AddressDraft, CartLine, Email, PaymentMethodKind, ProductId, SellerId, SellerKind,
        WizardEvent,
    };

    use super::*;
    use crate::backend::BackendCartLine;
    use crate::backend::types::parse_cart;
    use crate::backend::fake::{FakeBackend, Failure};

    struct FakeTokenSource;

    #[async_trait]
    impl PaymentFormTokenSource for FakeTokenSource {
        async fn obtain_payment_form_token(&self) -> Result<String, BackendError> {
            Ok("csrf-tok".to_string())
        }

        fn form_action(&self) -> &str {
            "https://awisapp.com/customer/web-payment-request"
        }
    }

    fn price(s: &str) -> Price {
        Price::new(Decimal::from_str(s).unwrap())
    }

    fn settings(mode: PaymentMode) -> CheckoutConfig {
        CheckoutConfig {
            payment_mode: mode,
            payment_callback_url: "https://shop.example/payment/callback?flag=success&token={token}"
                .to_string(),
            fallback_email: Email::parse("orders@awisapp.com").unwrap(),
        }
    }

    fn seller() -> SellerRef {
        SellerRef {
            id: SellerId::new(3),
            kind: SellerKind::Seller,
        }
    }

    fn cart() -> LocalCart {
        let mut cart = LocalCart::new();
        cart.add(CartLine {
            product_id: ProductId::new(11),
            name: "Oud".to_string(),
            quantity: 2,
            unit_price: price("5.000"),
            variant: None,
            color: None,
            seller: seller(),
        });
        cart
    }

    fn standard() -> ShippingOption {
        ShippingOption {
            id: ShippingMethodId::new(1),
            title: "standard".to_string(),
            cost: price("2.500"),
            duration: None,
        }
    }

    fn wizard_with(payment: PaymentMethod) -> CheckoutWizard {
        let draft = AddressDraft {
            name: "Sara".to_string(),
            phone: "96551234567".to_string(),
            city: "Salmiya".to_string(),
            street: "Block 4".to_string(),
            ..AddressDraft::default()
        };
        CheckoutWizard::new()
            .apply(WizardEvent::AddressSubmitted(draft))
            .apply(WizardEvent::ShippingOptionsLoaded(Ok(vec![standard()])))
            .apply(WizardEvent::PaymentMethodsLoaded(Ok(vec![payment])))
    }

    async fn submit(
        backend: &FakeBackend,
        mode: PaymentMode,
        wizard: &CheckoutWizard,
    ) -> Result<SubmissionOutcome, CheckoutError> {
        let settings = settings(mode);
        let view = CancellationToken::new();
        OrderSubmission {
            backend,
            token_source: &FakeTokenSource,
            settings: &settings,
            view: &view,
        }
        .submit(wizard, &cart(), Some(&GuestId::new("guest-1")))
        .await
    }

    // =========================================================================
    // Step 2 loading
    // =========================================================================

    #[tokio::test]
    async fn test_shipping_falls_back_to_admin_seller() {
        let backend = FakeBackend::new();
        backend.set_admin_shipping(vec![standard()]);

        let options = load_shipping_options(&backend, &cart(), &GuestId::new("g"))
            .await
            .unwrap();

        assert_eq!(options, vec![standard()]);
        assert_eq!(
            backend.call_log(),
            vec!["shipping_methods", "shipping_methods_admin"]
        );
    }

    #[tokio::test]
    async fn test_shipping_unavailable_when_all_empty() {
        let backend = FakeBackend::new();
        let result = load_shipping_options(&backend, &cart(), &GuestId::new("g")).await;
        assert_eq!(result, Err(Message::ShippingUnavailable));
    }

    #[tokio::test]
    async fn test_shipping_failure_message() {
        let backend = FakeBackend::new();
        backend.fail_shipping(Failure::Api("down".to_string()));
        let result = load_shipping_options(&backend, &cart(), &GuestId::new("g")).await;
        assert_eq!(result, Err(Message::ShippingOptionsFailed));
    }

    #[tokio::test]
    async fn test_payment_methods_synthesize_cod() {
        let backend = FakeBackend::new();
        backend.set_payment_methods(vec![PaymentMethod::new("fatoorah", "MyFatoorah")], true);

        let methods = load_payment_methods(&backend, Language::En).await.unwrap();

        assert_eq!(methods.len(), 2);
        assert_eq!(methods[1].kind, PaymentMethodKind::CashOnDelivery);
        assert_eq!(methods[1].label, "Cash on Delivery");
    }

    #[tokio::test]
    async fn test_payment_methods_failure_is_independent_of_shipping() {
        let backend = FakeBackend::new();
        backend.set_seller_shipping(vec![standard()]);

        let (shipping, payment) =
            load_step_two(&backend, &cart(), &GuestId::new("g"), Language::Ar).await;

        assert_eq!(shipping, Ok(vec![standard()]));
        assert_eq!(payment, Err(Message::PaymentMethodsFailed));
    }

    #[tokio::test]
    async fn test_country_list_unauthorized() {
        let backend = FakeBackend::new();
        backend.set_countries(Err(Failure::Unauthorized));
        let result = load_countries(&backend, &GuestId::new("g")).await;
        assert_eq!(result, Err(Message::CountryListUnauthorized));
    }

    #[tokio::test]
    async fn test_country_list_other_failure() {
        let backend = FakeBackend::new();
        backend.set_countries(Err(Failure::Api("boom".to_string())));
        let result = load_countries(&backend, &GuestId::new("g")).await;
        assert_eq!(result, Err(Message::CountryListFailed));
    }

    // =========================================================================
    // Shipping persistence
    // =========================================================================

    #[tokio::test]
    async fn test_persist_shipping_uses_cart_group() {
        let backend = FakeBackend::new();
        persist_shipping(&backend, ShippingMethodId::new(1), &GuestId::new("g"))
            .await
            .unwrap();
        assert_eq!(
            backend.chosen(),
            vec![(ShippingMethodId::new(1), CartGroupId::new("group-1"))]
        );
    }

    #[tokio::test]
    async fn test_persist_shipping_numeric_group() {
        let backend = FakeBackend::new();
        backend.set_cart(parse_cart(serde_json::json!([
            {"cart_group_id": 12, "product_id": "11", "quantity": "2"}
        ])));
        persist_shipping(&backend, ShippingMethodId::new(1), &GuestId::new("g"))
            .await
            .unwrap();
        assert_eq!(backend.chosen()[0].1, CartGroupId::new("12"));
    }

    #[tokio::test]
    async fn test_persist_shipping_default_group() {
        let backend = FakeBackend::new();
        backend.set_cart(vec![BackendCartLine {
            cart_group_id: None,
            product_id: None,
            quantity: None,
        }]);
        persist_shipping(&backend, ShippingMethodId::new(1), &GuestId::new("g"))
            .await
            .unwrap();
        assert_eq!(backend.chosen()[0].1, CartGroupId::fallback());
    }

    #[tokio::test]
    async fn test_persist_shipping_empty_cart() {
        let backend = FakeBackend::new();
        backend.set_cart(Vec::new());
        let result = persist_shipping(&backend, ShippingMethodId::new(1), &GuestId::new("g")).await;
        assert_eq!(result, Err(Message::CartNotSynced));
        assert_eq!(backend.calls("choose_shipping"), 0);
    }

    #[tokio::test]
    async fn test_persist_shipping_failure() {
        let backend = FakeBackend::new();
        backend.fail_choose(Failure::Api(String::new()));
        let result = persist_shipping(&backend, ShippingMethodId::new(1), &GuestId::new("g")).await;
        assert_eq!(result, Err(Message::ShippingSaveFailed));
    }

    // =========================================================================
    // Submission
    // =========================================================================

    #[tokio::test]
    async fn test_cod_places_order_and_never_calls_digital() {
        let backend = FakeBackend::new();
        backend.set_order(OrderReference::new("1001"));
        let wizard = wizard_with(PaymentMethod::cash_on_delivery(Language::Ar));

        let outcome = submit(&backend, PaymentMode::Redirect, &wizard).await.unwrap();

        assert_eq!(
            outcome,
            SubmissionOutcome::CashOnDelivery {
                order: OrderReference::new("1001"),
                total: price("12.500"),
            }
        );
        assert_eq!(
            backend.call_log(),
            vec!["add_address", "cart", "choose_shipping", "place_order"]
        );
        let placed = &backend.placed()[0];
        assert_eq!(placed.address_id, AddressId::new(7));
        assert_eq!(placed.shipping_cost, price("2.500"));
        assert_eq!(placed.email, "orders@awisapp.com");
    }

    #[tokio::test]
    async fn test_digital_redirects_and_never_places_order() {
        let backend = FakeBackend::new();
        backend.set_digital(DigitalPaymentOutcome::Redirect(
            "https://pay.example/x".to_string(),
        ));
        let wizard = wizard_with(PaymentMethod::new("fatoorah", "MyFatoorah"));

        let outcome = submit(&backend, PaymentMode::Redirect, &wizard).await.unwrap();

        assert_eq!(
            outcome,
            SubmissionOutcome::PaymentRedirect("https://pay.example/x".to_string())
        );
        assert_eq!(backend.calls("place_order"), 0);
        let request = &backend.digital_requests()[0];
        assert_eq!(request.payment_method, "fatoorah");
        assert_eq!(request.payment_platform, "web");
        assert_eq!(request.payment_request_from, "app");
        assert_eq!(request.billing_address_id, AddressId::new(7));
    }

    #[tokio::test]
    async fn test_digital_without_link_carries_backend_message() {
        let backend = FakeBackend::new();
        backend.set_digital(DigitalPaymentOutcome::Rejected("Gateway disabled".to_string()));
        let wizard = wizard_with(PaymentMethod::new("fatoorah", "MyFatoorah"));

        let err = submit(&backend, PaymentMode::Redirect, &wizard)
            .await
            .unwrap_err();

        let text = err.message().localize(Language::En).into_owned();
        assert!(text.contains("Gateway disabled"), "{text}");
        assert_eq!(backend.calls("place_order"), 0);
    }

    #[tokio::test]
    async fn test_form_mode_builds_payment_form() {
        let backend = FakeBackend::new();
        let wizard = wizard_with(PaymentMethod::new("fatoorah", "MyFatoorah"));

        let outcome = submit(&backend, PaymentMode::Form, &wizard).await.unwrap();

        let SubmissionOutcome::PaymentForm(form) = outcome else {
            panic!("expected payment form");
        };
        assert_eq!(form.fields[0], ("_token", "csrf-tok".to_string()));
        assert_eq!(backend.calls("digital_payment"), 0);
    }

    #[tokio::test]
    async fn test_empty_backend_cart_stops_before_shipping_and_order() {
        let backend = FakeBackend::new();
        backend.set_cart(Vec::new());
        let wizard = wizard_with(PaymentMethod::cash_on_delivery(Language::Ar));

        let err = submit(&backend, PaymentMode::Redirect, &wizard)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::CartNotSynced));
        assert_eq!(err.message(), Message::CartNotSynced);
        assert_eq!(backend.calls("choose_shipping"), 0);
        assert_eq!(backend.calls("place_order"), 0);
        assert_eq!(backend.calls("digital_payment"), 0);
    }

    #[tokio::test]
    async fn test_preconditions_in_order() {
        let backend = FakeBackend::new();
        let settings = settings(PaymentMode::Redirect);
        let view = CancellationToken::new();
        let submission = OrderSubmission {
            backend: &backend,
            token_source: &FakeTokenSource,
            settings: &settings,
            view: &view,
        };
        let guest = GuestId::new("g");

        let mut wizard = wizard_with(PaymentMethod::cash_on_delivery(Language::Ar));
        wizard.shipping = None;
        wizard.payment = None;
        let err = submission
            .submit(&wizard, &LocalCart::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.message(), Message::ShippingNotChosen);

        wizard.shipping = Some(standard().selection());
        let err = submission
            .submit(&wizard, &LocalCart::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.message(), Message::PaymentNotChosen);

        wizard.payment = Some(PaymentMethod::cash_on_delivery(Language::Ar).selection());
        let err = submission
            .submit(&wizard, &LocalCart::new(), Some(&guest))
            .await
            .unwrap_err();
        assert_eq!(err.message(), Message::CartEmpty);

        let err = submission.submit(&wizard, &cart(), None).await.unwrap_err();
        assert_eq!(err.message(), Message::GuestNotReady);

        assert!(backend.call_log().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_address_polling_gives_up_after_five_attempts() {
        let backend = FakeBackend::new();
        backend.set_created_address(None);
        let wizard = wizard_with(PaymentMethod::cash_on_delivery(Language::Ar));

        let err = submit(&backend, PaymentMode::Redirect, &wizard)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::AddressNotSaved));
        assert_eq!(err.message(), Message::AddressSaveFailed);
        let times = backend.list_times();
        assert_eq!(times.len(), ADDRESS_POLL_ATTEMPTS);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= ADDRESS_POLL_INTERVAL);
        }
        assert_eq!(backend.calls("cart"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_address_polling_picks_highest_id() {
        let backend = FakeBackend::new();
        backend.set_created_address(None);
        backend.set_listed_addresses(vec![AddressId::new(4), AddressId::new(12), AddressId::new(9)]);
        let wizard = wizard_with(PaymentMethod::cash_on_delivery(Language::Ar));

        submit(&backend, PaymentMode::Redirect, &wizard).await.unwrap();

        assert_eq!(backend.calls("list_addresses"), 1);
        assert_eq!(backend.placed()[0].address_id, AddressId::new(12));
    }

    #[tokio::test]
    async fn test_superseded_view_stops_submission() {
        let backend = FakeBackend::new();
        let settings = settings(PaymentMode::Redirect);
        let view = CancellationToken::new();
        view.cancel();
        let wizard = wizard_with(PaymentMethod::cash_on_delivery(Language::Ar));

        let err = OrderSubmission {
            backend: &backend,
            token_source: &FakeTokenSource,
            settings: &settings,
            view: &view,
        }
        .submit(&wizard, &cart(), Some(&GuestId::new("g")))
        .await
        .unwrap_err();

        assert!(matches!(err, CheckoutError::Superseded));
        assert_eq!(backend.calls("place_order"), 0);
    }

    #[tokio::test]
    async fn test_backend_message_is_surfaced() {
        let backend = FakeBackend::new();
        backend.fail_address(Failure::Api("Phone number is invalid".to_string()));
        let wizard = wizard_with(PaymentMethod::cash_on_delivery(Language::Ar));

        let err = submit(&backend, PaymentMode::Redirect, &wizard)
            .await
            .unwrap_err();

        assert_eq!(
            err.message(),
            Message::BackendRejected("Phone number is invalid".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cart_cleared_after_delay() {
        let session = ShopperSession::new(Session::new(
            None,
            Arc::new(MemoryStore::default()),
            None,
        ));
        session.save_cart(&cart()).await.unwrap();
        session.set_navigating_to_success(true).await.unwrap();

        schedule_cart_clear(session.clone(), CancellationToken::new());
        tokio::time::sleep(CART_CLEAR_DELAY + Duration::from_millis(10)).await;

        assert!(session.cart().await.unwrap().is_empty());
        assert!(!session.navigating_to_success().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cart_kept_when_view_cancelled() {
        let session = ShopperSession::new(Session::new(
            None,
            Arc::new(MemoryStore::default()),
            None,
        ));
        session.save_cart(&cart()).await.unwrap();
        session.set_navigating_to_success(true).await.unwrap();
        let view = CancellationToken::new();

        schedule_cart_clear(session.clone(), view.clone());
        view.cancel();
        tokio::time::sleep(CART_CLEAR_DELAY * 2).await;

        assert!(!session.cart().await.unwrap().is_empty());
        // An empty cart must still send the shopper back to /cart later
        assert!(!session.navigating_to_success().await.unwrap());
    }
}
