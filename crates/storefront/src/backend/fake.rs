//! In-memory [`CommerceBackend`] for service tests.
//!
//! Scripted responses plus a call log, so tests can assert which endpoints
//! were hit and in what order.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use awis_core::{
    AddressId, CartGroupId, GuestId, Language, OrderReference, PaymentMethod, PriceFormat,
    SellerRef, ShippingMethodId, ShippingOption,
};

use super::{
    BackendCartLine, BackendError, CommerceBackend, DigitalPaymentOutcome, DigitalPaymentRequest,
    DisplayConfig, NewAddress, PlaceOrderRequest,
};

/// A scripted failure; `BackendError` itself is not `Clone`.
#[derive(Debug, Clone)]
pub enum Failure {
    Unauthorized,
    Api(String),
}

impl Failure {
    fn error(&self) -> BackendError {
        match self {
            Self::Unauthorized => BackendError::Unauthorized,
            Self::Api(message) => BackendError::Api {
                status: 500,
                message: message.clone(),
            },
        }
    }
}

#[derive(Default)]
struct FakeState {
    calls: Vec<&'static str>,
    guest_failure: Option<Failure>,
    seller_shipping: Vec<ShippingOption>,
    admin_shipping: Vec<ShippingOption>,
    shipping_failure: Option<Failure>,
    display: Option<DisplayConfig>,
    created_address: Option<AddressId>,
    address_failure: Option<Failure>,
    listed_addresses: Vec<AddressId>,
    list_times: Vec<Instant>,
    cart: Vec<BackendCartLine>,
    choose_failure: Option<Failure>,
    chosen: Vec<(ShippingMethodId, CartGroupId)>,
    order: Option<OrderReference>,
    placed: Vec<PlaceOrderRequest>,
    digital: Option<DigitalPaymentOutcome>,
    digital_requests: Vec<DigitalPaymentRequest>,
    countries: Option<Result<Vec<String>, Failure>>,
}

pub struct FakeBackend {
    state: Mutex<FakeState>,
}

#[allow(clippy::unwrap_used)]
impl FakeBackend {
    /// A backend with a one-line cart and an address id on creation.
    pub fn new() -> Self {
        let state = FakeState {
            created_address: Some(AddressId::new(7)),
            cart: vec![BackendCartLine {
                cart_group_id: Some(CartGroupId::new("group-1")),
                product_id: None,
                quantity: Some(1),
            }],
            ..FakeState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn calls(&self, name: &str) -> usize {
        self.with(|s| s.calls.iter().filter(|c| **c == name).count())
    }

    pub fn call_log(&self) -> Vec<&'static str> {
        self.with(|s| s.calls.clone())
    }

    pub fn fail_guest(&self) {
        self.with(|s| s.guest_failure = Some(Failure::Unauthorized));
    }

    pub fn set_seller_shipping(&self, options: Vec<ShippingOption>) {
        self.with(|s| s.seller_shipping = options);
    }

    pub fn set_admin_shipping(&self, options: Vec<ShippingOption>) {
        self.with(|s| s.admin_shipping = options);
    }

    pub fn fail_shipping(&self, failure: Failure) {
        self.with(|s| s.shipping_failure = Some(failure));
    }

    pub fn set_payment_methods(&self, methods: Vec<PaymentMethod>, cod_enabled: bool) {
        self.with(|s| {
            s.display = Some(DisplayConfig {
                payment_methods: methods,
                cod_enabled,
                price_format: PriceFormat::default(),
            });
        });
    }

    pub fn set_created_address(&self, id: Option<AddressId>) {
        self.with(|s| s.created_address = id);
    }

    pub fn fail_address(&self, failure: Failure) {
        self.with(|s| s.address_failure = Some(failure));
    }

    pub fn set_listed_addresses(&self, ids: Vec<AddressId>) {
        self.with(|s| s.listed_addresses = ids);
    }

    pub fn list_times(&self) -> Vec<Instant> {
        self.with(|s| s.list_times.clone())
    }

    pub fn set_cart(&self, lines: Vec<BackendCartLine>) {
        self.with(|s| s.cart = lines);
    }

    pub fn fail_choose(&self, failure: Failure) {
        self.with(|s| s.choose_failure = Some(failure));
    }

    pub fn chosen(&self) -> Vec<(ShippingMethodId, CartGroupId)> {
        self.with(|s| s.chosen.clone())
    }

    pub fn set_order(&self, order: OrderReference) {
        self.with(|s| s.order = Some(order));
    }

    pub fn placed(&self) -> Vec<PlaceOrderRequest> {
        self.with(|s| s.placed.clone())
    }

    pub fn set_digital(&self, outcome: DigitalPaymentOutcome) {
        self.with(|s| s.digital = Some(outcome));
    }

    pub fn digital_requests(&self) -> Vec<DigitalPaymentRequest> {
        self.with(|s| s.digital_requests.clone())
    }

    pub fn set_countries(&self, countries: Result<Vec<String>, Failure>) {
        self.with(|s| s.countries = Some(countries));
    }
}

#[async_trait]
#[allow(clippy::unwrap_used)]
impl CommerceBackend for FakeBackend {
    async fn create_guest(&self) -> Result<GuestId, BackendError> {
        self.with(|s| {
            s.calls.push("create_guest");
            match &s.guest_failure {
                Some(failure) => Err(failure.error()),
                None => Ok(GuestId::new("guest-1")),
            }
        })
    }

    async fn display_config(&self, _lang: Language) -> Result<DisplayConfig, BackendError> {
        self.with(|s| {
            s.calls.push("display_config");
            s.display.clone().ok_or(BackendError::MissingField("config"))
        })
    }

    async fn shipping_methods(
        &self,
        seller: SellerRef,
        _guest: &GuestId,
    ) -> Result<Vec<ShippingOption>, BackendError> {
        self.with(|s| {
            s.calls.push(if seller.is_admin() {
                "shipping_methods_admin"
            } else {
                "shipping_methods"
            });
            if let Some(failure) = &s.shipping_failure {
                return Err(failure.error());
            }
            Ok(if seller.is_admin() {
                s.admin_shipping.clone()
            } else {
                s.seller_shipping.clone()
            })
        })
    }

    async fn add_address(&self, _address: &NewAddress) -> Result<Option<AddressId>, BackendError> {
        self.with(|s| {
            s.calls.push("add_address");
            match &s.address_failure {
                Some(failure) => Err(failure.error()),
                None => Ok(s.created_address),
            }
        })
    }

    async fn list_addresses(&self, _guest: &GuestId) -> Result<Vec<AddressId>, BackendError> {
        self.with(|s| {
            s.calls.push("list_addresses");
            s.list_times.push(Instant::now());
            Ok(s.listed_addresses.clone())
        })
    }

    async fn choose_shipping(
        &self,
        method: ShippingMethodId,
        group: &CartGroupId,
        _guest: &GuestId,
    ) -> Result<(), BackendError> {
        self.with(|s| {
            s.calls.push("choose_shipping");
            if let Some(failure) = &s.choose_failure {
                return Err(failure.error());
            }
            s.chosen.push((method, group.clone()));
            Ok(())
        })
    }

    async fn cart(&self, _guest: &GuestId) -> Result<Vec<BackendCartLine>, BackendError> {
        self.with(|s| {
            s.calls.push("cart");
            Ok(s.cart.clone())
        })
    }

    async fn place_order(&self, order: &PlaceOrderRequest) -> Result<OrderReference, BackendError> {
        self.with(|s| {
            s.calls.push("place_order");
            s.placed.push(order.clone());
            Ok(s.order.clone().unwrap_or_else(OrderReference::cod_placeholder))
        })
    }

    async fn digital_payment(
        &self,
        request: &DigitalPaymentRequest,
    ) -> Result<DigitalPaymentOutcome, BackendError> {
        self.with(|s| {
            s.calls.push("digital_payment");
            s.digital_requests.push(request.clone());
            Ok(s
                .digital
                .clone()
                .unwrap_or_else(|| DigitalPaymentOutcome::Rejected("not scripted".to_string())))
        })
    }

    async fn allowed_countries(&self, _guest: &GuestId) -> Result<Vec<String>, BackendError> {
        self.with(|s| {
            s.calls.push("allowed_countries");
            match &s.countries {
                Some(Ok(countries)) => Ok(countries.clone()),
                Some(Err(failure)) => Err(failure.error()),
                None => Ok(vec!["Kuwait".to_string()]),
            }
        })
    }
}
