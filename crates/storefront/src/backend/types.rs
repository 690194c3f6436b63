//! Request bodies and response parsing for the commerce backend.
//!
//! The backend is loosely typed: ids arrive as numbers or numeric strings,
//! prices as numbers or decimal strings, and several fields have legacy
//! aliases. Responses are therefore read as `serde_json::Value` and
//! converted leniently here, keeping the HTTP client free of field juggling.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use awis_core::{
    AddressDraft, AddressId, AddressType, CartGroupId, CartLine, Email, GuestId, Language,
    OrderReference, PaymentMethod, PaymentSelection, Price, PriceFormat, ProductId,
    ShippingMethodId, ShippingOption, ShippingSelection, SymbolPosition, with_cash_on_delivery,
};

use super::BackendError;

// =============================================================================
// Lenient JSON helpers
// =============================================================================

/// An integer id sent as a number or a numeric string.
fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A price sent as a number or a decimal string.
fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// A non-empty string field.
fn as_text(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Backend flags are `1`, `true` or `"1"`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
    }
}

// =============================================================================
// Guest identity
// =============================================================================

/// An opaque key sent as a number or a non-empty string.
fn as_key(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Guest id from `GET /get-guest-id`, sent as a number or a string.
#[must_use]
pub fn issued_guest_id(value: &Value) -> Option<GuestId> {
    value.get("guest_id").and_then(as_key).map(GuestId::new)
}

// =============================================================================
// Display configuration
// =============================================================================

/// The parts of `GET /config` the checkout uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Methods exactly as the backend listed them, already classified.
    pub payment_methods: Vec<PaymentMethod>,
    /// Whether cash on delivery is enabled store-wide.
    pub cod_enabled: bool,
    pub price_format: PriceFormat,
}

impl DisplayConfig {
    /// Parse a config response, ignoring anything malformed.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let payment_methods = value
            .get("payment_methods")
            .and_then(Value::as_array)
            .map(|methods| methods.iter().filter_map(parse_payment_method).collect())
            .unwrap_or_default();

        let cod_enabled = ["cod_status", "cash_on_delivery"]
            .iter()
            .any(|key| value.get(key).is_some_and(is_truthy));

        Self {
            payment_methods,
            cod_enabled,
            price_format: parse_price_format(value),
        }
    }

    /// Methods to offer at checkout, with cash on delivery synthesized when
    /// it is enabled but unlisted.
    #[must_use]
    pub fn checkout_payment_methods(&self, lang: Language) -> Vec<PaymentMethod> {
        with_cash_on_delivery(self.payment_methods.clone(), self.cod_enabled, lang)
    }
}

fn parse_payment_method(value: &Value) -> Option<PaymentMethod> {
    let key = ["key", "key_name"]
        .iter()
        .find_map(|field| value.get(field).and_then(as_text))?;

    let label = ["label", "name"]
        .iter()
        .find_map(|field| value.get(field).and_then(as_text))
        .or_else(|| {
            value
                .get("additional_datas")
                .and_then(|data| data.get("gateway_title"))
                .and_then(as_text)
        })
        .unwrap_or(key);

    Some(PaymentMethod::new(key, label))
}

fn parse_price_format(value: &Value) -> PriceFormat {
    let defaults = PriceFormat::default();

    let position = match value.get("currency_symbol_position").and_then(Value::as_str) {
        Some("left") => SymbolPosition::Left,
        Some("right") => SymbolPosition::Right,
        _ => defaults.position,
    };

    let decimals = value
        .get("decimal_point_settings")
        .and_then(as_id)
        .and_then(|d| u32::try_from(d).ok())
        .unwrap_or(defaults.decimals);

    let default_currency = value.get("system_default_currency").and_then(as_id);
    let symbol = value
        .get("currency_list")
        .and_then(Value::as_array)
        .and_then(|currencies| {
            currencies
                .iter()
                .find(|c| c.get("id").and_then(as_id) == default_currency)
        })
        .and_then(|currency| currency.get("symbol").and_then(as_text))
        .map_or(defaults.symbol, ToString::to_string);

    PriceFormat {
        symbol,
        position,
        decimals,
    }
}

// =============================================================================
// Shipping
// =============================================================================

/// Parse a shipping-method list. Entries without an id are skipped.
///
/// # Errors
///
/// Returns `MissingField` when the response is not a list.
pub fn parse_shipping_options(value: &Value) -> Result<Vec<ShippingOption>, BackendError> {
    let entries = value
        .as_array()
        .ok_or(BackendError::MissingField("shipping methods"))?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let id = entry.get("id").and_then(as_id)?;
            Some(ShippingOption {
                id: ShippingMethodId::new(id),
                title: entry
                    .get("title")
                    .and_then(as_text)
                    .unwrap_or_default()
                    .to_string(),
                cost: Price::new(entry.get("cost").and_then(as_decimal).unwrap_or_default()),
                duration: entry
                    .get("duration")
                    .and_then(as_text)
                    .map(ToString::to_string),
            })
        })
        .collect())
}

/// Body of `POST /shipping-method/choose-for-order`.
#[derive(Debug, Clone, Serialize)]
pub struct ChooseShippingRequest<'a> {
    pub id: ShippingMethodId,
    pub cart_group_id: &'a CartGroupId,
    pub guest_id: &'a GuestId,
}

// =============================================================================
// Addresses
// =============================================================================

/// Body of `POST /customer/address/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAddress {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub country: String,
    pub city: String,
    pub postal: String,
    #[serde(rename = "address")]
    pub street: String,
    pub address_type: AddressType,
    pub guest_id: GuestId,
}

impl NewAddress {
    /// Build the record from the shopper's draft, substituting the fallback
    /// email when none was given.
    #[must_use]
    pub fn from_draft(draft: &AddressDraft, guest: &GuestId, fallback_email: &Email) -> Self {
        Self {
            name: draft.name.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            email: draft.contact_email(fallback_email),
            country: draft.country.trim().to_string(),
            city: draft.city.trim().to_string(),
            postal: draft.postal.trim().to_string(),
            street: draft.street.trim().to_string(),
            address_type: draft.address_type,
            guest_id: guest.clone(),
        }
    }
}

/// Address id from an add-address response: `address_id`, `id` or `data.id`.
#[must_use]
pub fn created_address_id(value: &Value) -> Option<AddressId> {
    value
        .get("address_id")
        .and_then(as_id)
        .or_else(|| value.get("id").and_then(as_id))
        .or_else(|| value.get("data").and_then(|d| d.get("id")).and_then(as_id))
        .map(AddressId::new)
}

/// Ids from an address-list response. Anything but a list is empty.
#[must_use]
pub fn listed_address_ids(value: &Value) -> Vec<AddressId> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    entry
                        .get("id")
                        .and_then(as_id)
                        .or_else(|| entry.get("address_id").and_then(as_id))
                })
                .map(AddressId::new)
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// Cart
// =============================================================================

/// One line of the authoritative backend cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCartLine {
    pub cart_group_id: Option<CartGroupId>,
    pub product_id: Option<ProductId>,
    pub quantity: Option<u32>,
}

impl BackendCartLine {
    fn from_json(entry: &Value) -> Self {
        Self {
            cart_group_id: entry.get("cart_group_id").and_then(as_key).map(CartGroupId::new),
            product_id: entry.get("product_id").and_then(as_id).map(ProductId::new),
            quantity: entry
                .get("quantity")
                .and_then(as_id)
                .and_then(|q| u32::try_from(q).ok()),
        }
    }
}

/// Parse a cart response. Anything but a list is an empty cart.
///
/// Every entry counts as a line, however malformed; only the presence of
/// lines and the first group id matter to the checkout.
#[must_use]
pub fn parse_cart(value: Value) -> Vec<BackendCartLine> {
    match value {
        Value::Array(entries) => entries.iter().map(BackendCartLine::from_json).collect(),
        _ => Vec::new(),
    }
}

// =============================================================================
// Orders
// =============================================================================

/// One item of a cash-on-delivery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            variant: line.variant.clone(),
            color: line.color.clone().filter(|c| !c.is_empty()),
        }
    }
}

/// Body of `POST /customer/order/place`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceOrderRequest {
    pub address_id: AddressId,
    pub delivery: ShippingMethodId,
    pub payment: String,
    pub order_note: String,
    #[serde(rename = "cartItems")]
    pub cart_items: Vec<OrderItem>,
    pub guest_id: GuestId,
    pub country: String,
    pub city: String,
    pub postal: String,
    pub phone: String,
    pub name: String,
    pub address: String,
    pub email: String,
    pub shipping_cost: Price,
}

impl PlaceOrderRequest {
    #[must_use]
    pub fn new(
        address: &NewAddress,
        address_id: AddressId,
        shipping: ShippingSelection,
        payment: &PaymentSelection,
        lines: &[CartLine],
    ) -> Self {
        Self {
            address_id,
            delivery: shipping.method,
            payment: payment.key.clone(),
            order_note: String::new(),
            cart_items: lines.iter().map(OrderItem::from).collect(),
            guest_id: address.guest_id.clone(),
            country: address.country.clone(),
            city: address.city.clone(),
            postal: address.postal.clone(),
            phone: address.phone.clone(),
            name: address.name.clone(),
            address: address.street.clone(),
            email: address.email.clone(),
            shipping_cost: shipping.cost,
        }
    }
}

/// Order reference from a place-order response: `order_ids[0]`, else
/// `order_id`, else the cash-on-delivery placeholder.
#[must_use]
pub fn placed_order_reference(value: &Value) -> OrderReference {
    let id = value
        .get("order_ids")
        .and_then(Value::as_array)
        .and_then(|ids| ids.first())
        .or_else(|| value.get("order_id"));

    match id {
        Some(Value::Number(n)) => OrderReference::new(n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => OrderReference::new(s.trim()),
        _ => OrderReference::cod_placeholder(),
    }
}

// =============================================================================
// Digital payment
// =============================================================================

/// Body of `POST /digital-payment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigitalPaymentRequest {
    pub order_note: String,
    pub customer_id: GuestId,
    pub address_id: AddressId,
    pub billing_address_id: AddressId,
    pub coupon_code: String,
    pub coupon_discount: String,
    pub payment_method: String,
    pub is_check_create_account: bool,
    pub password: String,
    pub payment_platform: String,
    pub payment_request_from: String,
    pub external_redirect_link: String,
}

impl DigitalPaymentRequest {
    pub const PAYMENT_PLATFORM: &'static str = "web";
    pub const PAYMENT_REQUEST_FROM: &'static str = "app";

    #[must_use]
    pub fn new(
        guest: &GuestId,
        address_id: AddressId,
        payment: &PaymentSelection,
        redirect_template: &str,
    ) -> Self {
        Self {
            order_note: String::new(),
            customer_id: guest.clone(),
            address_id,
            billing_address_id: address_id,
            coupon_code: String::new(),
            coupon_discount: String::new(),
            payment_method: payment.key.clone(),
            is_check_create_account: false,
            password: String::new(),
            payment_platform: Self::PAYMENT_PLATFORM.to_string(),
            payment_request_from: Self::PAYMENT_REQUEST_FROM.to_string(),
            external_redirect_link: redirect_template.to_string(),
        }
    }
}

/// What the backend said to a digital payment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigitalPaymentOutcome {
    /// Send the shopper to the hosted payment page.
    Redirect(String),
    /// No link was returned; carries the backend's message.
    Rejected(String),
}

impl DigitalPaymentOutcome {
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        if let Some(link) = value.get("redirect_link").and_then(as_text) {
            return Self::Redirect(link.to_string());
        }
        let message = match value.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => value.to_string(),
        };
        Self::Rejected(message)
    }
}

// =============================================================================
// Countries
// =============================================================================

/// Parse an allowed-country list: a non-empty list of strings, or nothing.
#[must_use]
pub fn parse_countries(value: &Value) -> Option<Vec<String>> {
    let entries = value.as_array().filter(|e| !e.is_empty())?;
    entries
        .iter()
        .map(|c| c.as_str().map(ToString::to_string))
        .collect()
}
