//! HTTP client for the commerce backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use awis_core::{
    AddressId, CartGroupId, GuestId, Language, OrderReference, SellerRef, ShippingMethodId,
    ShippingOption,
};

use super::types::{
    BackendCartLine, ChooseShippingRequest, DigitalPaymentOutcome, DigitalPaymentRequest,
    DisplayConfig, NewAddress, PlaceOrderRequest, created_address_id, issued_guest_id,
    listed_address_ids, parse_cart, parse_countries, parse_shipping_options,
    placed_order_reference,
};
use super::{BackendError, CommerceBackend};
use crate::config::BackendConfig;

/// How long a display configuration stays cached per language.
const CONFIG_TTL: Duration = Duration::from_secs(300);

/// Longest body excerpt kept in logs and error messages.
const BODY_EXCERPT: usize = 200;

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the commerce backend REST API.
///
/// Display configuration is cached for 5 minutes per language; nothing else
/// is cached because it is per-guest and changes with every checkout.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    api_base: String,
    config_cache: Cache<Language, DisplayConfig>,
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let config_cache = Cache::builder()
            .max_capacity(8)
            .time_to_live(CONFIG_TTL)
            .build();

        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                api_base: config.api_base_url.as_str().trim_end_matches('/').to_string(),
                config_cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.api_base)
    }

    fn guest_url(&self, path: &str, guest: &GuestId) -> String {
        format!(
            "{}{path}?guest_id={}",
            self.inner.api_base,
            urlencoding::encode(guest.as_str())
        )
    }

    async fn get(&self, url: &str) -> Result<Value, BackendError> {
        let response = self.inner.client.get(url).send().await?;
        read_json(response).await
    }

    async fn post<B: Serialize + Sync>(&self, url: &str, body: &B) -> Result<Value, BackendError> {
        let response = self.inner.client.post(url).json(body).send().await?;
        read_json(response).await
    }
}

/// Read a response body as JSON, mapping failure statuses to errors.
///
/// An empty success body reads as `null`.
async fn read_json(response: reqwest::Response) -> Result<Value, BackendError> {
    let status = response.status();
    let text = response.text().await?;

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(BackendError::Unauthorized);
    }

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| text.chars().take(BODY_EXCERPT).collect());
        tracing::warn!(
            status = %status,
            body = %text.chars().take(BODY_EXCERPT).collect::<String>(),
            "Backend returned non-success status"
        );
        return Err(BackendError::Api {
            status: status.as_u16(),
            message,
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(BODY_EXCERPT).collect::<String>(),
            "Failed to parse backend response"
        );
        BackendError::Parse(e)
    })
}

#[async_trait]
impl CommerceBackend for BackendClient {
    #[instrument(skip(self))]
    async fn create_guest(&self) -> Result<GuestId, BackendError> {
        let value = self.get(&self.url("/get-guest-id")).await?;
        issued_guest_id(&value).ok_or(BackendError::MissingField("guest_id"))
    }

    #[instrument(skip(self), fields(lang = lang.code()))]
    async fn display_config(&self, lang: Language) -> Result<DisplayConfig, BackendError> {
        if let Some(config) = self.inner.config_cache.get(&lang).await {
            debug!("Cache hit for display config");
            return Ok(config);
        }

        let response = self
            .inner
            .client
            .get(self.url("/config"))
            .header("Accept-Language", lang.code())
            .header("X-Language", lang.code())
            .send()
            .await?;
        let config = DisplayConfig::from_json(&read_json(response).await?);

        self.inner.config_cache.insert(lang, config.clone()).await;
        Ok(config)
    }

    #[instrument(skip(self), fields(seller_id = %seller.id, seller_is = seller.kind.as_str(), guest = %guest))]
    async fn shipping_methods(
        &self,
        seller: SellerRef,
        guest: &GuestId,
    ) -> Result<Vec<ShippingOption>, BackendError> {
        let path = format!(
            "/shipping-method/by-seller/{}/{}",
            seller.id,
            seller.kind.as_str()
        );
        let value = self.get(&self.guest_url(&path, guest)).await?;
        parse_shipping_options(&value)
    }

    #[instrument(skip(self, address), fields(guest = %address.guest_id))]
    async fn add_address(&self, address: &NewAddress) -> Result<Option<AddressId>, BackendError> {
        let value = self.post(&self.url("/customer/address/add"), address).await?;
        Ok(created_address_id(&value))
    }

    #[instrument(skip(self), fields(guest = %guest))]
    async fn list_addresses(&self, guest: &GuestId) -> Result<Vec<AddressId>, BackendError> {
        let value = self
            .get(&self.guest_url("/customer/address/list", guest))
            .await?;
        Ok(listed_address_ids(&value))
    }

    #[instrument(skip(self), fields(method = %method, group = %group, guest = %guest))]
    async fn choose_shipping(
        &self,
        method: ShippingMethodId,
        group: &CartGroupId,
        guest: &GuestId,
    ) -> Result<(), BackendError> {
        let body = ChooseShippingRequest {
            id: method,
            cart_group_id: group,
            guest_id: guest,
        };
        self.post(&self.url("/shipping-method/choose-for-order"), &body)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(guest = %guest))]
    async fn cart(&self, guest: &GuestId) -> Result<Vec<BackendCartLine>, BackendError> {
        let value = self.get(&self.guest_url("/cart", guest)).await?;
        Ok(parse_cart(value))
    }

    #[instrument(skip(self, order), fields(guest = %order.guest_id, address_id = %order.address_id))]
    async fn place_order(&self, order: &PlaceOrderRequest) -> Result<OrderReference, BackendError> {
        let value = self.post(&self.url("/customer/order/place"), order).await?;
        Ok(placed_order_reference(&value))
    }

    #[instrument(skip(self, request), fields(guest = %request.customer_id, method = %request.payment_method))]
    async fn digital_payment(
        &self,
        request: &DigitalPaymentRequest,
    ) -> Result<DigitalPaymentOutcome, BackendError> {
        let value = self.post(&self.url("/digital-payment"), request).await?;
        Ok(DigitalPaymentOutcome::from_json(&value))
    }

    #[instrument(skip(self), fields(guest = %guest))]
    async fn allowed_countries(&self, guest: &GuestId) -> Result<Vec<String>, BackendError> {
        let value = self
            .get(&self.guest_url("/customer/get-restricted-country-list", guest))
            .await?;
        parse_countries(&value).ok_or(BackendError::MissingField("countries"))
    }
}
