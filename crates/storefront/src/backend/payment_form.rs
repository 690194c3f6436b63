//! Hosted payment-request form.
//!
//! In `form` payment mode the storefront does not call the digital-payment
//! API. It posts a form to the backend's web payment-request page instead,
//! which needs the page's CSRF token. The token is scraped from the page
//! HTML: the `csrf-token` meta tag first, then a hidden `_token` input.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::instrument;

use awis_core::{AddressId, GuestId, PaymentSelection};

use super::BackendError;
use super::types::DigitalPaymentRequest;

/// Path of the payment-request page under the web base URL.
pub const PAYMENT_REQUEST_PATH: &str = "/customer/web-payment-request";

static META_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta name="csrf-token" content="([^"]+)""#).expect("Invalid regex")
});

static INPUT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<input[^>]+name=['"]?_token['"]?[^>]+value=['"]?([^'"> ]+)['"]?[^>]*>"#)
        .expect("Invalid regex")
});

/// Find the CSRF token in a payment-request page.
#[must_use]
pub fn scrape_csrf_token(html: &str) -> Option<String> {
    META_TOKEN_RE
        .captures(html)
        .or_else(|| INPUT_TOKEN_RE.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Source of the payment-request form's CSRF token.
#[async_trait]
pub trait PaymentFormTokenSource: Send + Sync {
    /// Fetch a fresh token.
    async fn obtain_payment_form_token(&self) -> Result<String, BackendError>;

    /// Where the form is posted.
    fn form_action(&self) -> &str;
}

/// Reads the token from the live payment-request page.
#[derive(Clone)]
pub struct WebPaymentPageClient {
    client: reqwest::Client,
    page_url: String,
}

impl WebPaymentPageClient {
    #[must_use]
    pub fn new(web_base_url: &url::Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            page_url: format!(
                "{}{PAYMENT_REQUEST_PATH}",
                web_base_url.as_str().trim_end_matches('/')
            ),
        }
    }
}

#[async_trait]
impl PaymentFormTokenSource for WebPaymentPageClient {
    #[instrument(skip(self), fields(url = %self.page_url))]
    async fn obtain_payment_form_token(&self) -> Result<String, BackendError> {
        let response = self.client.get(&self.page_url).send().await?;
        let status = response.status();
        let html = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: html.chars().take(200).collect(),
            });
        }
        scrape_csrf_token(&html).ok_or(BackendError::MissingField("_token"))
    }

    fn form_action(&self) -> &str {
        &self.page_url
    }
}

/// A ready-to-submit payment-request form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebPaymentForm {
    pub action: String,
    /// Hidden fields in submission order; absent values are left out.
    pub fields: Vec<(&'static str, String)>,
}

impl WebPaymentForm {
    #[must_use]
    pub fn new(
        action: &str,
        token: String,
        guest: &GuestId,
        payment: &PaymentSelection,
        callback: Option<&str>,
        address_id: Option<AddressId>,
        order_note: Option<&str>,
    ) -> Self {
        let candidates: [(&'static str, Option<String>); 9] = [
            ("_token", Some(token)),
            ("user_id", Some(guest.to_string())),
            ("customer_id", Some(guest.to_string())),
            ("payment_method", Some(payment.key.clone())),
            (
                "payment_platform",
                Some(DigitalPaymentRequest::PAYMENT_PLATFORM.to_string()),
            ),
            ("callback", callback.map(String::from)),
            ("address_id", address_id.map(|id| id.to_string())),
            ("billing_address_id", address_id.map(|id| id.to_string())),
            ("order_note", order_note.map(String::from)),
        ];

        Self {
            action: action.to_string(),
            fields: candidates
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v)))
                .collect(),
        }
    }
}
