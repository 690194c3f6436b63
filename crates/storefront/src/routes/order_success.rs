//! Order confirmation page.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use awis_core::{Language, PaymentMethod, Price, PriceFormat};

use crate::filters;
use crate::labels::Labels;
use crate::middleware::CspNonce;
use crate::models::ShopperSession;
use crate::routes::Page;
use crate::routes::home::ContactView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub id: Option<String>,
    pub total: Option<String>,
    pub payment: Option<String>,
}

/// Confirmation page template, shared with the payment callback.
#[derive(Template, WebTemplate)]
#[template(path = "order_success.html")]
pub struct OrderSuccessTemplate {
    pub page: Page,
    pub order_id: String,
    pub total: Option<String>,
    pub payment: Option<String>,
    pub contacts: ContactView,
}

/// Display text for the `total` query value.
///
/// Formatted with the store's price format when it is known, otherwise
/// shown as received next to the currency word.
#[must_use]
pub fn display_total(raw: &str, format: Option<&PriceFormat>, labels: &Labels) -> String {
    match (Decimal::from_str(raw.trim()), format) {
        (Ok(amount), Some(format)) => format.format(Price::new(amount)),
        _ => format!("{} {}", raw.trim(), labels.currency_word),
    }
}

/// Display text for the `payment` query value.
#[must_use]
pub fn display_payment(raw: &str, lang: Language) -> String {
    if raw == PaymentMethod::COD_KEY {
        PaymentMethod::cash_on_delivery_label(lang).to_string()
    } else {
        raw.to_string()
    }
}

/// Show the confirmation for a placed order.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: ShopperSession,
    nonce: CspNonce,
    Query(query): Query<SuccessQuery>,
) -> Response {
    let Some(order_id) = query.id.filter(|id| !id.trim().is_empty()) else {
        return Redirect::to("/").into_response();
    };
    let lang = session.language(state.config().default_language).await;
    let labels = Labels::for_language(lang);

    let total = match query.total.filter(|t| !t.trim().is_empty()) {
        Some(raw) => {
            let format = state
                .backend()
                .display_config(lang)
                .await
                .ok()
                .map(|config| config.price_format);
            Some(display_total(&raw, format.as_ref(), labels))
        }
        None => None,
    };

    OrderSuccessTemplate {
        page: Page::new(&state, lang, nonce),
        order_id,
        total,
        payment: query
            .payment
            .filter(|p| !p.is_empty())
            .map(|p| display_payment(&p, lang)),
        contacts: ContactView::for_state(&state),
    }
    .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_total() {
        let labels = Labels::for_language(Language::En);
        assert_eq!(
            display_total("12.5", Some(&PriceFormat::default()), labels),
            "12.500 د.ك"
        );
        assert_eq!(display_total("12.5", None, labels), "12.5 KWD");
        assert_eq!(
            display_total("n/a", Some(&PriceFormat::default()), labels),
            "n/a KWD"
        );
    }

    #[test]
    fn test_display_payment() {
        assert_eq!(display_payment("cod", Language::En), "Cash on Delivery");
        assert_eq!(display_payment("cod", Language::Ar), "الدفع عند الاستلام");
        assert_eq!(display_payment("knet", Language::En), "knet");
    }
}
