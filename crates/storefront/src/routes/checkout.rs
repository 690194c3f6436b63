//! Checkout wizard route handlers.
//!
//! Every POST mutates the wizard held in the session and redirects back to
//! `GET /checkout`, which renders whichever step the wizard is on. Backend
//! work that belongs to one checkout view runs under that view's
//! cancellation token; a superseded view writes nothing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use awis_core::{
    AddressDraft, AddressType, CheckoutStep, CheckoutWizard, Language, LocalCart, Message,
    PriceFormat, ShippingMethodId, WizardEvent,
};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::labels::Labels;
use crate::middleware::CspNonce;
use crate::models::ShopperSession;
use crate::routes::Page;
use crate::services::checkout::{load_countries, load_step_two, persist_shipping, schedule_cart_clear};
use crate::services::{OrderSubmission, SubmissionOutcome, ensure_guest};
use crate::state::AppState;

// =============================================================================
// View models
// =============================================================================

/// One entry of the country select.
#[derive(Clone)]
pub struct CountryOption {
    pub name: String,
    pub selected: bool,
}

/// Country options for the address step. The draft's current country is
/// always offered, even when the list failed to load.
fn country_options(countries: &[String], current: &str) -> Vec<CountryOption> {
    let mut options: Vec<CountryOption> = countries
        .iter()
        .map(|name| CountryOption {
            name: name.clone(),
            selected: name == current,
        })
        .collect();
    if !current.is_empty() && !countries.iter().any(|name| name == current) {
        options.insert(
            0,
            CountryOption {
                name: current.to_string(),
                selected: true,
            },
        );
    }
    options
}

#[derive(Clone)]
pub struct ShippingOptionView {
    pub id: i64,
    pub title: String,
    pub cost: String,
    pub duration: Option<String>,
    pub selected: bool,
}

#[derive(Clone)]
pub struct PaymentMethodView {
    pub key: String,
    pub label: String,
    pub selected: bool,
}

/// Order summary shown beside the step-2 choices.
#[derive(Clone)]
pub struct SummaryView {
    pub subtotal: String,
    pub shipping: Option<String>,
    pub total: String,
}

impl SummaryView {
    fn new(wizard: &CheckoutWizard, cart: &LocalCart, format: &PriceFormat) -> Self {
        let subtotal = cart.subtotal();
        let shipping = wizard.shipping.map(|s| s.cost);
        let total = shipping.map_or(subtotal, |cost| subtotal + cost);
        Self {
            subtotal: format.format(subtotal),
            shipping: shipping.map(|cost| format.format(cost)),
            total: format.format(total),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Step 1: address entry.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/address.html")]
pub struct AddressTemplate {
    pub page: Page,
    pub step: u8,
    pub draft: AddressDraft,
    pub temporary: bool,
    pub countries: Vec<CountryOption>,
    pub countries_error: Option<String>,
    pub error: Option<String>,
}

/// Step 2: shipping and payment.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/shipping_payment.html")]
pub struct ShippingPaymentTemplate {
    pub page: Page,
    pub step: u8,
    pub shipping_options: Vec<ShippingOptionView>,
    pub shipping_error: Option<String>,
    pub payment_methods: Vec<PaymentMethodView>,
    pub payment_error: Option<String>,
    pub summary: SummaryView,
    pub error: Option<String>,
    pub can_place: bool,
}

/// Shown when no guest id could be obtained; nothing else is usable.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/blocked.html")]
pub struct BlockedTemplate {
    pub page: Page,
    pub message: String,
}

/// Auto-submitting form to the payment-request page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment_form.html")]
pub struct PaymentFormTemplate {
    pub page: Page,
    pub action: String,
    pub fields: Vec<(&'static str, String)>,
}

// =============================================================================
// Forms
// =============================================================================

/// Address step form data.
#[derive(Debug, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub address_type: String,
}

impl AddressForm {
    fn into_draft(self) -> AddressDraft {
        let defaults = AddressDraft::default();
        let postal = self.postal.trim();
        AddressDraft {
            name: self.name.trim().to_string(),
            phone: AddressDraft::normalize_phone(&self.phone),
            email: self.email.trim().to_string(),
            country: self.country.trim().to_string(),
            city: self.city.trim().to_string(),
            postal: if postal.is_empty() {
                defaults.postal
            } else {
                postal.to_string()
            },
            street: self.street.trim().to_string(),
            address_type: AddressType::from_form(&self.address_type),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ShippingForm {
    pub method: i64,
}

#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub method: String,
}

// =============================================================================
// Helpers
// =============================================================================

async fn price_format(state: &AppState, lang: Language) -> PriceFormat {
    state
        .backend()
        .display_config(lang)
        .await
        .map(|config| config.price_format)
        .unwrap_or_default()
}

fn to_checkout() -> Response {
    Redirect::to("/checkout").into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Render the current checkout step.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: ShopperSession,
    nonce: CspNonce,
) -> Result<Response> {
    let lang = session.language(state.config().default_language).await;
    let cart = session.cart().await?;
    if cart.is_empty() && !session.navigating_to_success().await? {
        return Ok(Redirect::to("/cart").into_response());
    }

    let guest = match ensure_guest(state.backend(), &session).await {
        Ok(guest) => guest,
        Err(message) => {
            let page = BlockedTemplate {
                page: Page::new(&state, lang, nonce),
                message: message.localize(lang).into_owned(),
            };
            return Ok((StatusCode::SERVICE_UNAVAILABLE, page).into_response());
        }
    };

    let mut wizard = session.wizard().await?;
    if wizard.step == CheckoutStep::Completed {
        wizard = CheckoutWizard {
            draft: wizard.draft,
            ..CheckoutWizard::new()
        };
        session.save_wizard(&wizard).await?;
    }

    if wizard.step == CheckoutStep::AddressEntry {
        let countries = load_countries(state.backend(), &guest).await;
        let (countries, countries_error) = match countries {
            Ok(list) => (list, None),
            Err(message) => (Vec::new(), Some(message.localize(lang).into_owned())),
        };
        let page = AddressTemplate {
            page: Page::new(&state, lang, nonce),
            step: wizard.step.number(),
            temporary: wizard.draft.address_type == AddressType::Temporary,
            countries: country_options(&countries, &wizard.draft.country),
            countries_error,
            error: wizard.error.as_ref().map(|m| m.localize(lang).into_owned()),
            draft: wizard.draft,
        };
        return Ok(page.into_response());
    }

    if wizard.shipping_options.ready().is_none() || wizard.payment_methods.ready().is_none() {
        let view = state.views().supersede(&guest).await;
        let (shipping, payment) = load_step_two(state.backend(), &cart, &guest, lang).await;
        if view.is_cancelled() {
            return Ok(to_checkout());
        }
        wizard = wizard
            .apply(WizardEvent::ShippingOptionsLoaded(shipping))
            .apply(WizardEvent::PaymentMethodsLoaded(payment));
        session.save_wizard(&wizard).await?;
    }

    let format = price_format(&state, lang).await;
    let labels = Labels::for_language(lang);
    let shipping_options = wizard
        .shipping_options
        .ready()
        .map(|options| {
            options
                .iter()
                .map(|option| ShippingOptionView {
                    id: option.id.as_i64(),
                    title: if option.title.trim().is_empty() {
                        labels.fast_delivery.to_string()
                    } else {
                        option.title.clone()
                    },
                    cost: format.format(option.cost),
                    duration: option.duration.clone(),
                    selected: wizard.shipping.is_some_and(|s| s.method == option.id),
                })
                .collect()
        })
        .unwrap_or_default();
    let payment_methods = wizard
        .payment_methods
        .ready()
        .map(|methods| {
            methods
                .iter()
                .map(|method| PaymentMethodView {
                    key: method.key.clone(),
                    label: method.label.clone(),
                    selected: wizard.payment.as_ref().is_some_and(|p| p.key == method.key),
                })
                .collect()
        })
        .unwrap_or_default();

    let page = ShippingPaymentTemplate {
        step: wizard.step.number(),
        shipping_options,
        shipping_error: wizard
            .shipping_options
            .error()
            .map(|m| m.localize(lang).into_owned()),
        payment_methods,
        payment_error: wizard
            .payment_methods
            .error()
            .map(|m| m.localize(lang).into_owned()),
        summary: SummaryView::new(&wizard, &cart, &format),
        error: wizard.error.as_ref().map(|m| m.localize(lang).into_owned()),
        can_place: wizard.submission_selections().is_ok(),
        page: Page::new(&state, lang, nonce),
    };
    Ok(page.into_response())
}

/// Submit the address step.
#[instrument(skip(state, session, form))]
pub async fn submit_address(
    State(state): State<AppState>,
    session: ShopperSession,
    Form(form): Form<AddressForm>,
) -> Result<Redirect> {
    let wizard = session
        .wizard()
        .await?
        .apply(WizardEvent::AddressSubmitted(form.into_draft()));

    if wizard.step == CheckoutStep::ShippingAndPayment {
        if let Some(guest) = session.guest_id().await? {
            state.views().supersede(&guest).await;
        }
        add_breadcrumb("checkout", "Address step completed", None);
    }

    session.save_wizard(&wizard).await?;
    Ok(Redirect::to("/checkout"))
}

/// Return to the address step, abandoning any in-flight step-2 work.
#[instrument(skip(state, session))]
pub async fn back(State(state): State<AppState>, session: ShopperSession) -> Result<Redirect> {
    if let Some(guest) = session.guest_id().await? {
        state.views().supersede(&guest).await;
    }
    let wizard = session.wizard().await?.apply(WizardEvent::Back);
    session.save_wizard(&wizard).await?;
    Ok(Redirect::to("/checkout"))
}

/// Choose a shipping method and persist it against the backend cart.
#[instrument(skip(state, session), fields(method = form.method))]
pub async fn choose_shipping(
    State(state): State<AppState>,
    session: ShopperSession,
    Form(form): Form<ShippingForm>,
) -> Result<Redirect> {
    let method = ShippingMethodId::new(form.method);
    let wizard = session.wizard().await?;

    let event = if wizard.shipping_option(method).is_none() {
        WizardEvent::ShippingChosen(method)
    } else if let Some(guest) = session.guest_id().await? {
        let view = state.views().current(&guest).await;
        let persisted = persist_shipping(state.backend(), method, &guest).await;
        if view.is_cancelled() {
            return Ok(Redirect::to("/checkout"));
        }
        match persisted {
            Ok(()) => WizardEvent::ShippingChosen(method),
            Err(message) => WizardEvent::ShippingChoiceFailed(message),
        }
    } else {
        WizardEvent::ShippingChoiceFailed(Message::GuestNotReady)
    };

    session.save_wizard(&wizard.apply(event)).await?;
    Ok(Redirect::to("/checkout"))
}

/// Choose a payment method. Nothing is sent to the backend until placement.
#[instrument(skip(session), fields(method = %form.method))]
pub async fn choose_payment(
    session: ShopperSession,
    Form(form): Form<PaymentForm>,
) -> Result<Redirect> {
    let wizard = session
        .wizard()
        .await?
        .apply(WizardEvent::PaymentChosen(form.method));
    session.save_wizard(&wizard).await?;
    Ok(Redirect::to("/checkout"))
}

/// Place the order.
///
/// The in-progress flag is only held in memory: the session is written once
/// the submission has an outcome, and not at all if the view was superseded
/// while it ran.
#[instrument(skip(state, session, nonce))]
pub async fn place_order(
    State(state): State<AppState>,
    session: ShopperSession,
    nonce: CspNonce,
) -> Result<Response> {
    let lang = session.language(state.config().default_language).await;
    let wizard = session.wizard().await?.apply(WizardEvent::SubmissionStarted);
    if !wizard.placing {
        session.save_wizard(&wizard).await?;
        return Ok(to_checkout());
    }

    let cart = session.cart().await?;
    let guest = session.guest_id().await?;
    let view = match &guest {
        Some(guest) => state.views().current(guest).await,
        None => CancellationToken::new(),
    };

    let submission = OrderSubmission {
        backend: state.backend(),
        token_source: state.payment_form(),
        settings: &state.config().checkout,
        view: &view,
    };
    let outcome = submission.submit(&wizard, &cart, guest.as_ref()).await;
    if view.is_cancelled() {
        tracing::debug!("Checkout view superseded during submission");
        return Ok(to_checkout());
    }

    match outcome {
        Ok(SubmissionOutcome::CashOnDelivery { order, total }) => {
            let success_view = match &guest {
                Some(guest) => state.views().supersede(guest).await,
                None => CancellationToken::new(),
            };
            session
                .save_wizard(&wizard.apply(WizardEvent::OrderCompleted))
                .await?;
            session.set_navigating_to_success(true).await?;
            schedule_cart_clear(session.clone(), success_view);

            let location = format!(
                "/order-success?id={}&total={}&payment=cod",
                urlencoding::encode(order.as_str()),
                urlencoding::encode(&total.to_string()),
            );
            Ok(Redirect::to(&location).into_response())
        }
        Ok(SubmissionOutcome::PaymentRedirect(link)) => {
            session.mark_payment_attempt().await?;
            Ok(Redirect::to(&link).into_response())
        }
        Ok(SubmissionOutcome::PaymentForm(form)) => {
            session.mark_payment_attempt().await?;
            let page = PaymentFormTemplate {
                page: Page::new(&state, lang, nonce),
                action: form.action,
                fields: form.fields,
            };
            Ok(page.into_response())
        }
        Err(e) => {
            if e.is_server_fault() {
                tracing::error!(error = %e, "Order submission failed");
            } else {
                tracing::warn!(error = %e, "Order submission stopped");
            }
            session
                .save_wizard(&wizard.apply(WizardEvent::SubmissionFailed(e.message())))
                .await?;
            Ok(to_checkout())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_country_options_keep_current() {
        let countries = vec!["Kuwait".to_string(), "Oman".to_string()];
        let options = country_options(&countries, "Oman");
        assert_eq!(options.len(), 2);
        assert!(options[1].selected);

        let options = country_options(&[], "Kuwait");
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].name, "Kuwait");
        assert!(options[0].selected);
    }

    #[test]
    fn test_address_form_into_draft() {
        let form = AddressForm {
            name: "  Sara ".to_string(),
            phone: "+965 5123-4567".to_string(),
            email: String::new(),
            country: "Kuwait".to_string(),
            city: "Salmiya".to_string(),
            postal: " ".to_string(),
            street: "Block 10".to_string(),
            address_type: "مؤقت".to_string(),
        };
        let draft = form.into_draft();
        assert_eq!(draft.name, "Sara");
        assert_eq!(draft.phone, "96551234567");
        assert_eq!(draft.postal, "00000");
        assert_eq!(draft.address_type, AddressType::Temporary);
        assert!(draft.is_complete());
    }

    #[test]
    fn test_summary_adds_chosen_shipping() {
        use std::str::FromStr;

        use awis_core::{Price, ShippingSelection};
        use rust_decimal::Decimal;

        let wizard = CheckoutWizard {
            shipping: Some(ShippingSelection {
                method: ShippingMethodId::new(1),
                cost: Price::new(Decimal::from_str("1.5").unwrap()),
            }),
            ..CheckoutWizard::new()
        };
        let summary = SummaryView::new(&wizard, &LocalCart::new(), &PriceFormat::default());
        assert_eq!(summary.shipping.as_deref(), Some("1.500 د.ك"));
        assert_eq!(summary.total, "1.500 د.ك");
    }
}
