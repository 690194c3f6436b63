//! Cart route handlers.
//!
//! The local cart lives in the session. Product pages post to `/cart/add`;
//! the backend keeps its own cart, which checkout reads for the cart group.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use awis_core::{
    CartLine, LocalCart, Price, PriceFormat, ProductId, SellerId, SellerKind, SellerRef,
};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::ShopperSession;
use crate::routes::Page;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub index: usize,
    pub name: String,
    pub details: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &LocalCart, format: &PriceFormat) -> Self {
        Self {
            items: cart
                .lines()
                .iter()
                .enumerate()
                .map(|(index, line)| CartItemView {
                    index,
                    name: line.name.clone(),
                    details: line_details(line),
                    quantity: line.quantity,
                    price: format.format(line.unit_price),
                    line_price: format.format(line.line_total()),
                })
                .collect(),
            subtotal: format.format(cart.subtotal()),
            item_count: cart.item_count(),
        }
    }
}

/// "variant / color", whichever are present.
fn line_details(line: &CartLine) -> Option<String> {
    let parts: Vec<&str> = [line.variant.as_deref(), line.color.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(" / "))
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i64,
    pub name: String,
    pub quantity: Option<u32>,
    pub unit_price: String,
    pub variant: Option<String>,
    pub color: Option<String>,
    pub seller_id: Option<i64>,
    pub seller_is: Option<String>,
}

impl AddToCartForm {
    fn into_line(self) -> Result<CartLine> {
        let unit_price = Decimal::from_str(self.unit_price.trim())
            .ok()
            .filter(|d| !d.is_sign_negative())
            .ok_or_else(|| AppError::BadRequest(format!("invalid price '{}'", self.unit_price)))?;
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("missing product name".to_string()));
        }

        let seller = match (self.seller_id, self.seller_is.as_deref()) {
            (Some(id), Some("seller")) => SellerRef {
                id: SellerId::new(id),
                kind: SellerKind::Seller,
            },
            _ => SellerRef::admin(),
        };

        Ok(CartLine {
            product_id: ProductId::new(self.product_id),
            name,
            quantity: self.quantity.unwrap_or(1),
            unit_price: Price::new(unit_price),
            variant: self.variant.filter(|v| !v.trim().is_empty()),
            color: self.color.filter(|c| !c.trim().is_empty()),
            seller,
        })
    }
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub index: usize,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: Page,
    pub cart: CartView,
}

/// Display cart page.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: ShopperSession,
    nonce: CspNonce,
) -> Result<impl IntoResponse> {
    let lang = session.language(state.config().default_language).await;
    let cart = session.cart().await?;
    let format = state
        .backend()
        .display_config(lang)
        .await
        .map(|config| config.price_format)
        .unwrap_or_default();

    Ok(CartShowTemplate {
        page: Page::new(&state, lang, nonce),
        cart: CartView::new(&cart, &format),
    })
}

/// Add item to cart.
#[instrument(skip(session, form), fields(product_id = form.product_id))]
pub async fn add(session: ShopperSession, Form(form): Form<AddToCartForm>) -> Result<Redirect> {
    let line = form.into_line()?;
    let product = line.product_id.to_string();

    let mut cart = session.cart().await?;
    cart.add(line);
    session.save_cart(&cart).await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", &product)]));
    Ok(Redirect::to("/cart"))
}

/// Remove item from cart.
#[instrument(skip(session))]
pub async fn remove(
    session: ShopperSession,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    let mut cart = session.cart().await?;
    if cart.remove(form.index).is_some() {
        session.save_cart(&cart).await?;
    }
    Ok(Redirect::to("/cart"))
}
