//! End-to-end checkout flows against the scripted backend.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use awis_integration_tests::{TestContext, location};

fn digital_only(ctx: &TestContext) {
    ctx.backend.script(|s| {
        s.config = json!({
            "cod_status": 0,
            "payment_methods": [{"key": "fatoorah", "label": "MyFatoorah"}],
        });
    });
}

#[tokio::test]
async fn test_empty_cart_redirects_to_cart() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/checkout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");
    assert!(ctx.backend.requests_to("/get-guest-id").is_empty());
}

#[tokio::test]
async fn test_guest_failure_blocks_checkout() {
    let ctx = TestContext::new().await;
    ctx.backend.script(|s| s.guest_id = None);
    ctx.add_to_cart().await;

    let response = ctx.get("/checkout").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response.text().await.unwrap();
    assert!(body.contains("Could not create a guest session"));
    assert!(!body.contains("name=\"street\""));
}

#[tokio::test]
async fn test_address_step_lists_countries() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart().await;

    let body = ctx.get("/checkout").await.text().await.unwrap();
    assert!(body.contains("<option value=\"Kuwait\" selected>"));
    assert!(body.contains("Saudi Arabia"));
    assert_eq!(ctx.backend.requests_to("/get-guest-id").len(), 1);

    // The guest id is issued once per session
    ctx.get("/checkout").await;
    assert_eq!(ctx.backend.requests_to("/get-guest-id").len(), 1);
}

#[tokio::test]
async fn test_unauthorized_country_list_keeps_default() {
    let ctx = TestContext::new().await;
    ctx.backend.script(|s| s.countries = None);
    ctx.add_to_cart().await;

    let response = ctx.get("/checkout").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Not authorized. Please reload the page or sign in."));
    assert!(body.contains("<option value=\"Kuwait\" selected>"));

    // The pre-filled country still lets the step advance
    ctx.submit_address().await;
    let body = ctx.get("/checkout").await.text().await.unwrap();
    assert!(body.contains("Cash on Delivery"));
}

#[tokio::test]
async fn test_incomplete_address_stays_on_step_one() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart().await;
    ctx.get("/checkout").await;

    let response = ctx
        .post("/checkout/address", &[("name", "Sara"), ("country", "Kuwait")])
        .await;
    assert_eq!(location(&response), "/checkout");

    let body = ctx.get("/checkout").await.text().await.unwrap();
    assert!(body.contains("Please fill in all required fields"));
    assert!(body.contains("value=\"Sara\""));
    assert!(ctx.backend.requests_to("/config").is_empty());
}

#[tokio::test]
async fn test_cash_on_delivery_order() {
    let ctx = TestContext::new().await;
    let body = ctx.reach_step_two().await;
    assert!(body.contains("Standard"));
    assert!(body.contains("Fast Delivery"));
    assert!(body.contains("Cash on Delivery"));
    assert!(body.contains("7.500 د.ك"));

    let response = ctx.post("/checkout/place", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let success = location(&response);
    assert_eq!(success, "/order-success?id=9001&total=7.5&payment=cod");

    let chosen = ctx.backend.requests_to("/shipping-method/choose-for-order");
    assert_eq!(chosen.len(), 1);
    assert_eq!(chosen[0].body["id"], 1);
    assert_eq!(chosen[0].body["cart_group_id"], "group-1");

    let placed = ctx.backend.requests_to("/customer/order/place");
    assert_eq!(placed.len(), 1);
    let order = &placed[0].body;
    assert_eq!(order["address_id"], 7);
    assert_eq!(order["delivery"], 1);
    assert_eq!(order["payment"], "cod");
    assert_eq!(order["guest_id"], "501");
    assert_eq!(order["phone"], "96551234567");
    assert_eq!(order["email"], "orders@awisapp.com");
    assert_eq!(order["cartItems"][0]["product_id"], 11);

    let body = ctx.get(&success).await.text().await.unwrap();
    assert!(body.contains("#9001"));
    assert!(body.contains("7.500 د.ك"));
    assert!(body.contains("Cash on Delivery"));

    tokio::time::sleep(Duration::from_millis(500)).await;
    let body = ctx.get("/cart").await.text().await.unwrap();
    assert!(body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_submission_order_of_backend_calls() {
    let ctx = TestContext::new().await;
    ctx.reach_step_two().await;
    ctx.post("/checkout/place", &[]).await;

    let paths: Vec<String> = ctx
        .backend
        .requests()
        .into_iter()
        .map(|r| r.path)
        .filter(|p| {
            [
                "/customer/address/add",
                "/cart",
                "/shipping-method/choose-for-order",
                "/customer/order/place",
            ]
            .contains(&p.as_str())
        })
        .collect();
    assert_eq!(
        paths,
        vec![
            "/customer/address/add",
            "/cart",
            "/shipping-method/choose-for-order",
            "/customer/order/place",
        ]
    );
}

#[tokio::test]
async fn test_address_id_found_by_polling() {
    let ctx = TestContext::new().await;
    ctx.backend.script(|s| {
        s.address_add = json!({"message": "created"});
        s.address_lists = vec![json!([]), json!([{"id": 3}, {"id": "12"}])];
    });
    ctx.reach_step_two().await;

    let response = ctx.post("/checkout/place", &[]).await;
    assert!(location(&response).starts_with("/order-success?id=9001"));
    assert_eq!(ctx.backend.requests_to("/customer/address/list").len(), 2);

    let placed = ctx.backend.requests_to("/customer/order/place");
    assert_eq!(placed[0].body["address_id"], 12);
}

#[tokio::test]
async fn test_digital_payment_redirect_and_callback() {
    let ctx = TestContext::new().await;
    digital_only(&ctx);
    let body = ctx.reach_step_two().await;
    assert!(body.contains("MyFatoorah"));
    assert!(!body.contains("Cash on Delivery"));

    let response = ctx.post("/checkout/place", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "https://pay.gateway.test/session/abc");
    assert!(ctx.backend.requests_to("/customer/order/place").is_empty());

    let requested = ctx.backend.requests_to("/digital-payment");
    assert_eq!(requested.len(), 1);
    let request = &requested[0].body;
    assert_eq!(request["payment_method"], "fatoorah");
    assert_eq!(request["address_id"], 7);
    assert_eq!(request["billing_address_id"], 7);
    assert_eq!(request["payment_platform"], "web");
    assert!(
        request["external_redirect_link"]
            .as_str()
            .unwrap()
            .ends_with("/payment/callback?flag=success&token={token}")
    );

    let response = ctx.get("/payment/callback?flag=success&token=tok-1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("#tok-1"));
    assert!(body.contains("Online payment"));

    // The attempt marker is consumed by the first callback
    let response = ctx.get("/payment/callback?flag=success&token=tok-1").await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_cancelled_payment_returns_to_checkout() {
    let ctx = TestContext::new().await;
    digital_only(&ctx);
    ctx.reach_step_two().await;
    ctx.post("/checkout/place", &[]).await;

    let response = ctx.get("/payment/callback?flag=failed").await;
    assert_eq!(location(&response), "/checkout");

    let body = ctx.get("/checkout").await.text().await.unwrap();
    assert!(body.contains("The payment was not completed"));
    assert!(body.contains("MyFatoorah"));
}

#[tokio::test]
async fn test_missing_redirect_link_is_shown() {
    let ctx = TestContext::new().await;
    digital_only(&ctx);
    ctx.backend
        .script(|s| s.digital = json!({"message": "Gateway disabled"}));
    ctx.reach_step_two().await;

    let response = ctx.post("/checkout/place", &[]).await;
    assert_eq!(location(&response), "/checkout");

    let body = ctx.get("/checkout").await.text().await.unwrap();
    assert!(body.contains("No redirect_link received from backend! Error: Gateway disabled"));
}

#[tokio::test]
async fn test_form_payment_mode_renders_payment_form() {
    let ctx = TestContext::with_settings(&[("STOREFRONT_PAYMENT_MODE", "form")]).await;
    digital_only(&ctx);
    ctx.reach_step_two().await;

    let response = ctx.post("/checkout/place", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("/customer/web-payment-request\""));
    assert!(body.contains("name=\"_token\" value=\"csrf-test-token\""));
    assert!(body.contains("name=\"payment_method\" value=\"fatoorah\""));
    assert!(ctx.backend.requests_to("/digital-payment").is_empty());
}

#[tokio::test]
async fn test_shipping_choice_is_persisted() {
    let ctx = TestContext::new().await;
    ctx.reach_step_two().await;

    let response = ctx.post("/checkout/shipping", &[("method", "2")]).await;
    assert_eq!(location(&response), "/checkout");
    let chosen = ctx.backend.requests_to("/shipping-method/choose-for-order");
    assert_eq!(chosen.len(), 1);
    assert_eq!(chosen[0].body["id"], 2);

    let body = ctx.get("/checkout").await.text().await.unwrap();
    assert!(body.contains("value=\"2\" checked"));
    assert!(body.contains("9.000 د.ك"));

    ctx.post("/checkout/shipping", &[("method", "99")]).await;
    let body = ctx.get("/checkout").await.text().await.unwrap();
    assert!(body.contains("The selected shipping method is not available"));
    assert_eq!(
        ctx.backend
            .requests_to("/shipping-method/choose-for-order")
            .len(),
        1
    );
}

#[tokio::test]
async fn test_back_returns_to_address_step() {
    let ctx = TestContext::new().await;
    ctx.reach_step_two().await;

    let response = ctx.post("/checkout/back", &[]).await;
    assert_eq!(location(&response), "/checkout");
    let body = ctx.get("/checkout").await.text().await.unwrap();
    assert!(body.contains("name=\"street\""));
    assert!(body.contains("value=\"Block 10, Street 5\""));
}

#[tokio::test]
async fn test_pages_carry_security_headers() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    let csp = headers
        .get("content-security-policy")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(csp.contains("'nonce-"));
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("x-request-id").is_some());
}
