//! Router tests against the in-memory store and recording payment/email fakes.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use bouquet_configurator::api::{build_router, AppState};
use bouquet_configurator::domain::aggregates::{DiscountCode, Product, Review};
use bouquet_configurator::domain::ports::{
    DiscountCodeStore, EmailError, EmailSender, PaymentError, PaymentGateway, PaymentIntent, PaymentIntentRequest,
    PaymentRecord, TemplatedEmail,
};
use bouquet_configurator::domain::services::DiscountGate;
use bouquet_configurator::infrastructure::InMemoryStore;

#[derive(Default)]
struct FakePayments {
    fail: bool,
    requests: Mutex<Vec<PaymentIntentRequest>>,
    intents: Mutex<BTreeMap<String, PaymentRecord>>,
}

#[async_trait]
impl PaymentGateway for FakePayments {
    async fn create_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, PaymentError> {
        self.requests.lock().unwrap().push(request);
        if self.fail {
            return Err(PaymentError::Rejected { status: 402, message: "card declined".into() });
        }
        Ok(PaymentIntent { id: "pi_123".into(), client_secret: "pi_123_secret_abc".into() })
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentRecord, PaymentError> {
        self.intents
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::Rejected { status: 404, message: format!("No such payment_intent: '{id}'") })
    }
}

fn settled(id: &str, status: &str, amount: i64, email: &str) -> PaymentRecord {
    PaymentRecord {
        id: id.into(),
        status: status.into(),
        amount,
        currency: "eur".into(),
        metadata: BTreeMap::from([("customer_email".to_string(), email.to_string())]),
    }
}

#[derive(Default)]
struct RecordingEmail {
    sent: Mutex<Vec<TemplatedEmail>>,
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, email: TemplatedEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

struct Harness {
    app: Router,
    store: Arc<InMemoryStore>,
    payments: Arc<FakePayments>,
    email: Arc<RecordingEmail>,
}

fn tulip_bouquet() -> Product {
    serde_json::from_value(json!({
        "id": "tulpen-fruehling",
        "name": { "de": "Tulpenstrauß Frühling", "en": "Spring tulip bouquet" },
        "price": "39.90",
        "variants": [{
            "name": "Größe",
            "name_en": "Size",
            "values": ["20 Tulpen", "40 Tulpen (€59.90)"],
            "values_en": ["20 Tulips", "40 Tulips (€59.90)"],
            "kind": "size"
        }],
        "extras": [
            { "name": "Vase", "price": "9.90" },
            { "name": "Grußkarte", "name_en": "Greeting card", "price": "2.50", "allow_quantity": true, "input_type": "short_note" }
        ],
        "stock_matrix": [
            { "Größe": "20 Tulpen", "stock": 4 },
            { "Größe": "40 Tulpen", "stock": 0 }
        ]
    }))
    .expect("product document")
}

fn harness_with(payments: FakePayments) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    store.insert_product(tulip_bouquet());
    let payments = Arc::new(payments);
    let email = Arc::new(RecordingEmail::default());
    let state = AppState {
        catalog: store.clone(),
        discounts: DiscountGate::new(store.clone()),
        payments: payments.clone(),
        email: email.clone(),
        currency: "eur".into(),
        email_from: "shop@example.com".into(),
    };
    Harness { app: build_router(state), store, payments, email }
}

fn harness() -> Harness { harness_with(FakePayments::default()) }

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json parse") };
    (status, json)
}

#[tokio::test]
async fn health_reports_service() {
    let h = harness();
    let (status, body) = call(&h.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn product_lookup_and_not_found_envelope() {
    let h = harness();
    let (status, body) = call(&h.app, "GET", "/api/v1/products/tulpen-fruehling", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["id"], "tulpen-fruehling");
    assert_eq!(body["settings"]["stock_fallback"], "permissive");

    let (status, body) = call(&h.app, "GET", "/api/v1/products/rosen", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn reviews_only_include_approved() {
    let h = harness();
    for approved in [true, false] {
        h.store.insert_review(
            Review {
                id: Uuid::new_v4(),
                product_id: "tulpen-fruehling".into(),
                author: "Jonas".into(),
                rating: 4,
                body: "Sehr frisch".into(),
                created_at: Utc::now(),
            },
            approved,
        );
    }
    let (status, body) = call(&h.app, "GET", "/api/v1/products/tulpen-fruehling/reviews", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn quote_clamps_quantity_to_stock_and_builds_line() {
    let h = harness();
    let request = json!({
        "locale": "en",
        "variants": { "Größe": "20 Tulpen" },
        "extras": [{ "name": "Vase" }],
        "consent": true,
        "quantity": 10
    });
    let (status, body) = call(&h.app, "POST", "/api/v1/products/tulpen-fruehling/quote", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quote"]["quantity"], 4);
    assert_eq!(body["quote"]["unit"]["discounted"], "49.80");
    assert_eq!(body["quote"]["total"], "199.20");
    assert_eq!(body["stock"], 4);
    assert_eq!(body["line_item"]["options"]["Size"], "20 Tulips");
    assert_eq!(body["line_item"]["unit_price"]["currency"], "EUR");
}

#[tokio::test]
async fn quote_withholds_line_until_consent() {
    let h = harness();
    let request = json!({
        "variants": { "Größe": "20 Tulpen" },
        "extras": [{ "name": "Grußkarte", "quantity": 2 }],
        "short_note": "Alles Liebe zum Geburtstag"
    });
    let (status, body) = call(&h.app, "POST", "/api/v1/products/tulpen-fruehling/quote", Some(request.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["line_item"], Value::Null);
    assert_eq!(body["eligibility"]["blockers"][0]["kind"], "consent_required");
    assert_eq!(body["visibility"]["short_note"], true);

    let mut consented = request;
    consented["consent"] = json!(true);
    let (_, body) = call(&h.app, "POST", "/api/v1/products/tulpen-fruehling/quote", Some(consented)).await;
    assert_eq!(body["line_item"]["extras"][0], "Grußkarte (x2)");
    assert_eq!(body["line_item"]["personalization"], "Alles Liebe zum Geburtstag");
}

#[tokio::test]
async fn quote_rejects_sold_out_option_and_long_note() {
    let h = harness();
    let sold_out = json!({ "variants": { "Größe": "40 Tulpen" } });
    let (status, body) = call(&h.app, "POST", "/api/v1/products/tulpen-fruehling/quote", Some(sold_out)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "selection_rejected");

    let long_note = json!({ "extras": [{ "name": "Grußkarte" }], "short_note": "eins zwei drei vier fünf sechs" });
    let (status, _) = call(&h.app, "POST", "/api/v1/products/tulpen-fruehling/quote", Some(long_note)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn quote_rejects_text_for_fields_the_selection_hides() {
    let h = harness();
    let request = json!({
        "variants": { "Größe": "20 Tulpen" },
        "letter_text": "Ein ganzer Brief ohne Aufpreis",
        "consent": true
    });
    let (status, body) = call(&h.app, "POST", "/api/v1/products/tulpen-fruehling/quote", Some(request)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "selection_rejected");

    let note_without_card = json!({ "variants": { "Größe": "20 Tulpen" }, "short_note": "gratis Notiz", "consent": true });
    let (status, _) = call(&h.app, "POST", "/api/v1/products/tulpen-fruehling/quote", Some(note_without_card)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let cleared = json!({ "variants": { "Größe": "20 Tulpen" }, "letter_text": "", "consent": true });
    let (status, body) = call(&h.app, "POST", "/api/v1/products/tulpen-fruehling/quote", Some(cleared)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["line_item"]["personalization"], "");
}

#[tokio::test]
async fn quote_rejects_duplicate_extras() {
    let h = harness();
    let request = json!({
        "variants": { "Größe": "20 Tulpen" },
        "extras": [{ "name": "Vase" }, { "name": "Vase" }],
        "consent": true
    });
    let (status, body) = call(&h.app, "POST", "/api/v1/products/tulpen-fruehling/quote", Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn payment_intent_without_code_forwards_amount() {
    let h = harness();
    let request = json!({ "amount": 4980, "metadata": { "cart": "tulpen-fruehling" } });
    let (status, body) = call(&h.app, "POST", "/api/v1/payment-intents", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["client_secret"], "pi_123_secret_abc");

    let requests = h.payments.requests.lock().unwrap();
    assert_eq!(requests[0].amount_minor, 4980);
    assert_eq!(requests[0].currency, "eur");
    assert_eq!(requests[0].discount_code, None);
}

#[tokio::test]
async fn payment_intent_reserves_valid_code() {
    let h = harness();
    h.store.insert_code(DiscountCode { max_uses: Some(5), ..DiscountCode::new("FRUEHLING10") });
    let request = json!({ "amount": 4482, "discount_code": "FRUEHLING10" });
    let (status, _) = call(&h.app, "POST", "/api/v1/payment-intents", Some(request)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(h.payments.requests.lock().unwrap()[0].discount_code.as_deref(), Some("FRUEHLING10"));
    assert_eq!(h.store.find("FRUEHLING10").await.unwrap().unwrap().current_uses, 1);
}

#[tokio::test]
async fn rejected_code_fails_generically_without_payment() {
    let h = harness();
    h.store.insert_code(DiscountCode { max_uses: Some(3), current_uses: 3, ..DiscountCode::new("VOLL") });
    h.store.insert_code(DiscountCode { expires_at: Some(Utc::now() - Duration::days(1)), ..DiscountCode::new("ALT") });

    let mut messages = Vec::new();
    for code in ["VOLL", "ALT", "GIBTESNICHT"] {
        let request = json!({ "amount": 4980, "discount_code": code });
        let (status, body) = call(&h.app, "POST", "/api/v1/payment-intents", Some(request)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        messages.push(body["error"]["message"].clone());
    }
    assert!(messages.iter().all(|m| m == &messages[0]));
    assert!(h.payments.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_payment_releases_reservation() {
    let h = harness_with(FakePayments { fail: true, ..Default::default() });
    h.store.insert_code(DiscountCode { max_uses: Some(1), ..DiscountCode::new("EINMAL") });
    let request = json!({ "amount": 4980, "discount_code": "EINMAL" });
    let (status, _) = call(&h.app, "POST", "/api/v1/payment-intents", Some(request)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(h.store.find("EINMAL").await.unwrap().unwrap().current_uses, 0);
}

#[tokio::test]
async fn payment_intent_validates_amount() {
    let h = harness();
    let (status, body) = call(&h.app, "POST", "/api/v1/payment-intents", Some(json!({ "amount": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

fn confirmation(payment_intent_id: &str, email: &str) -> Value {
    json!({
        "payment_intent_id": payment_intent_id,
        "order": {
            "customer_name": "Erika Mustermann",
            "email": email,
            "shipping_address": {
                "name": "Erika Mustermann",
                "street1": "Blumenweg 4",
                "city": "Köln",
                "zip": "50667",
                "country": "DE"
            },
            "lines": [{
                "name": "Tulpenstrauß Frühling",
                "summary": "Größe: 20 Tulpen",
                "quantity": 1,
                "unit_price": "39.90",
                "line_total": "39.90"
            }],
            "total": "39.90",
            "currency": "EUR"
        }
    })
}

fn harness_with_payment(record: PaymentRecord) -> Harness {
    let payments = FakePayments::default();
    payments.intents.lock().unwrap().insert(record.id.clone(), record);
    harness_with(payments)
}

#[tokio::test]
async fn order_confirmation_sends_templated_email() {
    let h = harness_with_payment(settled("pi_paid", "succeeded", 3990, "erika@example.com"));
    let (status, body) =
        call(&h.app, "POST", "/api/v1/orders/confirmation", Some(confirmation("pi_paid", "erika@example.com"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sent");

    let sent = h.email.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "erika@example.com");
    assert_eq!(sent[0].from, "shop@example.com");
    assert_eq!(sent[0].data["lines"][0]["summary"], "Größe: 20 Tulpen");
}

#[tokio::test]
async fn order_confirmation_requires_settled_payment_for_recipient() {
    let h = harness_with_payment(settled("pi_open", "requires_payment_method", 3990, "erika@example.com"));
    h.payments.intents.lock().unwrap().insert("pi_paid".into(), settled("pi_paid", "succeeded", 3990, "erika@example.com"));

    let attempts = [
        confirmation("pi_unknown", "erika@example.com"),
        confirmation("pi_open", "erika@example.com"),
        confirmation("pi_paid", "fremd@example.com"),
    ];
    for request in attempts {
        let (status, body) = call(&h.app, "POST", "/api/v1/orders/confirmation", Some(request)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "payment_unverified");
    }
    assert!(h.email.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn order_confirmation_rejects_bad_email() {
    let h = harness_with_payment(settled("pi_paid", "succeeded", 3990, "kein-email"));
    let (status, _) = call(&h.app, "POST", "/api/v1/orders/confirmation", Some(confirmation("pi_paid", "kein-email"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.email.sent.lock().unwrap().is_empty());
}
