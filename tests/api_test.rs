//! HTTP-level tests: the full actix app running against an in-memory store.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{http::StatusCode, test, web, App};
use bigdecimal::BigDecimal;
use serde_json::{json, Value};

use dive_commerce::application::commerce_service::{CommerceService, ServiceParts};
use dive_commerce::application::pricing::PricingPolicy;
use dive_commerce::configure_routes;
use dive_commerce::domain::catalog::{DivePackage, Equipment, MembershipTier, User};
use dive_commerce::infrastructure::catalog::JsonCatalog;
use dive_commerce::infrastructure::identity::SessionIdentity;
use dive_commerce::infrastructure::payment::{SimulatedPaymentGateway, DECLINED_TEST_CARD};
use dive_commerce::infrastructure::store::MemoryStore;
use dive_commerce::infrastructure::system::{SystemClock, UuidSuffixSource};

const DIVE_DATE: &str = "2030-03-09T08:00:00Z";

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn service(user: Option<User>) -> web::Data<CommerceService> {
    let catalog = JsonCatalog::from_records(
        vec![
            Equipment {
                id: "1".to_string(),
                name: "Travel Regulator".to_string(),
                price: dec("125"),
                rental_price: Some(dec("15")),
                stock: 6,
                available: true,
                is_rentable: true,
            },
            Equipment {
                id: "2".to_string(),
                name: "Drysuit".to_string(),
                price: dec("1200"),
                rental_price: None,
                stock: 0,
                available: false,
                is_rentable: false,
            },
        ],
        vec![DivePackage {
            id: "p1".to_string(),
            name: "Manta Night Dive".to_string(),
            price: dec("140"),
            min_participants: 1,
            max_participants: 6,
            available_dates: vec![DIVE_DATE.parse().unwrap()],
        }],
    );

    let service = CommerceService::new(ServiceParts {
        store: Arc::new(MemoryStore::new()),
        catalog: Arc::new(catalog),
        identity: Arc::new(SessionIdentity::new(user)),
        gateway: Arc::new(SimulatedPaymentGateway),
        clock: Arc::new(SystemClock),
        suffixes: Arc::new(UuidSuffixSource),
        policy: PricingPolicy::default(),
        payment_latency: Duration::ZERO,
    });
    service.init().unwrap();
    web::Data::new(service)
}

fn diver() -> Option<User> {
    Some(User {
        id: "diver-1".to_string(),
        name: "Ana Reyes".to_string(),
        email: "ana@example.com".to_string(),
        membership: Some(MembershipTier::Gold),
    })
}

fn checkout_body(card: &str) -> Value {
    json!({
        "deliveryAddress": {
            "name": "Ana Reyes", "phone": "+1 555 0100", "street": "12 Harbour Rd",
            "city": "Key Largo", "state": "FL", "postalCode": "33037", "country": "US"
        },
        "payment": {"method": "card", "cardNumber": card, "cardholderName": "Ana Reyes"}
    })
}

macro_rules! app {
    ($service:expr) => {
        test::init_service(App::new().app_data($service.clone()).configure(configure_routes)).await
    };
}

#[actix_web::test]
async fn adding_the_same_item_twice_merges_lines() {
    let service = service(diver());
    let app = app!(service);

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/cart/items")
            .set_json(json!({"type": "purchase", "equipmentId": "1", "quantity": 1, "price": "10"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let cart: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/cart").to_request(),
    )
    .await;
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["itemCount"], 2);
}

#[actix_web::test]
async fn unavailable_gear_blocks_checkout_with_details() {
    let service = service(diver());
    let app = app!(service);

    let req = test::TestRequest::post()
        .uri("/cart/items")
        .set_json(json!({"type": "purchase", "equipmentId": "2", "price": "1200"}))
        .to_request();
    test::call_service(&app, req).await;

    let validation: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/cart/validate").to_request(),
    )
    .await;
    assert_eq!(validation["isValid"], false);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/checkout")
            .set_json(checkout_body("4242424242424242"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["details"][0].as_str().unwrap().contains("stock"));
}

#[actix_web::test]
async fn checkout_then_track_and_ship() {
    let service = service(diver());
    let app = app!(service);

    for line in [
        json!({"type": "purchase", "equipmentId": "1", "quantity": 2, "price": "125"}),
        json!({"type": "rental", "equipmentId": "1", "rentalDuration": 3, "price": "45"}),
        json!({"type": "package", "packageId": "p1", "selectedDate": DIVE_DATE, "participants": 2, "price": "140"}),
    ] {
        let req = test::TestRequest::post().uri("/cart/items").set_json(line).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/checkout")
            .set_json(checkout_body("4242424242424242"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let outcome: Value = test::read_body_json(resp).await;
    let order_number = outcome["orderNumber"].as_str().unwrap().to_string();
    assert!(order_number.starts_with("ORD-"));
    assert_eq!(outcome["rentalNumbers"].as_array().map(Vec::len), Some(1));
    assert_eq!(outcome["bookingNumbers"].as_array().map(Vec::len), Some(1));

    let cart: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/cart").to_request(),
    )
    .await;
    assert_eq!(cart["itemCount"], 0);

    let tracked: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/track/{order_number}"))
            .to_request(),
    )
    .await;
    assert_eq!(tracked["kind"], "order");
    assert_eq!(tracked["status"], "confirmed");
    assert!(tracked.get("deliveryAddress").is_none());

    let booking_number = outcome["bookingNumbers"][0].as_str().unwrap();
    let tracked: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/track/{booking_number}"))
            .to_request(),
    )
    .await;
    assert_eq!(tracked["kind"], "booking");

    let history: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/account/history").to_request(),
    )
    .await;
    let order_id = history["orders"][0]["id"].as_str().unwrap().to_string();

    let shipped: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/orders/{order_id}/status"))
            .set_json(json!({"status": "shipped"}))
            .to_request(),
    )
    .await;
    assert!(shipped["shippedAt"].is_string());
    assert!(shipped["estimatedDelivery"].is_string());

    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/orders/{order_id}/status"))
            .set_json(json!({"status": "pending"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn declined_card_keeps_the_cart() {
    let service = service(diver());
    let app = app!(service);

    let req = test::TestRequest::post()
        .uri("/cart/items")
        .set_json(json!({"type": "purchase", "equipmentId": "1", "price": "125"}))
        .to_request();
    test::call_service(&app, req).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/checkout")
            .set_json(checkout_body(DECLINED_TEST_CARD))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);

    let cart: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/cart").to_request(),
    )
    .await;
    assert_eq!(cart["itemCount"], 1);
}

#[actix_web::test]
async fn guests_cannot_check_out() {
    let service = service(None);
    let app = app!(service);

    let req = test::TestRequest::post()
        .uri("/cart/items")
        .set_json(json!({"type": "purchase", "equipmentId": "1", "price": "125"}))
        .to_request();
    test::call_service(&app, req).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/checkout")
            .set_json(checkout_body("4242424242424242"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn unknown_tracking_number_is_404() {
    let service = service(diver());
    let app = app!(service);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/track/ORD-000000000000-NOPE").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn quantity_zero_removes_line() {
    let service = service(diver());
    let app = app!(service);

    let line: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/cart/items")
            .set_json(json!({"type": "purchase", "equipmentId": "1", "quantity": 3, "price": "125"}))
            .to_request(),
    )
    .await;
    let id = line["id"].as_str().unwrap();

    let cart: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/cart/items/{id}"))
            .set_json(json!({"quantity": 0}))
            .to_request(),
    )
    .await;
    assert_eq!(cart["itemCount"], 0);
    assert_eq!(cart["totals"]["total"], "25.00");
}
