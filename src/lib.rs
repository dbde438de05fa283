pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::commerce_service::{CommerceService, ServiceParts};
use config::AppConfig;
use domain::errors::DomainError;
use infrastructure::catalog::JsonCatalog;
use infrastructure::identity::SessionIdentity;
use infrastructure::payment::SimulatedPaymentGateway;
use infrastructure::store::FileStore;
use infrastructure::system::{SystemClock, UuidSuffixSource};

/// Assemble the service from configuration and load persisted state.
pub fn build_service(config: &AppConfig) -> Result<CommerceService, DomainError> {
    let service = CommerceService::new(ServiceParts {
        store: Arc::new(FileStore::open(&config.data_dir)?),
        catalog: Arc::new(JsonCatalog::load(&config.catalog_path)?),
        identity: Arc::new(SessionIdentity::new(config.user.clone())),
        gateway: Arc::new(SimulatedPaymentGateway),
        clock: Arc::new(SystemClock),
        suffixes: Arc::new(UuidSuffixSource),
        policy: config.pricing.clone(),
        payment_latency: config.payment_latency,
    });
    service.init()?;
    Ok(service)
}

/// Register every route on an actix `ServiceConfig`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    use handlers::{cart, checkout, orders, tracking};

    cfg.service(
        web::scope("/cart")
            .route("", web::get().to(cart::get_cart))
            .route("", web::delete().to(cart::clear_cart))
            .route("/validate", web::get().to(cart::validate_cart))
            .route("/items", web::post().to(cart::add_item))
            .route("/items/{id}", web::patch().to(cart::update_item))
            .route("/items/{id}", web::delete().to(cart::remove_item)),
    )
    .route("/checkout", web::post().to(checkout::checkout))
    .route("/track/{number}", web::get().to(tracking::track))
    .route("/account/history", web::get().to(orders::account_history))
    .route(
        "/orders/{id}/status",
        web::patch().to(orders::update_order_status),
    )
    .route(
        "/rentals/{id}/status",
        web::patch().to(orders::update_rental_status),
    )
    .route(
        "/bookings/{id}/status",
        web::patch().to(orders::update_booking_status),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    service: web::Data<CommerceService>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = handlers::ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .configure(configure_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
