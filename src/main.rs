use actix_web::web;
use dive_commerce::config::AppConfig;
use dive_commerce::{build_server, build_service};
use dotenvy::dotenv;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().expect("Invalid configuration");
    let service = web::Data::new(build_service(&config).expect("Failed to load commerce state"));

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(service.clone(), &config.host, config.port)?.await?;

    if let Err(e) = service.teardown() {
        log::error!("Failed to flush state on shutdown: {e}");
    }
    Ok(())
}
