use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use taskdesk::{
    auth::AuthMiddleware,
    config::Config,
    routes::{self, health},
    state::AppState,
    store::PgStore,
};

async fn build_state(config: &Config) -> io::Result<AppState> {
    match &config.database_url {
        Some(database_url) => {
            let store = PgStore::connect(database_url, config)
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            let store = Arc::new(store);
            Ok(AppState::new(config, store.clone(), store))
        }
        None => {
            log::warn!("DATABASE_URL is not set; using the in-memory store, data will not persist");
            Ok(AppState::in_memory(config))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // load .env before the logger so RUST_LOG can live there too
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    if config.admin_invite_token.is_none() {
        log::warn!("ADMIN_INVITE_TOKEN is not set; admin registration is disabled");
    }

    let state = web::Data::new(build_state(&config).await?);
    let tokens = state.tokens.clone();

    log::info!("Starting taskdesk server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(tokens.clone()))
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
