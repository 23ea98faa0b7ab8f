#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, web};
use dormstore::{Store, StoreImpl};
use tracing::{info, warn};

mod auth;
mod config;
mod error;
mod routes;

use config::Config;
use error::AppError;
use logger::init_tracing;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let config = Config::from_config(std::env::var("DORMSHARE_CONFIG").ok())?;
    info!("{config}");

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    run_server(addr, &config).await
}

async fn run_server(addr: SocketAddr, config: &Config) -> Result<(), AppError> {
    let pool = dormstore::open_database(&config.database.path).await?;
    let store: web::Data<dyn Store> =
        web::Data::from(Arc::new(StoreImpl::new_from_pool(pool)) as Arc<dyn Store>);
    let session_key = session_key(config);

    info!("listening on {addr}");
    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .wrap(SessionMiddleware::new(CookieSessionStore::default(), session_key.clone()))
            .configure(routes::routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}

/// Session cookies are signed with the configured secret when one is set;
/// otherwise a throwaway key is generated and sessions reset on restart.
fn session_key(config: &Config) -> Key {
    match config.session.secret.as_deref() {
        Some(secret) if secret.len() >= 64 => Key::from(secret.as_bytes()),
        Some(_) => {
            warn!("session secret shorter than 64 bytes; generating a throwaway key");
            Key::generate()
        }
        None => {
            warn!("no session secret configured; generating a throwaway key");
            Key::generate()
        }
    }
}
