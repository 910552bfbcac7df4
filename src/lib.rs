#[cfg(feature = "data")]
pub mod domain;
#[cfg(feature = "data")]
pub mod models;
#[cfg(feature = "data")]
pub mod pagination;
#[cfg(feature = "data")]
pub mod schema;
#[cfg(feature = "data")]
pub mod store;

#[cfg(feature = "server")]
pub mod auth;
#[cfg(feature = "server")]
pub mod changes;
#[cfg(feature = "server")]
pub mod db;
#[cfg(feature = "server")]
pub mod dto;
#[cfg(feature = "server")]
pub mod error_conversions;
#[cfg(feature = "server")]
pub mod forms;
#[cfg(feature = "server")]
pub mod platform;
#[cfg(feature = "server")]
pub mod repository;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod services;

#[cfg(feature = "server")]
pub use server::{run, session_middleware};

#[cfg(feature = "server")]
mod server {
    use std::sync::Arc;

    use actix_cors::Cors;
    use actix_identity::IdentityMiddleware;
    use actix_session::{SessionMiddleware, storage::CookieSessionStore};
    use actix_web::cookie::Key;
    use actix_web::{App, HttpServer, middleware, web};

    use crate::changes::{ChangePublisher, ZmqChangePublisher};
    use crate::db::{PoolSettings, establish_connection_pool};
    use crate::models::config::ServerConfig;
    use crate::platform::PlatformBridge;
    use crate::repository::DieselRepository;
    use crate::routes;

    /// Cookie session carrying the identity; `IdentityMiddleware` must be
    /// wrapped inside it.
    pub fn session_middleware(
        server_config: &ServerConfig,
    ) -> SessionMiddleware<CookieSessionStore> {
        let secret_key = Key::from(server_config.secret.as_bytes());
        SessionMiddleware::builder(CookieSessionStore::default(), secret_key)
            .cookie_secure(false) // set to true in prod
            .cookie_domain(Some(format!(".{}", server_config.domain)))
            .build()
    }

    /// Builds and runs the Actix-Web HTTP server using the provided configuration.
    pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
        // Every committed mutation is announced on this socket.
        let publisher: Arc<dyn ChangePublisher> = Arc::new(
            ZmqChangePublisher::start(&server_config.zmq_changes_pub).map_err(|e| {
                std::io::Error::other(format!("Failed to start change feed: {e}"))
            })?,
        );

        let pool = establish_connection_pool(
            &server_config.database_url,
            PoolSettings::from(&server_config),
        )
        .map_err(|e| {
            std::io::Error::other(format!("Failed to establish database connection: {e}"))
        })?;
        let repo = DieselRepository::new(pool);

        let platform = PlatformBridge::from_config(&server_config).map_err(|e| {
            std::io::Error::other(format!("Invalid platform initial balance: {e}"))
        })?;

        let bind_address = (server_config.address.clone(), server_config.port);

        log::info!(
            "Serving API on {}:{}",
            server_config.address,
            server_config.port
        );

        HttpServer::new(move || {
            App::new()
                .wrap(Cors::permissive())
                .wrap(IdentityMiddleware::default())
                .wrap(session_middleware(&server_config))
                .wrap(middleware::Compress::default())
                .wrap(middleware::Logger::default())
                .configure(routes::configure)
                .app_data(web::Data::new(repo.clone()))
                .app_data(web::Data::from(publisher.clone()))
                .app_data(web::Data::new(platform.clone()))
                .app_data(web::Data::new(server_config.clone()))
        })
        .bind(bind_address)?
        .run()
        .await
    }
}
