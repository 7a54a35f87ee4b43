use std::net::TcpListener;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{dev::Server, web::Data, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::circulation::{CirculationManager, ReviewLedger};
use crate::core::config::JwtAuthConfig;
use crate::core::AppConfig;
use crate::db::{PgBookStore, PgRequestStore, PgReviewStore, PgUserStore};
use crate::routes::community_library_routes;

pub struct LibraryWebServer {
    port: u16,
    server: Server,
}

impl LibraryWebServer {
    pub async fn build(configuration: AppConfig) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.library_server_config.host, configuration.library_server_config.port
        );

        let postgres_pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect_lazy_with(configuration.postgres.connect());

        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let server = run(listener, postgres_pool, configuration.jwt_auth_config).await?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub async fn run(
    listener: TcpListener,
    postgres_pool: PgPool,
    jwt_config: JwtAuthConfig,
) -> Result<Server, anyhow::Error> {
    let books = Arc::new(PgBookStore::new(postgres_pool.clone()));
    let requests = Arc::new(PgRequestStore::new(postgres_pool.clone()));
    let users = Arc::new(PgUserStore::new(postgres_pool.clone()));
    let reviews = Arc::new(PgReviewStore::new(postgres_pool));

    let circulation_manager = Data::new(CirculationManager::new(
        books,
        requests,
        users.clone(),
    ));
    let review_ledger = Data::new(ReviewLedger::new(reviews, users));
    let jwt_config = Data::new(jwt_config);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .configure(community_library_routes)
            .app_data(circulation_manager.clone())
            .app_data(review_ledger.clone())
            .app_data(jwt_config.clone())
            .wrap(TracingLogger::default())
            .wrap(cors)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
