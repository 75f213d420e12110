use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings, WaitlistSettings};
use crate::email_client::EmailClient;
use crate::routes::{
    handle_join_waitlist, handle_list_signups, handle_migrate_mirror, handle_waitlist_count,
    health_check,
};
use crate::store::WaitlistStore;

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let db_pool = config.get_db_options().map(|db_options| {
            PgPoolOptions::new()
                .acquire_timeout(std::time::Duration::from_secs(2))
                .connect_lazy_with(db_options)
        });
        let redis_client = config.get_redis_address().and_then(|address| {
            match redis::Client::open(address) {
                Ok(client) => Some(client),
                Err(err) => {
                    tracing::warn!("Invalid redis configuration, mirror disabled: {:?}", err);
                    None
                }
            }
        });
        let store = WaitlistStore::new(db_pool, redis_client);

        let sender_email = config
            .get_email_client_sender()
            .expect("Sender email is not valid");
        let email_client = EmailClient::new(
            config.get_email_client_base_url(),
            sender_email,
            config.get_email_client_api(),
            None,
        );

        let listener =
            TcpListener::bind(config.get_address()).expect("Failed to bind the address.");
        let port = listener.local_addr().unwrap().port();
        let server = run(listener, store, email_client, config.waitlist.clone())?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    store: WaitlistStore,
    email_client: EmailClient,
    waitlist_settings: WaitlistSettings,
) -> Result<Server, std::io::Error> {
    let store = web::Data::new(store);
    let email_client = web::Data::new(email_client);
    let waitlist_settings = web::Data::new(waitlist_settings);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/waitlist", web::post().to(handle_join_waitlist))
            .route("/waitlist/count", web::get().to(handle_waitlist_count))
            .route("/admin/signups", web::get().to(handle_list_signups))
            .route("/admin/migrate", web::post().to(handle_migrate_mirror))
            .app_data(store.clone())
            .app_data(email_client.clone())
            .app_data(waitlist_settings.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
