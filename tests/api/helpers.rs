use reqwest::Response;
use sqlx::{migrate, Connection, Executor, PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;
use wiremock::MockServer;

use waitlist_api::{
    config::{get_configuration, DatabaseSettings, Settings},
    startup::{get_connection_db_pool, Application},
};

pub struct TestApp {
    pub config: Settings,
    pub address: String,
    pub db_pool: Option<PgPool>,
    pub email_server: MockServer,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        Self::spawn_app_with(|_| {}).await
    }

    /// Spawns the application against a throwaway database, with wiremock
    /// standing in for Sendgrid and no mirror configured. `customize` runs on
    /// the loaded configuration before the app is built, so tests can adjust
    /// the admission policy.
    pub async fn spawn_app_with(customize: impl FnOnce(&mut Settings)) -> TestApp {
        let mut config = get_configuration().expect("Missing configuration file.");
        let db_test_name = format!("db_{}", Uuid::new_v4().to_string().replace('-', "_"));
        let email_server = MockServer::start().await;

        // We are using port 0 as way to define a different port per each test. Port 0 is a special case that operating systems
        // take into account: when port is 0, the OS will search for the first available port
        config.set_app_port(0);
        config.set_email_client_base_url(email_server.uri());
        // Tests run without a mirror; the gateway has to degrade silently.
        config.redis = None;

        let db_config = config
            .database
            .as_mut()
            .expect("Test configuration must include a database.");
        let db_pool = configure_db(db_config, db_test_name).await;

        customize(&mut config);

        let application = Application::build(config.clone())
            .await
            .expect("Failed to build application.");

        let address = format!("http://127.0.0.1:{}", application.get_port());

        tokio::spawn(application.run_until_stop());

        TestApp {
            address,
            config,
            db_pool: Some(db_pool),
            email_server,
        }
    }

    /// Spawns the application with database credentials pointing at a closed
    /// port, so the primary store is configured but every operation on it
    /// fails. The pool connects lazily, so building the app still succeeds.
    pub async fn spawn_app_with_unreachable_db() -> TestApp {
        let mut config = get_configuration().expect("Missing configuration file.");
        let email_server = MockServer::start().await;

        config.set_app_port(0);
        config.set_email_client_base_url(email_server.uri());
        config.redis = None;

        let db_config = config
            .database
            .as_mut()
            .expect("Test configuration must include a database.");
        db_config.host = "127.0.0.1".to_string();
        // Reserved port with nothing listening; connections are refused.
        db_config.port = 1;

        let application = Application::build(config.clone())
            .await
            .expect("Failed to build application.");

        let address = format!("http://127.0.0.1:{}", application.get_port());

        tokio::spawn(application.run_until_stop());

        TestApp {
            address,
            config,
            db_pool: None,
            email_server,
        }
    }

    /// Spawns the application with neither store configured, to exercise the
    /// outage behavior.
    pub async fn spawn_app_without_stores() -> TestApp {
        let mut config = get_configuration().expect("Missing configuration file.");
        let email_server = MockServer::start().await;

        config.set_app_port(0);
        config.set_email_client_base_url(email_server.uri());
        config.database = None;
        config.redis = None;

        let application = Application::build(config.clone())
            .await
            .expect("Failed to build application.");

        let address = format!("http://127.0.0.1:{}", application.get_port());

        tokio::spawn(application.run_until_stop());

        TestApp {
            address,
            config,
            db_pool: None,
            email_server,
        }
    }

    pub fn db_pool(&self) -> &PgPool {
        self.db_pool.as_ref().expect("Test app has no database.")
    }

    pub async fn post_signup(&self, body: HashMap<&str, &str>) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/waitlist", self.address);

        client
            .post(&url)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_count(&self) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/waitlist/count", self.address);

        client
            .get(&url)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_admin_signups(&self) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/admin/signups", self.address);

        client
            .get(&url)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_migrate(&self) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/admin/migrate", self.address);

        client
            .post(&url)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

async fn configure_db(db_config: &mut DatabaseSettings, db_test_name: String) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect_with(&db_config.get_db_options())
        .await
        .expect("Failed to connect to Postgres.");

    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, db_test_name))
        .await
        .expect("Failed to create database.");

    connection
        .close()
        .await
        .expect("Failed to close connection.");

    // Execute migrations
    db_config.set_name(db_test_name);

    let db_pool = get_connection_db_pool(db_config);

    migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run migrations.");

    db_pool
}
