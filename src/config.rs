use config::{Config, ConfigError, File};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::{
    postgres::{PgConnectOptions, PgSslMode},
    ConnectOptions,
};

use crate::domain::waitlist_email::WaitlistEmail;

#[derive(Debug)]
pub enum Environment {
    Development,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    // Both stores are optional: missing credentials degrade that store to
    // "unavailable" instead of refusing to boot.
    pub database: Option<DatabaseSettings>,
    pub redis: Option<RedisSettings>,
    pub email_client: EmailClientSettings,
    pub waitlist: WaitlistSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub api_key: Secret<String>,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    // secrecy protects secret information and prevents them to be exposed (eg: via logs)
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub name: String,
    pub require_ssl: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct RedisSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

/// Admission policy knobs read once at startup and shared with the handlers.
#[derive(serde::Deserialize, Clone)]
pub struct WaitlistSettings {
    /// Signups that predate the current stores, added on top of the live count.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub historical_offset: i64,
    pub name_required: bool,
    /// Institutional suffixes matched as case-insensitive substrings of the
    /// email domain (eg ".ac.ae").
    pub priority_domain_suffixes: Vec<String>,
    /// Free-mail providers matched exactly against the email domain.
    pub common_provider_domains: Vec<String>,
    /// When present, the submitted university must appear in this list.
    pub university_allow_list: Option<Vec<String>>,
    /// Known misspellings of common providers (eg "gmial.com"); submissions
    /// with these domains are rejected as suspected typos.
    pub suspected_typo_domains: Vec<String>,
}

impl Settings {
    pub fn get_address(&self) -> String {
        format!(
            "{}:{}",
            self.application.get_host(),
            self.application.get_port()
        )
    }

    pub fn get_db_options(&self) -> Option<PgConnectOptions> {
        self.database.as_ref().map(|database| database.get_db_options())
    }

    pub fn get_email_client_sender(&self) -> Result<WaitlistEmail, String> {
        self.email_client.get_sender_email()
    }

    pub fn get_email_client_base_url(&self) -> String {
        self.email_client.get_base_url()
    }

    pub fn get_email_client_api(&self) -> Secret<String> {
        self.email_client.get_api_key()
    }

    pub fn set_email_client_base_url(&mut self, new_base_url: String) {
        self.email_client.base_url = new_base_url
    }

    pub fn get_redis_address(&self) -> Option<String> {
        self.redis.as_ref().map(|redis| redis.get_address())
    }

    pub fn set_app_port(&mut self, port: u16) {
        self.application.port = port;
    }
}

impl DatabaseSettings {
    pub fn get_db_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        let mut db_options = PgConnectOptions::new()
            .host(&self.host)
            .password(self.password.expose_secret())
            .username(&self.username)
            .port(self.port)
            .database(&self.name)
            .ssl_mode(ssl_mode);

        db_options.log_statements(tracing::log::LevelFilter::Trace);

        db_options
    }

    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    pub fn set_name(&mut self, new_db_name: String) {
        self.name = new_db_name
    }
}

impl ApplicationSettings {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_host(&self) -> String {
        self.host.clone()
    }
}

impl EmailClientSettings {
    pub fn get_sender_email(&self) -> Result<WaitlistEmail, String> {
        WaitlistEmail::parse(self.sender_email.clone()).map_err(|err| err.to_string())
    }

    pub fn get_base_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn get_api_key(&self) -> Secret<String> {
        self.api_key.clone()
    }
}

impl RedisSettings {
    pub fn get_address(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            unknown_env => Err(format!(
                "{} is not supported environment. Use either 'development' or 'production'.",
                unknown_env
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let root_path = std::env::current_dir().expect("Failed to determine the current directory");
    let config_directory = root_path.join("config");
    // Uses development environment by default
    let enviroment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");
    let config_base_filepath = config_directory.join("base");
    let config_env_filepath = config_directory.join(enviroment.as_str());

    // It merges the base configuration file with the one from the specific environment (development or production)
    let settings = Config::builder()
        .add_source(File::from(config_base_filepath).required(true))
        .add_source(File::from(config_env_filepath).required(true))
        // Merge settings from environment variables with a prefix of APP and "__" separator
        // E.g APP_APPLICATION__PORT would set Settings.application.port
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?;

    tracing::info!("Application environment = {:?}", enviroment);

    // Try to convert the value from the configuration file into a Settings type
    settings.try_deserialize()
}
