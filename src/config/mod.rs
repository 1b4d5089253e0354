use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config, read_config_from};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

/// Environment variable that takes precedence over `app.database_uri`.
pub static DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    /// Without it no `admin` account is bootstrapped.
    #[serde(default)]
    admin_password: Option<String>,
    #[serde(default = "default_access_token_minutes")]
    access_token_minutes: i64,
    #[serde(default = "default_refresh_token_days")]
    refresh_token_days: i64,
}

fn default_access_token_minutes() -> i64 {
    15
}

fn default_refresh_token_days() -> i64 {
    30
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    Self::parse(&bytes)
                };

                let mut config = match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, error::ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                };

                config.apply_database_url(std::env::var(DATABASE_URL_ENV).ok());
                config
            })
            .await
    }

    pub fn parse(bytes: &[u8]) -> ConfigResult<Self> {
        let text = std::str::from_utf8(bytes).map_err(|_| ConfigError::InvalidEncoding)?;
        Ok(toml::from_str(text)?)
    }

    fn apply_database_url(&mut self, database_url: Option<String>) {
        if let Some(url) = database_url.filter(|url| !url.trim().is_empty()) {
            tracing::debug!("database uri overridden by {}", DATABASE_URL_ENV);
            self.app.database_uri = url;
        }
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    pub fn admin_password(&self) -> Option<&str> {
        self.admin_password
            .as_deref()
            .filter(|password| !password.trim().is_empty())
    }

    /// Lifetime of access JWTs.
    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_minutes.max(1))
    }

    /// Lifetime of refresh tokens.
    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_token_days.max(1))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const MINIMAL: &str = r#"
        [host]
        bindto = "0.0.0.0:8080"

        [app]
        jwt = "secret"
        database_uri = "postgres://localhost/coursely"
    "#;

    #[tokio::test]
    async fn config_test() {
        let config = Config::get_or_init(true).await;
        assert_eq!(config.host().bindto(), "127.0.0.1:5000"); // defaults
    }

    #[test]
    fn parse_fills_defaults() {
        let config = Config::parse(MINIMAL.as_bytes()).unwrap();
        assert_eq!(config.host().bindto(), "0.0.0.0:8080");
        assert!(!config.app().docs());
        assert_eq!(config.app().admin_password(), None);
        assert_eq!(config.app().access_token_ttl(), chrono::Duration::minutes(15));
        assert_eq!(config.app().refresh_token_ttl(), chrono::Duration::days(30));
    }

    #[test]
    fn blank_admin_password_is_unset() {
        let text = format!("{MINIMAL}admin_password = \"  \"\n");
        let config = Config::parse(text.as_bytes()).unwrap();
        assert_eq!(config.app().admin_password(), None);

        let text = format!("{MINIMAL}admin_password = \"s3cret\"\n");
        let config = Config::parse(text.as_bytes()).unwrap();
        assert_eq!(config.app().admin_password(), Some("s3cret"));
    }

    #[test]
    fn parse_rejects_missing_section() {
        let result = Config::parse(b"[host]\nbindto = \"x\"\n");
        assert!(matches!(result, Err(ConfigError::TomlDeError(_))));
    }

    #[test]
    fn database_url_overrides_config() {
        let mut config = Config::parse(MINIMAL.as_bytes()).unwrap();
        config.apply_database_url(Some("postgres://other/db".to_string()));
        assert_eq!(config.app().database_uri(), "postgres://other/db");

        config.apply_database_url(Some("   ".to_string()));
        assert_eq!(config.app().database_uri(), "postgres://other/db");

        config.apply_database_url(None);
        assert_eq!(config.app().database_uri(), "postgres://other/db");
    }
}
