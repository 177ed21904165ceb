use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    admin: Option<Admin>,
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
    #[serde(default = "default_token_ttl_hours")]
    token_ttl_hours: i64,
    #[serde(default = "default_max_connections")]
    max_connections: u32,
}

/// Bootstrap administrator, created on startup when missing.
#[derive(Debug, Deserialize)]
pub struct Admin {
    username: String,
    email: String,
    password: String,
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_max_connections() -> u32 {
    10
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                match Self::load(use_local) {
                    Ok(c) => c,
                    Err(ConfigError::ConfigNotFound) => {
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                    Err(e) => {
                        crate::error::log_error(&e);
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    pub fn load(use_local: bool) -> ConfigResult<Self> {
        let bytes = read_config(use_local)?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        let config: Self = toml::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        let invalid = |key, reason| Err(ConfigError::InvalidValue { key, reason });

        if self.app.jwt.trim().is_empty() {
            return invalid("app.jwt", "signing secret must not be empty");
        }
        if self.app.token_ttl_hours <= 0 {
            return invalid("app.token_ttl_hours", "must be positive");
        }
        if self.app.max_connections == 0 {
            return invalid("app.max_connections", "must be positive");
        }
        match &self.admin {
            Some(admin) if admin.username.trim().is_empty() || admin.password.is_empty() => {
                invalid("admin", "username and password are required")
            }
            _ => Ok(()),
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

    #[inline]
    pub fn admin(&self) -> Option<&Admin> {
        self.admin.as_ref()
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

    #[inline]
    pub fn token_ttl_hours(&self) -> i64 {
        self.token_ttl_hours
    }

    #[inline]
    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }
}

impl Admin {
    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[inline]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[inline]
    pub fn password(&self) -> &str {
        &self.password
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn config_test() {
        let config = Config::get_or_init(true).await;
        assert_eq!(config.host().bindto(), "127.0.0.1:5000"); // defaults
        assert_eq!(config.admin().map(|a| a.username()), Some("admin"));
    }

    #[test]
    fn config_defaults_applied() {
        let raw = br#"
            [host]
            bindto = "0.0.0.0:8080"

            [app]
            jwt = "secret"
            database_uri = "postgres://localhost/db"
        "#;

        let config = Config::from_slice(raw).unwrap();
        assert_eq!(config.app().token_ttl_hours(), 24);
        assert_eq!(config.app().max_connections(), 10);
        assert!(!config.app().docs());
        assert!(config.admin().is_none());
    }

    #[test]
    fn config_rejects_bad_values() {
        let raw = br#"
            [host]
            bindto = "0.0.0.0:8080"

            [app]
            jwt = "secret"
            database_uri = "postgres://localhost/db"
            token_ttl_hours = 0
        "#;

        let result = Config::from_slice(raw);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "app.token_ttl_hours", .. })
        ));

        let raw = br#"
            [host]
            bindto = "0.0.0.0:8080"

            [app]
            jwt = ""
            database_uri = "postgres://localhost/db"
        "#;
        assert!(matches!(
            Config::from_slice(raw),
            Err(ConfigError::InvalidValue { key: "app.jwt", .. })
        ));
    }

    #[test]
    fn config_missing_section_is_error() {
        let raw = br#"
            [host]
            bindto = "0.0.0.0:8080"
        "#;

        let result = Config::from_slice(raw);
        assert!(matches!(result, Err(ConfigError::TomlDeError(_))));
    }
}
