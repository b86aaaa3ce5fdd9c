//! Environment configuration for the kinotek services.
//!
//! Every key a process reads is enumerated here and loaded once in `main`;
//! services never touch the environment themselves. A `.env` file is loaded
//! when present, real environment variables win.

use std::env;
use std::path::PathBuf;

use anyhow::Context;

/// Settings for the query API process.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub server_host: String,
    pub server_port: u16,
    pub es_url: String,
    pub redis_url: String,
}

impl ApiSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("SERVER_PORT must be a port number")?,
            es_url: es_url_from(
                env::var("ES_URL").ok(),
                env::var("ES_HOST").ok(),
                env::var("ES_PORT").ok(),
            )?,
            redis_url: redis_url_from(
                env::var("REDIS_HOST").context("REDIS_HOST is required")?,
                env::var("REDIS_PORT").ok(),
            ),
        })
    }
}

/// Settings for the ETL process.
#[derive(Debug, Clone)]
pub struct EtlSettings {
    pub postgres: PostgresSettings,
    pub es_url: String,
    pub state_path: PathBuf,
}

impl EtlSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            postgres: PostgresSettings::from_env()?,
            es_url: es_url_from(
                env::var("ES_URL").ok(),
                env::var("ES_HOST").ok(),
                env::var("ES_PORT").ok(),
            )?,
            state_path: env::var("ETL_STATE_PATH")
                .unwrap_or_else(|_| "states/state.json".to_string())
                .into(),
        })
    }
}

/// Connection parameters for the relational source of truth.
#[derive(Debug, Clone)]
pub struct PostgresSettings {
    pub user: String,
    pub password: String,
    pub db: String,
    pub host: String,
    pub port: u16,
}

impl PostgresSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            user: env::var("POSTGRES_USER").context("POSTGRES_USER is required")?,
            password: env::var("POSTGRES_PASSWORD").context("POSTGRES_PASSWORD is required")?,
            db: env::var("POSTGRES_DB").context("POSTGRES_DB is required")?,
            host: env::var("POSTGRES_HOST").context("POSTGRES_HOST is required")?,
            port: env::var("POSTGRES_PORT")
                .unwrap_or_else(|_| "5432".to_string())
                .parse()
                .context("POSTGRES_PORT must be a port number")?,
        })
    }

    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.db
        )
    }
}

/// `ES_URL` wins when set; otherwise `ES_HOST` (+ optional `ES_PORT`,
/// default 9200) is assembled into an http URL.
fn es_url_from(
    url: Option<String>,
    host: Option<String>,
    port: Option<String>,
) -> anyhow::Result<String> {
    if let Some(url) = url {
        return Ok(url);
    }
    let host = host.context("either ES_URL or ES_HOST must be set")?;
    let port = port.unwrap_or_else(|| "9200".to_string());
    Ok(format!("http://{host}:{port}"))
}

fn redis_url_from(host: String, port: Option<String>) -> String {
    let port = port.unwrap_or_else(|| "6379".to_string());
    format!("redis://{host}:{port}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn es_url_prefers_the_explicit_url() {
        let url = es_url_from(
            Some("http://search:9200".to_string()),
            Some("ignored".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(url, "http://search:9200");
    }

    #[test]
    fn es_url_assembles_host_and_port() {
        let url = es_url_from(None, Some("es".to_string()), Some("9201".to_string())).unwrap();
        assert_eq!(url, "http://es:9201");

        let url = es_url_from(None, Some("es".to_string()), None).unwrap();
        assert_eq!(url, "http://es:9200");
    }

    #[test]
    fn es_url_requires_some_source() {
        assert!(es_url_from(None, None, None).is_err());
    }

    #[test]
    fn postgres_connection_string_shape() {
        let pg = PostgresSettings {
            user: "app".to_string(),
            password: "secret".to_string(),
            db: "movies".to_string(),
            host: "db".to_string(),
            port: 5432,
        };
        assert_eq!(
            pg.connection_string(),
            "postgres://app:secret@db:5432/movies"
        );
    }

    #[test]
    fn redis_url_defaults_the_port() {
        assert_eq!(redis_url_from("cache".to_string(), None), "redis://cache:6379");
    }
}
