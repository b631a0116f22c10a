use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

/// External image host for design sketches and payment screenshots.
#[derive(Deserialize, Clone, Debug)]
pub struct StorageConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("ATELIER_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("ATELIER_SERVICE_PORT")
            .unwrap_or_else(|_| "3005".to_string())
            .parse()?;

        let db_url = env::var("ATELIER_DATABASE_URL").expect("ATELIER_DATABASE_URL must be set");
        let db_name =
            env::var("ATELIER_DATABASE_NAME").unwrap_or_else(|_| "atelier_db".to_string());

        let storage_url = env::var("ATELIER_IMAGE_HOST_URL").unwrap_or_default();
        let storage_key = env::var("ATELIER_IMAGE_HOST_KEY").unwrap_or_default();

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name,
            },
            storage: StorageConfig {
                api_url: storage_url,
                api_key: Secret::new(storage_key),
            },
            service_name: "atelier-service".to_string(),
        })
    }
}
