//! Configuration for the product service

use core_config::{AppInfo, FromEnv, app_info, env_or_default, server::ServerConfig};
use database::mongodb::MongoConfig;
use domain_products::DEFAULT_COLLECTION;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// Collection holding product documents (`PRODUCTS_COLLECTION`)
    pub products_collection: String,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mongodb = MongoConfig::from_env()?;
        let server = ServerConfig::from_env()?;

        let products_collection = env_or_default("PRODUCTS_COLLECTION", DEFAULT_COLLECTION);
        if products_collection.trim().is_empty() {
            eyre::bail!("PRODUCTS_COLLECTION must not be empty");
        }

        Ok(Self {
            app: app_info!(),
            mongodb,
            server,
            environment,
            products_collection,
        })
    }
}
