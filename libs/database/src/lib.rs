//! Database connectors and helpers
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB connection, retry and health checks
//! - `config` - `core_config::FromEnv` for the connection settings
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::mongodb::{connect_from_config_with_retry, MongoConfig};
//!
//! let config = MongoConfig::from_env()?;
//! let client = connect_from_config_with_retry(&config, None).await?;
//! let db = client.database(config.database());
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
