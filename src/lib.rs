pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{AppConfig, LocalStorage};

pub use adapters::{CachedSource, OepClient};
pub use core::{
    etl::{transform, EtlEngine},
    registry::MappingRegistry,
};
pub use domain::model::{OutputFormat, ScenarioIdentifier, ScenarioRequest, SerializedResult};
pub use utils::error::{EtlError, MappingError, Result};

use std::sync::Arc;
use std::time::Duration;

/// 依配置組出完整的引擎：映射註冊表 + OEP 客戶端（可選快取）
pub fn build_engine(config: &AppConfig) -> Result<server::SharedEngine> {
    let registry = match &config.mappings.directory {
        Some(dir) => MappingRegistry::from_dir(dir)?,
        None => MappingRegistry::builtin()?,
    };
    tracing::info!("🗺️ Mappings available: {}", registry.names().join(", "));

    let client = OepClient::new(&config.upstream);
    let source: Arc<dyn core::ScenarioSource> = if config.cache.enabled {
        tracing::info!(
            "⚡ Fetch cache enabled (capacity: {}, ttl: {:?}s)",
            config.cache.capacity,
            config.cache.ttl_seconds
        );
        Arc::new(CachedSource::new(
            client,
            config.cache.capacity,
            config.cache.ttl_seconds.map(Duration::from_secs),
        ))
    } else {
        Arc::new(client)
    };

    let engine = EtlEngine::new(source, Arc::new(registry))
        .with_archive_filename(config.server.archive_filename.clone());
    Ok(Arc::new(engine))
}
