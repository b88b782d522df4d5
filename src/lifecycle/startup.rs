//! Startup wiring of external collaborators.
//!
//! Any failure here is fatal: the gateway refuses to start with a store it
//! cannot construct or a GeoIP database it cannot open.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{GatewayConfig, StoreKind};
use crate::http::Collaborators;
use crate::security::geo::{GeoLookup, MaxMindGeoLookup, NoGeoLookup};
use crate::store::{BlockStore, MemoryStore, RestDocumentStore, StoreError, TelemetryStore};
use crate::upstream::{HttpContentApi, UpstreamError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("document store: {0}")]
    Store(#[from] StoreError),
    #[error("upstream client: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("GeoIP database {path}: {source}")]
    GeoIp {
        path: String,
        source: maxminddb::MaxMindDBError,
    },
}

pub fn build_collaborators(config: &GatewayConfig) -> Result<Collaborators, StartupError> {
    let (block_store, telemetry_store): (Arc<dyn BlockStore>, Arc<dyn TelemetryStore>) =
        match config.store.kind {
            StoreKind::Memory => {
                tracing::warn!("Using in-memory document store; telemetry is lost on restart");
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store)
            }
            StoreKind::Rest => {
                let store = Arc::new(RestDocumentStore::new(
                    &config.store.base_url,
                    Duration::from_secs(config.store.timeout_secs),
                )?);
                tracing::info!(base_url = %config.store.base_url, "Using REST document store");
                (store.clone(), store)
            }
        };

    let geo: Arc<dyn GeoLookup> = match &config.geoip.city_db {
        Some(path) => {
            let lookup = MaxMindGeoLookup::open(Path::new(path)).map_err(|source| StartupError::GeoIp {
                path: path.clone(),
                source,
            })?;
            Arc::new(lookup)
        }
        None => {
            tracing::info!("No GeoIP database configured; countries resolve as unknown");
            Arc::new(NoGeoLookup)
        }
    };

    let content_api = Arc::new(HttpContentApi::new(Duration::from_secs(
        config.upstream.timeout_secs,
    ))?);

    Ok(Collaborators {
        block_store,
        telemetry_store,
        geo,
        content_api,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds() {
        assert!(build_collaborators(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_missing_geoip_database_is_fatal() {
        let mut config = GatewayConfig::default();
        config.geoip.city_db = Some("/nonexistent/GeoLite2-City.mmdb".into());
        assert!(matches!(
            build_collaborators(&config),
            Err(StartupError::GeoIp { .. })
        ));
    }
}
