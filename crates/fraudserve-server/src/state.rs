//! Application state shared across all requests

use crate::config::ServerConfig;
use fraudserve_model::{ArtifactRegistry, ModelService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::info;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// The model service, read-only once loaded
    pub service: Arc<ModelService>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Build state around a service that has already been initialized
    pub fn new(
        config: ServerConfig,
        service: Arc<ModelService>,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            config: Arc::new(config),
            service,
            metrics_handle,
        }
    }

    /// Scan the artifact store, load the model and build state.
    ///
    /// Loading reads and deserializes the artifact, so it runs on the
    /// blocking pool.
    pub async fn load(
        config: ServerConfig,
        metrics_handle: PrometheusHandle,
    ) -> anyhow::Result<Self> {
        info!(
            artifact_dir = %config.registry.artifact_dir.display(),
            "Initializing model service"
        );

        let service = Arc::new(ModelService::new(ArtifactRegistry::new(
            config.registry.clone(),
        )));

        let loader = Arc::clone(&service);
        tokio::task::spawn_blocking(move || loader.init()).await??;

        Ok(Self::new(config, service, metrics_handle))
    }
}
