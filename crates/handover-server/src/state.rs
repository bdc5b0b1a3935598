use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

use handover_client::HttpOrchestratorClient;
use handover_core::config::Config;
use handover_core::{
    paths, DefaultEventHandler, OrchestrationInterceptor, OrchestratorClient, RedbStore,
    SecondaryResponseInterceptor, TimeoutClient,
};

use crate::events::{BroadcastingEventHandler, LifecycleEvent};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub config: Arc<Config>,
    pub store: Arc<RedbStore>,
    pub interceptor: Arc<OrchestrationInterceptor>,
    pub secondary: Arc<SecondaryResponseInterceptor>,
    pub event_tx: broadcast::Sender<LifecycleEvent>,
}

impl AppState {
    /// Load `.handover/config.yaml`, open the store and connect to the
    /// orchestrator configured there.
    pub fn new(root: PathBuf) -> anyhow::Result<Self> {
        let config = Config::load(&root)?;
        let http = HttpOrchestratorClient::from_config(&config.orchestrator)?;
        let base_url = http.base_url().to_string();
        let client = TimeoutClient::new(http, config.orchestrator.timeout());
        tracing::info!(%base_url, timeout = ?client.timeout(), "orchestrator client ready");
        Self::with_client(root, config, Arc::new(client))
    }

    /// Same as `new` with an explicit orchestrator client.
    pub fn with_client(
        root: PathBuf,
        config: Config,
        client: Arc<dyn OrchestratorClient>,
    ) -> anyhow::Result<Self> {
        let store = Arc::new(RedbStore::open(&paths::db_path(&root))?);
        let purged = store.purge_expired_flags()?;
        if purged > 0 {
            tracing::info!(purged, "removed expired session flags");
        }

        let (event_tx, _) = broadcast::channel(64);
        let events = BroadcastingEventHandler::new(
            Arc::new(DefaultEventHandler::new(
                config.messages.clone(),
                config.orchestration.comeback_story.clone(),
            )),
            event_tx.clone(),
        );
        let interceptor =
            OrchestrationInterceptor::builder(&config, store.clone(), store.clone(), client)
                .event_handler(Arc::new(events))
                .build();
        let secondary =
            SecondaryResponseInterceptor::new(store.clone(), config.orchestration.flag_ttl());

        Ok(Self {
            root,
            config: Arc::new(config),
            store,
            interceptor: Arc::new(interceptor),
            secondary: Arc::new(secondary),
            event_tx,
        })
    }
}
