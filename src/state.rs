use std::sync::Arc;

use crate::auth::SessionCodec;
use crate::config::AppConfig;
use crate::database::Store;
use crate::llm::TextGenerator;

/// Collaborators shared by every procedure. Constructed once in `main` and injected.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub llm: Arc<dyn TextGenerator>,
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionCodec>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        llm: Arc<dyn TextGenerator>,
        config: AppConfig,
        sessions: SessionCodec,
    ) -> Self {
        Self {
            store,
            llm,
            config: Arc::new(config),
            sessions: Arc::new(sessions),
        }
    }
}
