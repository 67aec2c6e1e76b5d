use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{PreviewRegistry, TicketBackend};
use crate::workflow::sync::DraftSynchronizer;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub backend: Arc<dyn TicketBackend>,
    pub previews: Arc<dyn PreviewRegistry>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        backend: Arc<dyn TicketBackend>,
        previews: Arc<dyn PreviewRegistry>,
    ) -> Self {
        Self {
            config,
            backend,
            previews,
        }
    }

    /// A fresh editing session; one per ticket being edited.
    pub fn synchronizer(&self) -> DraftSynchronizer {
        DraftSynchronizer::new(
            self.backend.clone(),
            self.previews.clone(),
            self.config.preview_release_after,
        )
    }
}
