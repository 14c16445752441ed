use std::sync::Arc;

use sheetchat_persist::PersistenceClient;
use sheetchat_relay::ChatRelay;
use sheetchat_workbook::Workbook;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};

/// Shared application state passed to all handlers
///
/// `relay` is `None` when no provider key was configured at startup; chat
/// routes answer 500 in that case while the rest of the API keeps working.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persist: Arc<dyn PersistenceClient>,
    pub workbook: Workbook,
    pub relay: Option<Arc<ChatRelay>>,
}

impl AppState {
    pub fn new(
        config: Config,
        persist: Arc<dyn PersistenceClient>,
        workbook: Workbook,
        relay: Option<ChatRelay>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            persist,
            workbook,
            relay: relay.map(Arc::new),
        }
    }

    pub fn relay(&self) -> ApiResult<Arc<ChatRelay>> {
        self.relay.clone().ok_or(ApiError::MissingApiKey)
    }
}
