use picgrab_core::{Config, RunRequest};

use crate::api::WsBroadcaster;
use crate::runs::RunController;

/// Shared application state
pub struct AppState {
    config: Config,
    runs: RunController,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(config: Config, runs: RunController, ws_broadcaster: WsBroadcaster) -> Self {
        Self {
            config,
            runs,
            ws_broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run parameters used when a start request overrides nothing.
    pub fn default_run_request(&self) -> RunRequest {
        self.config.download.to_run_request()
    }

    pub fn runs(&self) -> &RunController {
        &self.runs
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
