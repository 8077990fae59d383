//! Single-run controller.
//!
//! At most one download run is active at a time. Runs are spawned on the
//! tokio runtime; their outcome is kept for status queries and broadcast
//! over the WebSocket when they finish.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use picgrab_core::orchestrator::error_chain;
use picgrab_core::{DownloadOrchestrator, RunRequest, RunSummary, StopSignal};

use crate::api::WsBroadcaster;
use crate::metrics::RUN_ACTIVE;

/// Why a run could not be started or cancelled.
#[derive(Debug, Error)]
pub enum RunControlError {
    /// Another run is in progress.
    #[error("请不要重复点击按钮")]
    AlreadyRunning { run_id: Uuid },

    /// The run parameters are unusable.
    #[error("{0}")]
    InvalidRequest(String),

    /// Nothing to cancel.
    #[error("no run in progress")]
    NotRunning,
}

/// Snapshot of the controller for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    pub running: bool,
    pub run_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub stop_requested: bool,
    pub last_summary: Option<RunSummary>,
    pub last_error: Option<String>,
}

struct ActiveRun {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    stop: StopSignal,
    task: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct ControllerState {
    active: Option<ActiveRun>,
    last_summary: Option<RunSummary>,
    last_error: Option<String>,
}

/// Starts, cancels and tracks download runs.
#[derive(Clone)]
pub struct RunController {
    orchestrator: Arc<DownloadOrchestrator>,
    broadcaster: WsBroadcaster,
    state: Arc<Mutex<ControllerState>>,
}

impl RunController {
    pub fn new(orchestrator: Arc<DownloadOrchestrator>, broadcaster: WsBroadcaster) -> Self {
        Self {
            orchestrator,
            broadcaster,
            state: Arc::new(Mutex::new(ControllerState::default())),
        }
    }

    /// Starts a run in the background and returns its id.
    pub async fn start(&self, request: RunRequest) -> Result<Uuid, RunControlError> {
        request
            .validate()
            .map_err(|e| RunControlError::InvalidRequest(e.to_string()))?;

        let mut state = self.state.lock().await;
        if let Some(active) = &state.active {
            warn!(run_id = %active.run_id, "Start requested while a run is active");
            return Err(RunControlError::AlreadyRunning {
                run_id: active.run_id,
            });
        }

        let run_id = Uuid::new_v4();
        let stop = StopSignal::new();

        let controller = self.clone();
        let task_stop = stop.clone();
        let orchestrator = Arc::clone(&self.orchestrator);
        let task = tokio::spawn(async move {
            let run = tokio::spawn(async move {
                orchestrator
                    .run_with_id(run_id, &request, &task_stop)
                    .await
                    .map_err(|e| error_chain(&e))
            });
            // A panicking run must still release the active slot.
            let result = match run.await {
                Ok(result) => result,
                Err(e) => {
                    error!(%run_id, "Run task failed: {}", e);
                    Err(format!("run task failed: {}", e))
                }
            };
            controller.finish(run_id, result).await;
        });

        state.active = Some(ActiveRun {
            run_id,
            started_at: Utc::now(),
            stop,
            task: Some(task),
        });
        RUN_ACTIVE.set(1);
        info!(%run_id, "Run started");
        self.broadcaster.run_started(run_id);

        Ok(run_id)
    }

    /// Requests the active run to stop after its current step.
    pub async fn cancel(&self) -> Result<Uuid, RunControlError> {
        let state = self.state.lock().await;
        match &state.active {
            Some(active) => {
                active.stop.request_stop();
                info!(run_id = %active.run_id, "Stop requested");
                Ok(active.run_id)
            }
            None => Err(RunControlError::NotRunning),
        }
    }

    pub async fn status(&self) -> RunStatus {
        let state = self.state.lock().await;
        RunStatus {
            running: state.active.is_some(),
            run_id: state.active.as_ref().map(|a| a.run_id),
            started_at: state.active.as_ref().map(|a| a.started_at),
            stop_requested: state
                .active
                .as_ref()
                .is_some_and(|a| a.stop.is_stop_requested()),
            last_summary: state.last_summary.clone(),
            last_error: state.last_error.clone(),
        }
    }

    /// Stops the active run, if any, and waits for it to wind down.
    pub async fn shutdown(&self) {
        let task = {
            let mut state = self.state.lock().await;
            match state.active.as_mut() {
                Some(active) => {
                    active.stop.request_stop();
                    active.task.take()
                }
                None => None,
            }
        };

        if let Some(task) = task {
            info!("Waiting for active run to stop");
            if let Err(e) = task.await {
                warn!("Run task ended abnormally: {}", e);
            }
        }
    }

    async fn finish(&self, run_id: Uuid, result: Result<RunSummary, String>) {
        let mut state = self.state.lock().await;
        state.active = None;
        RUN_ACTIVE.set(0);

        match result {
            Ok(summary) => {
                self.broadcaster.run_finished(run_id, Some(&summary), None);
                state.last_summary = Some(summary);
                state.last_error = None;
            }
            Err(message) => {
                self.broadcaster
                    .run_finished(run_id, None, Some(message.clone()));
                state.last_error = Some(message);
            }
        }
    }
}
