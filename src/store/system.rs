use super::Backend;
use crate::types::Result;
use crate::types::api::{SystemHealth, SystemStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const STATUS_ONLINE: &str = "online";
const HEALTH_OK: &str = "ok";

#[derive(Debug, Clone, Default)]
pub struct SystemState {
    pub status: Option<SystemStatus>,
    pub health: Option<SystemHealth>,
    pub logs: Vec<String>,
    /// Written by both status and health fetches; the last one wins
    pub is_online: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Backend status, health and log tail
#[derive(Clone)]
pub struct SystemContainer {
    backend: Arc<dyn Backend>,
    state: Arc<watch::Sender<SystemState>>,
}

impl SystemContainer {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: Arc::new(watch::Sender::new(SystemState::default())),
        }
    }

    pub fn snapshot(&self) -> SystemState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SystemState> {
        self.state.subscribe()
    }

    /// Replace the status snapshot; online when the backend reports `online`
    pub async fn fetch_status(&self) -> Result<SystemStatus> {
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let result = self.backend.system_status().await;

        self.state.send_modify(|state| {
            state.is_loading = false;
            match &result {
                Ok(status) => {
                    state.is_online = status.status == STATUS_ONLINE;
                    state.status = Some(status.clone());
                }
                Err(err) => {
                    tracing::warn!("Failed to fetch system status: {}", err);
                    state.is_online = false;
                    state.error = Some(err.to_string());
                }
            }
        });

        result
    }

    /// Lightweight liveness check; online when the backend reports `ok`
    pub async fn fetch_health(&self) -> Result<SystemHealth> {
        let result = self.backend.system_health().await;

        self.state.send_modify(|state| match &result {
            Ok(health) => {
                state.is_online = health.status == HEALTH_OK;
                state.health = Some(health.clone());
            }
            Err(err) => {
                tracing::warn!("Health check failed: {}", err);
                state.is_online = false;
            }
        });

        result
    }

    /// Fetch the last `lines` backend log lines
    pub async fn fetch_logs(&self, lines: u32) -> Result<Vec<String>> {
        match self.backend.system_logs(lines).await {
            Ok(logs) => {
                if let Some(error) = &logs.error {
                    tracing::warn!("Backend could not read its logs: {}", error);
                }
                self.state
                    .send_modify(|state| state.logs = logs.logs.clone());
                Ok(logs.logs)
            }
            Err(err) => {
                tracing::warn!("Failed to fetch system logs: {}", err);
                self.state
                    .send_modify(|state| state.error = Some(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn set_online(&self, online: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.is_online != online;
            state.is_online = online;
            changed
        });
    }

    /// Poll [`fetch_status`](Self::fetch_status) every `interval`.
    ///
    /// The first poll runs immediately. Failures are logged and polling
    /// continues; abort the returned handle to stop.
    pub fn spawn_status_poller(&self, interval: Duration) -> JoinHandle<()> {
        let container = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = container.fetch_status().await {
                    tracing::debug!("Status poll failed: {}", e);
                }
            }
        })
    }
}
