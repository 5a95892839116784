//! Scripted backend for container tests.

use super::Backend;
use crate::types::api::{
    ChatRequest, ChatResponse, DeviceActionRequest, DeviceActionResponse, DeviceList,
    EventRequest, HomeEvent, HomeState, MemorySearchRequest, MemorySearchResponse,
    RecentEvents, SystemHealth, SystemLogs, SystemStatus, WorkingMemory,
};
use crate::types::{AriaError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

type Queue<T> = Mutex<VecDeque<Result<T>>>;

/// Answers each call with the next scripted result for that endpoint
#[derive(Default)]
pub struct ScriptedBackend {
    pub chat: Queue<ChatResponse>,
    pub status: Queue<SystemStatus>,
    pub health: Queue<SystemHealth>,
    pub logs: Queue<SystemLogs>,
    pub devices: Queue<DeviceList>,
    pub control: Queue<DeviceActionResponse>,
    pub recent: Queue<RecentEvents>,
    pub logged: Queue<HomeEvent>,
    pub search: Queue<MemorySearchResponse>,
    pub stats: Queue<Value>,
    pub clear: Queue<Value>,
    pub home: Queue<HomeState>,
    pub working: Queue<WorkingMemory>,

    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub control_requests: Mutex<Vec<DeviceActionRequest>>,
    pub search_requests: Mutex<Vec<MemorySearchRequest>>,

    /// When set, the next chat call waits for this signal before answering
    pub chat_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T>(queue: &Queue<T>, result: Result<T>) {
        queue.lock().unwrap().push_back(result);
    }

    /// Make the next chat call block until the returned sender fires
    pub fn gate_chat(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.chat_gate.lock().unwrap() = Some(rx);
        tx
    }
}

fn pop<T>(queue: &Queue<T>, endpoint: &str) -> Result<T> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(AriaError::Backend(format!("no scripted {} response", endpoint))))
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.chat_requests.lock().unwrap().push(request);
        let gate = self.chat_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        pop(&self.chat, "chat")
    }

    async fn system_status(&self) -> Result<SystemStatus> {
        pop(&self.status, "status")
    }

    async fn system_health(&self) -> Result<SystemHealth> {
        pop(&self.health, "health")
    }

    async fn system_logs(&self, _lines: u32) -> Result<SystemLogs> {
        pop(&self.logs, "logs")
    }

    async fn list_devices(&self) -> Result<DeviceList> {
        pop(&self.devices, "devices")
    }

    async fn control_device(&self, request: DeviceActionRequest) -> Result<DeviceActionResponse> {
        self.control_requests.lock().unwrap().push(request);
        pop(&self.control, "control")
    }

    async fn recent_events(&self, _limit: u32) -> Result<RecentEvents> {
        pop(&self.recent, "recent events")
    }

    async fn log_event(&self, _request: EventRequest) -> Result<HomeEvent> {
        pop(&self.logged, "log event")
    }

    async fn search_memory(&self, request: MemorySearchRequest) -> Result<MemorySearchResponse> {
        self.search_requests.lock().unwrap().push(request);
        pop(&self.search, "search")
    }

    async fn memory_stats(&self) -> Result<Value> {
        pop(&self.stats, "stats")
    }

    async fn clear_working_memory(&self) -> Result<Value> {
        pop(&self.clear, "clear working memory")
    }

    async fn home_state(&self) -> Result<HomeState> {
        pop(&self.home, "home state")
    }

    async fn working_memory(&self) -> Result<WorkingMemory> {
        pop(&self.working, "working memory")
    }
}
