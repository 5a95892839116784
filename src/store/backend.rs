use crate::types::Result;
use crate::types::api::{
    ChatRequest, ChatResponse, DeviceActionRequest, DeviceActionResponse, DeviceList,
    EventRequest, HomeEvent, HomeState, MemorySearchRequest, MemorySearchResponse,
    RecentEvents, SystemHealth, SystemLogs, SystemStatus, WorkingMemory,
};
use async_trait::async_trait;
use serde_json::Value;

/// The REST surface the state containers talk to.
///
/// [`ApiClient`](crate::infrastructure::ApiClient) is the HTTP implementation;
/// anything else (an in-process backend, a recording fake) can stand in.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    async fn system_status(&self) -> Result<SystemStatus>;

    async fn system_health(&self) -> Result<SystemHealth>;

    async fn system_logs(&self, lines: u32) -> Result<SystemLogs>;

    async fn list_devices(&self) -> Result<DeviceList>;

    async fn control_device(&self, request: DeviceActionRequest) -> Result<DeviceActionResponse>;

    async fn recent_events(&self, limit: u32) -> Result<RecentEvents>;

    async fn log_event(&self, request: EventRequest) -> Result<HomeEvent>;

    async fn search_memory(&self, request: MemorySearchRequest) -> Result<MemorySearchResponse>;

    async fn memory_stats(&self) -> Result<Value>;

    async fn clear_working_memory(&self) -> Result<Value>;

    async fn home_state(&self) -> Result<HomeState>;

    async fn working_memory(&self) -> Result<WorkingMemory>;
}
