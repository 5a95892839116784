use crate::config::AriaConfig;
use crate::store::Backend;
use crate::types::api::{
    ChatRequest, ChatResponse, DeviceActionRequest, DeviceActionResponse, DeviceList,
    EventRequest, HomeEvent, HomeState, MemorySearchRequest, MemorySearchResponse,
    RecentEvents, SystemHealth, SystemLogs, SystemStatus, WorkingMemory,
};
use crate::types::{API_PREFIX, AriaError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// REST client for the ARIA backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &AriaConfig) -> Result<Self> {
        let base = api_base_url(&config.api_url)?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { base, http })
    }

    /// Base URL every endpoint is resolved against (ends in `/api/`)
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self.http.get(self.url(path)?).query(query);
        self.execute(path, request).await
    }

    async fn post<B, T>(&self, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.post(self.url(path)?);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(path, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Request to {} failed with status {}", path, status);
            return Err(AriaError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Request to {} succeeded with status {}", path, status);
        response.json::<T>().await.map_err(classify)
    }
}

/// Resolve `<api_url>/api/` so relative endpoint paths join under the prefix
pub fn api_base_url(api_url: &str) -> Result<Url> {
    let base = format!("{}{}/", api_url.trim_end_matches('/'), API_PREFIX);
    Ok(Url::parse(&base)?)
}

fn classify(e: reqwest::Error) -> AriaError {
    if e.is_timeout() {
        AriaError::Timeout
    } else {
        AriaError::Http(e)
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.post("/chat", Some(&request)).await
    }

    async fn system_status(&self) -> Result<SystemStatus> {
        self.get("/system/status", &[]).await
    }

    async fn system_health(&self) -> Result<SystemHealth> {
        self.get("/system/health", &[]).await
    }

    async fn system_logs(&self, lines: u32) -> Result<SystemLogs> {
        self.get("/system/logs", &[("lines", lines.to_string())])
            .await
    }

    async fn list_devices(&self) -> Result<DeviceList> {
        self.get("/devices/list", &[]).await
    }

    async fn control_device(&self, request: DeviceActionRequest) -> Result<DeviceActionResponse> {
        self.post("/devices/action", Some(&request)).await
    }

    async fn recent_events(&self, limit: u32) -> Result<RecentEvents> {
        self.get("/events/recent", &[("limit", limit.to_string())])
            .await
    }

    async fn log_event(&self, request: EventRequest) -> Result<HomeEvent> {
        self.post("/events", Some(&request)).await
    }

    async fn search_memory(&self, request: MemorySearchRequest) -> Result<MemorySearchResponse> {
        self.post("/memory/search", Some(&request)).await
    }

    async fn memory_stats(&self) -> Result<Value> {
        self.get("/memory/stats", &[]).await
    }

    async fn clear_working_memory(&self) -> Result<Value> {
        self.post::<Value, Value>("/memory/clear-working", None).await
    }

    async fn home_state(&self) -> Result<HomeState> {
        self.get("/context/home-state", &[]).await
    }

    async fn working_memory(&self) -> Result<WorkingMemory> {
        self.get("/context/working-memory", &[]).await
    }
}
