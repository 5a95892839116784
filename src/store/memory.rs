use super::Backend;
use crate::types::Result;
use crate::types::api::{MemoryResult, MemorySearchRequest, WorkingMemoryEntry};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub query: String,
    pub collection: String,
    pub results: Vec<MemoryResult>,
    pub stats: Option<Value>,
    /// Conversation context the backend is currently holding
    pub working_memory: Vec<WorkingMemoryEntry>,
    pub is_searching: bool,
    pub error: Option<String>,
}

/// Long-term memory search and stats
#[derive(Clone)]
pub struct MemoryContainer {
    backend: Arc<dyn Backend>,
    state: Arc<watch::Sender<MemoryState>>,
}

impl MemoryContainer {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: Arc::new(watch::Sender::new(MemoryState::default())),
        }
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MemoryState> {
        self.state.subscribe()
    }

    /// Search `collection` for `query`. A blank query is not sent.
    pub async fn search(
        &self,
        query: &str,
        collection: &str,
        n_results: u32,
    ) -> Result<Vec<MemoryResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.state.send_modify(|state| {
            state.is_searching = true;
            state.error = None;
            state.query = query.to_string();
            state.collection = collection.to_string();
        });

        let request = MemorySearchRequest {
            query: query.to_string(),
            collection: collection.to_string(),
            n_results,
        };
        let result = self.backend.search_memory(request).await;

        self.state.send_modify(|state| {
            state.is_searching = false;
            match &result {
                Ok(response) => state.results = response.results.clone(),
                Err(err) => {
                    tracing::warn!("Memory search failed: {}", err);
                    state.error = Some(err.to_string());
                }
            }
        });

        result.map(|response| response.results)
    }

    pub async fn load_stats(&self) -> Result<Value> {
        match self.backend.memory_stats().await {
            Ok(stats) => {
                self.state
                    .send_modify(|state| state.stats = Some(stats.clone()));
                Ok(stats)
            }
            Err(err) => {
                tracing::warn!("Failed to load memory stats: {}", err);
                self.state
                    .send_modify(|state| state.error = Some(err.to_string()));
                Err(err)
            }
        }
    }

    pub async fn load_working_memory(&self) -> Result<Vec<WorkingMemoryEntry>> {
        match self.backend.working_memory().await {
            Ok(memory) => {
                self.state.send_modify(|state| {
                    state.working_memory = memory.working_memory.clone();
                });
                Ok(memory.working_memory)
            }
            Err(err) => {
                tracing::warn!("Failed to load working memory: {}", err);
                self.state
                    .send_modify(|state| state.error = Some(err.to_string()));
                Err(err)
            }
        }
    }

    /// Empty the backend's working memory
    pub async fn clear_working(&self) -> Result<()> {
        match self.backend.clear_working_memory().await {
            Ok(_) => {
                tracing::info!("Working memory cleared");
                self.state
                    .send_modify(|state| state.working_memory.clear());
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Failed to clear working memory: {}", err);
                self.state
                    .send_modify(|state| state.error = Some(err.to_string()));
                Err(err)
            }
        }
    }
}
