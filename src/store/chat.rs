use super::Backend;
use crate::types::Result;
use crate::types::api::{ChatRequest, ChatResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Tool activity attached to an assistant reply
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub tool_calls: Option<Vec<Value>>,
    pub tool_results: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub metadata: Option<MessageMetadata>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    /// Assigned by the backend on the first reply; kept until cleared
    pub session_id: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
    generation: u64,
    next_id: u64,
}

impl ChatState {
    fn push(&mut self, role: Role, content: String, metadata: Option<MessageMetadata>) {
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id: self.next_id,
            role,
            content,
            metadata,
            timestamp: Utc::now(),
        });
    }
}

/// Conversation with the assistant
#[derive(Clone)]
pub struct ChatContainer {
    backend: Arc<dyn Backend>,
    state: Arc<watch::Sender<ChatState>>,
}

impl ChatContainer {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: Arc::new(watch::Sender::new(ChatState::default())),
        }
    }

    pub fn snapshot(&self) -> ChatState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    /// Send a user message and append the assistant's reply.
    ///
    /// The user message is appended before the request goes out and stays
    /// even if the request fails. On failure a `System` message describing
    /// the error is appended and the error is returned. A reply arriving
    /// after [`clear_messages`](Self::clear_messages) is discarded.
    pub async fn send_user_message(&self, content: impl Into<String>) -> Result<ChatResponse> {
        let content = content.into();

        let mut issued = (0, None);
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
            state.push(Role::User, content.clone(), None);
            issued = (state.generation, state.session_id.clone());
        });
        let (generation, session_id) = issued;

        let request = ChatRequest {
            message: content,
            session_id,
            stream: false,
        };

        match self.backend.chat(request).await {
            Ok(response) => {
                self.state.send_if_modified(|state| {
                    if state.generation != generation {
                        tracing::debug!("Discarding chat reply for a cleared conversation");
                        return false;
                    }

                    if state.session_id.is_none()
                        && let Some(session_id) = &response.session_id
                    {
                        tracing::debug!("Adopting chat session {}", session_id);
                        state.session_id = Some(session_id.clone());
                    }

                    let metadata = MessageMetadata {
                        tool_calls: response.tool_calls.clone(),
                        tool_results: response.tool_results.clone(),
                    };
                    state.push(Role::Assistant, response.response.clone(), Some(metadata));
                    state.is_loading = false;
                    true
                });
                Ok(response)
            }
            Err(err) => {
                tracing::warn!("Chat request failed: {}", err);
                self.state.send_if_modified(|state| {
                    if state.generation != generation {
                        return false;
                    }
                    state.is_loading = false;
                    state.error = Some(err.to_string());
                    state.push(Role::System, format!("Error: {}", err), None);
                    true
                });
                Err(err)
            }
        }
    }

    /// Drop every message and the session id
    pub fn clear_messages(&self) {
        self.state.send_modify(|state| {
            state.messages.clear();
            state.session_id = None;
            state.error = None;
            state.is_loading = false;
            state.generation += 1;
        });
    }

    /// Resume an existing backend session
    pub fn set_session_id(&self, session_id: impl Into<String>) {
        let session_id = session_id.into();
        self.state
            .send_modify(|state| state.session_id = Some(session_id));
    }
}
