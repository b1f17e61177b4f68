//! Query workflow: validate the selection, ask the backend for the events
//! of a date, and reduce the outcome to a [`WorkflowState`].

use thiserror::Error;
use tracing::{info, warn};

use crate::api::ApiError;
use crate::models::{ChatMessage, ChatRequest, DateSelection, HistoricEvent, MessageRole};
use crate::parser::{self, ParseError};
use crate::services::LlmProviderService;

pub const NO_MODEL_MESSAGE: &str = "Please select an AI model first.";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch historic events.";
pub const PARSE_FAILED_MESSAGE: &str = "Could not interpret response from the server.";

const HISTORIAN_INSTRUCTION: &str = "You are a historian with a deep knowledge of world \
history. When asked about a calendar date, pick notable historic events that happened on \
that day and month in any year. Choose them at random across eras and across every \
region of the world, without favoring any one country or continent. Answer with a JSON \
array of strings only. Each string starts with the four digit year, followed by a colon \
and one or two sentences describing the event.";

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    Loading,
    Success(Vec<HistoricEvent>),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("No AI model selected")]
    Validation,
    #[error("Request failed: {0}")]
    Network(#[from] ApiError),
    #[error("Could not parse response: {0}")]
    Parse(#[from] ParseError),
}

impl QueryError {
    /// Message shown to the user on the results card.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation => NO_MODEL_MESSAGE.to_string(),
            Self::Network(error) if error.message.trim().is_empty() => {
                FETCH_FAILED_MESSAGE.to_string()
            }
            Self::Network(error) => error.message.clone(),
            Self::Parse(_) => PARSE_FAILED_MESSAGE.to_string(),
        }
    }
}

impl From<Result<Vec<HistoricEvent>, QueryError>> for WorkflowState {
    fn from(result: Result<Vec<HistoricEvent>, QueryError>) -> Self {
        match result {
            Ok(events) => Self::Success(events),
            Err(error) => Self::Error(error.user_message()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub provider: String,
    pub date: String,
}

impl QueryRequest {
    pub fn new(model: &str, date: DateSelection) -> Result<Self, QueryError> {
        let provider = model.trim();
        if provider.is_empty() {
            return Err(QueryError::Validation);
        }
        Ok(Self {
            provider: provider.to_string(),
            date: date.query_string(),
        })
    }

    pub fn to_chat_request(&self) -> ChatRequest {
        ChatRequest {
            provider: self.provider.clone(),
            messages: vec![
                ChatMessage::new(MessageRole::Developer, HISTORIAN_INSTRUCTION),
                ChatMessage::new(
                    MessageRole::User,
                    format!(
                        "What notable historic events happened on {} (month-day)?",
                        self.date
                    ),
                ),
            ],
        }
    }
}

#[derive(Clone)]
pub struct QueryOrchestrator {
    service: LlmProviderService,
}

impl QueryOrchestrator {
    pub const fn new(service: LlmProviderService) -> Self {
        Self { service }
    }

    /// Run one submission to completion. An empty model fails before any
    /// request is sent.
    pub async fn submit(&self, model: &str, date: DateSelection) -> WorkflowState {
        let result = match QueryRequest::new(model, date) {
            Ok(request) => self.execute(&request).await,
            Err(error) => Err(error),
        };
        if let Err(error) = &result {
            warn!(%error, "Query failed");
        }
        result.into()
    }

    pub async fn execute(&self, request: &QueryRequest) -> Result<Vec<HistoricEvent>, QueryError> {
        info!(provider = %request.provider, date = %request.date, "Requesting historic events");
        let body = self.service.chat(&request.to_chat_request()).await?;
        let events = parser::parse_response_body(&body)?;
        info!(count = events.len(), "Parsed historic events");
        Ok(events)
    }
}
