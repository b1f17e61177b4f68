// Event types for async communication

use crate::workflow::WorkflowState;

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Result of `GET /models`, with the user-facing error message on failure
    ModelsLoaded(Result<Vec<String>, String>),
    /// Result of the startup health check
    HealthChecked(bool),
    /// A submission finished; stale tickets are ignored by the app
    QueryFinished { ticket: u64, state: WorkflowState },
}
