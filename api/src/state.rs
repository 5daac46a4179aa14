use std::sync::Arc;

use iqs_core::AgentState;

#[derive(Clone)]
pub struct AppState {
    /// Sole source of answers, shared by every connection.
    pub agent: Arc<dyn AgentState>,
}
