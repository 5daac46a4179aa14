use std::collections::HashMap;

use async_trait::async_trait;
use http::HeaderMap;
use tokio::sync::RwLock;

use crate::agent::{AgentState, Role};
use crate::error::AgentError;
use crate::info::{InterceptInfo, Metadata};
use crate::protocol::HEADER_INTERCEPT_ID;

/// Intercepts currently established for this workload, keyed by intercept id.
///
/// A query is intercepted when its intercept-id header names an active
/// intercept. Metadata given at activation (the `meta` flag of an intercept)
/// is returned with the answer. Whoever establishes and tears down
/// intercepts shares the instance with the server through an `Arc`.
#[derive(Debug)]
pub struct ActiveIntercepts {
    role: Role,
    intercepts: RwLock<HashMap<String, Metadata>>,
}

impl ActiveIntercepts {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            intercepts: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the metadata when `id` is already active.
    pub async fn activate(&self, id: impl Into<String>, metadata: Metadata) {
        let id = id.into();
        tracing::debug!(intercept_id = %id, "intercept activated");
        self.intercepts.write().await.insert(id, metadata);
    }

    /// Returns false when `id` was not active.
    pub async fn deactivate(&self, id: &str) -> bool {
        let removed = self.intercepts.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(intercept_id = %id, "intercept deactivated");
        }
        removed
    }

    pub async fn is_active(&self, id: &str) -> bool {
        self.intercepts.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.intercepts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.intercepts.read().await.is_empty()
    }
}

#[async_trait]
impl AgentState for ActiveIntercepts {
    async fn intercept_info(
        &self,
        _caller_intercept_id: &str,
        _path: &str,
        headers: &HeaderMap,
    ) -> Result<InterceptInfo, AgentError> {
        let client_side = self.role.client_side();
        let Some(id) = headers.get(HEADER_INTERCEPT_ID) else {
            return Ok(InterceptInfo::new(false, client_side));
        };
        // A header that is not visible ASCII cannot name an intercept.
        let Ok(id) = id.to_str() else {
            return Ok(InterceptInfo::new(false, client_side));
        };

        let intercepts = self.intercepts.read().await;
        let info = match intercepts.get(id) {
            Some(metadata) if metadata.is_empty() => InterceptInfo::new(true, client_side),
            Some(metadata) => InterceptInfo::new(true, client_side).with_metadata(metadata.clone()),
            None => InterceptInfo::new(false, client_side),
        };
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn with_intercept_id(id: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_INTERCEPT_ID, HeaderValue::from_static(id));
        headers
    }

    #[tokio::test]
    async fn answers_follow_activation() {
        let state = ActiveIntercepts::new(Role::Cluster);
        let query = with_intercept_id("abc:123");

        let before = state.intercept_info("", "/", &query).await.unwrap();
        assert_eq!(before, InterceptInfo::new(false, false));

        state.activate("abc:123", Metadata::new()).await;
        let during = state.intercept_info("", "/", &query).await.unwrap();
        assert_eq!(during, InterceptInfo::new(true, false));

        assert!(state.deactivate("abc:123").await);
        assert!(!state.deactivate("abc:123").await);
        let after = state.intercept_info("", "/", &query).await.unwrap();
        assert!(!after.intercepted);
    }

    #[tokio::test]
    async fn returns_metadata_of_the_matching_intercept() {
        let state = ActiveIntercepts::new(Role::Client);
        let meta = Metadata::from([("owner".to_string(), "dev".to_string())]);
        state.activate("abc:123", meta.clone()).await;
        state.activate("other:1", Metadata::new()).await;

        let info = state
            .intercept_info("", "/", &with_intercept_id("abc:123"))
            .await
            .unwrap();
        assert_eq!(info, InterceptInfo::new(true, true).with_metadata(meta));
        assert_eq!(state.len().await, 2);
    }

    #[tokio::test]
    async fn missing_header_is_not_intercepted() {
        let state = ActiveIntercepts::new(Role::Client);
        state.activate("", Metadata::new()).await;
        let info = state
            .intercept_info("", "/", &HeaderMap::new())
            .await
            .unwrap();
        assert!(!info.intercepted);
        assert!(state.is_active("").await);
    }
}
