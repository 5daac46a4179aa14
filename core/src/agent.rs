use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;

use crate::error::{AgentError, ConfigError};
use crate::info::InterceptInfo;

/// Which side of the intercept answers queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Sensor running on the developer workstation.
    Client,
    /// Agent running beside the workload in the cluster.
    Cluster,
}

impl Role {
    pub fn client_side(self) -> bool {
        matches!(self, Role::Client)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Cluster => "cluster",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "cluster" => Ok(Role::Cluster),
            other => Err(ConfigError::UnknownRole(other.to_string())),
        }
    }
}

/// Decides the intercept status of a single request.
///
/// One instance is bound to a query server and invoked concurrently from
/// every connection, so implementations synchronize their own state.
/// The server drops the returned future when the caller goes away;
/// implementations doing I/O must tolerate that.
///
/// `caller_intercept_id` is empty when the caller did not send one. `path` is
/// the path of the query request. `headers` is the full header set of the
/// query request.
#[async_trait]
pub trait AgentState: Send + Sync + 'static {
    async fn intercept_info(
        &self,
        caller_intercept_id: &str,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<InterceptInfo, AgentError>;
}

#[async_trait]
impl<A: AgentState + ?Sized> AgentState for Arc<A> {
    async fn intercept_info(
        &self,
        caller_intercept_id: &str,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<InterceptInfo, AgentError> {
        (**self)
            .intercept_info(caller_intercept_id, path, headers)
            .await
    }
}

#[async_trait]
impl<A: AgentState + ?Sized> AgentState for Box<A> {
    async fn intercept_info(
        &self,
        caller_intercept_id: &str,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<InterceptInfo, AgentError> {
        (**self)
            .intercept_info(caller_intercept_id, path, headers)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Client".parse::<Role>().unwrap(), Role::Client);
        assert_eq!(" cluster ".parse::<Role>().unwrap(), Role::Cluster);
        assert!(matches!(
            "sidecar".parse::<Role>(),
            Err(ConfigError::UnknownRole(_))
        ));
    }

    #[test]
    fn only_client_role_is_client_side() {
        assert!(Role::Client.client_side());
        assert!(!Role::Cluster.client_side());
    }
}
