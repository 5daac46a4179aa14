//! Reference decision policies.
//!
//! Each policy fixes its [`Role`] at construction, so every answer from one
//! instance reports the same `client_side` value.

use async_trait::async_trait;
use http::header::HeaderName;
use http::HeaderMap;

use crate::agent::{AgentState, Role};
use crate::error::{AgentError, ConfigError};
use crate::info::{InterceptInfo, Metadata};

/// Ignores its inputs and always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedState {
    intercepted: bool,
    role: Role,
}

impl FixedState {
    pub fn new(intercepted: bool, role: Role) -> Self {
        Self { intercepted, role }
    }
}

#[async_trait]
impl AgentState for FixedState {
    async fn intercept_info(
        &self,
        _caller_intercept_id: &str,
        _path: &str,
        _headers: &HeaderMap,
    ) -> Result<InterceptInfo, AgentError> {
        Ok(InterceptInfo::new(self.intercepted, self.role.client_side()))
    }
}

/// Intercepted when every required header is present with exactly the
/// required value. Headers it does not require are ignored.
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
    required: Vec<(HeaderName, String)>,
    role: Role,
}

impl HeaderMatcher {
    /// Header names are matched case-insensitively, values byte for byte.
    pub fn new<I, K, V>(required: I, role: Role) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let required = required
            .into_iter()
            .map(|(name, value)| {
                let name = name.as_ref();
                HeaderName::from_bytes(name.as_bytes())
                    .map(|name| (name, value.into()))
                    .map_err(|_| ConfigError::InvalidHeaderName(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { required, role })
    }

    /// Only the first value of a repeated header is considered.
    pub fn matches(&self, headers: &HeaderMap) -> bool {
        self.required.iter().all(|(name, want)| {
            headers
                .get(name)
                .is_some_and(|got| got.as_bytes() == want.as_bytes())
        })
    }
}

#[async_trait]
impl AgentState for HeaderMatcher {
    async fn intercept_info(
        &self,
        _caller_intercept_id: &str,
        _path: &str,
        headers: &HeaderMap,
    ) -> Result<InterceptInfo, AgentError> {
        Ok(InterceptInfo::new(
            self.matches(headers),
            self.role.client_side(),
        ))
    }
}

/// Intercepted when the caller-intercept-id equals the configured identity.
#[derive(Debug, Clone)]
pub struct CallerIdMatcher {
    caller_id: String,
    role: Role,
}

impl CallerIdMatcher {
    pub fn new(caller_id: impl Into<String>, role: Role) -> Self {
        Self {
            caller_id: caller_id.into(),
            role,
        }
    }
}

#[async_trait]
impl AgentState for CallerIdMatcher {
    async fn intercept_info(
        &self,
        caller_intercept_id: &str,
        _path: &str,
        _headers: &HeaderMap,
    ) -> Result<InterceptInfo, AgentError> {
        Ok(InterceptInfo::new(
            caller_intercept_id == self.caller_id,
            self.role.client_side(),
        ))
    }
}

/// Attaches fixed metadata to every intercepted answer of the wrapped policy.
#[derive(Debug, Clone)]
pub struct WithMetadata<A> {
    inner: A,
    metadata: Metadata,
}

impl<A> WithMetadata<A> {
    pub fn new(inner: A, metadata: Metadata) -> Self {
        Self { inner, metadata }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: AgentState> AgentState for WithMetadata<A> {
    async fn intercept_info(
        &self,
        caller_intercept_id: &str,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<InterceptInfo, AgentError> {
        let info = self
            .inner
            .intercept_info(caller_intercept_id, path, headers)
            .await?;
        if !info.intercepted {
            return Ok(info);
        }
        Ok(info.with_metadata(self.metadata.clone()))
    }
}
