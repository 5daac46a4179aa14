//! Shared types for the interception query service.
//!
//! A process on the request path asks "is this request intercepted, and by
//! whom?". The answer is an [`InterceptInfo`] produced by exactly one
//! [`AgentState`] bound to the query server.

pub mod active;
pub mod agent;
pub mod error;
pub mod extensions;
pub mod info;
pub mod policies;
pub mod protocol;

pub use active::ActiveIntercepts;
pub use agent::{AgentState, Role};
pub use error::{AgentError, ConfigError};
pub use info::{InterceptInfo, Metadata};
pub use policies::{CallerIdMatcher, FixedState, HeaderMatcher, WithMetadata};
