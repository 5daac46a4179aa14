//! Wire constants shared by the server, its callers and the CLI.

/// Correlation header stamped on the original request. Header-matching
/// policies look at it.
pub const HEADER_INTERCEPT_ID: &str = "x-telepresence-intercept-id";

/// Correlation header naming the intercept session of the querying caller.
pub const HEADER_CALLER_INTERCEPT_ID: &str = "x-telepresence-caller-intercept-id";

/// Answers with a bare JSON boolean.
pub const ENDPOINT_CONSUME_HERE: &str = "/consume-here";

/// Answers with the full [`InterceptInfo`](crate::InterceptInfo) object.
pub const ENDPOINT_INTERCEPT_INFO: &str = "/intercept-info";

/// Port used by the server binary and the CLI when nothing else is configured.
pub const DEFAULT_PORT: u16 = 9980;
