//! Embedded HTTP service answering "is this request intercepted, and by whom?".
//!
//! ```ignore
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:9980").await?;
//! let shutdown = CancellationToken::new();
//! Server::new(FixedState::new(true, Role::Client))
//!     .serve(shutdown.clone(), listener)
//!     .await?;
//! ```

use utoipa::OpenApi;

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{DEFAULT_SHUTDOWN_GRACE, ServeError, Server};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Interception Query Service",
        version = "0.1.0",
        description = "Lets a process on the request path ask whether a request is currently intercepted."
    ),
    paths(
        routes::intercepts::consume_here,
        routes::intercepts::intercept_info,
    ),
    components(schemas(iqs_core::InterceptInfo))
)]
pub struct ApiDoc;
