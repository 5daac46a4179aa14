use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use iqs_core::protocol::{
    ENDPOINT_CONSUME_HERE, ENDPOINT_INTERCEPT_INFO, HEADER_CALLER_INTERCEPT_ID,
    HEADER_INTERCEPT_ID,
};
use tower::{Layer, Service, ServiceExt};

/// Tower Layer emitting one structured event per intercept query.
///
/// Records which endpoint was hit, the status, the latency and whether the
/// correlation headers were present. Other paths pass through untouched.
#[derive(Clone, Default)]
pub struct QueryLogLayer;

impl QueryLogLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for QueryLogLayer {
    type Service = QueryLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        QueryLogService { inner }
    }
}

#[derive(Clone)]
pub struct QueryLogService<S> {
    inner: S,
}

impl<S> Service<Request> for QueryLogService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let not_ready = self.inner.clone();
        let ready = std::mem::replace(&mut self.inner, not_ready);

        Box::pin(async move {
            let Some(endpoint) = endpoint_name(req.uri().path()) else {
                return Ok(ready.oneshot(req).await.into_response());
            };

            let start = Instant::now();
            let has_intercept_id = req.headers().contains_key(HEADER_INTERCEPT_ID);
            let has_caller_intercept_id = req.headers().contains_key(HEADER_CALLER_INTERCEPT_ID);

            let response = ready.oneshot(req).await.into_response();

            let status = response.status().as_u16();
            let latency_ms = start.elapsed().as_millis().min(u64::MAX as u128) as u64;
            if response.status().is_server_error() {
                tracing::warn!(
                    endpoint,
                    status,
                    latency_ms,
                    has_intercept_id,
                    has_caller_intercept_id,
                    "intercept query failed"
                );
            } else {
                tracing::info!(
                    endpoint,
                    status,
                    latency_ms,
                    has_intercept_id,
                    has_caller_intercept_id,
                    "intercept query"
                );
            }

            Ok(response)
        })
    }
}

/// Map a request path to the endpoint it addresses.
fn endpoint_name(path: &str) -> Option<&'static str> {
    match path {
        ENDPOINT_CONSUME_HERE => Some("consume-here"),
        ENDPOINT_INTERCEPT_INFO => Some("intercept-info"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    use super::*;

    #[test]
    fn endpoint_name_recognises_query_endpoints() {
        assert_eq!(endpoint_name("/consume-here"), Some("consume-here"));
        assert_eq!(endpoint_name("/intercept-info"), Some("intercept-info"));
    }

    #[test]
    fn endpoint_name_ignores_other_paths() {
        assert_eq!(endpoint_name("/"), None);
        assert_eq!(endpoint_name("/consume-here/extra"), None);
        assert_eq!(endpoint_name("/health"), None);
    }

    #[tokio::test]
    async fn layer_passes_responses_through() {
        async fn teapot() -> StatusCode {
            StatusCode::IM_A_TEAPOT
        }

        let app = Router::new()
            .route("/consume-here", get(teapot))
            .route("/other", get(teapot))
            .layer(QueryLogLayer::new());

        for uri in ["/consume-here", "/other"] {
            let response = app
                .clone()
                .oneshot(
                    axum::http::Request::builder()
                        .uri(uri)
                        .body(Body::empty())
                        .expect("request should build"),
                )
                .await
                .expect("request should succeed");
            assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        }
    }
}
