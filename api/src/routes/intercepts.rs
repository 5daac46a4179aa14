use axum::extract::State;
use axum::http::{HeaderMap, Uri};
use axum::{Json, Router, routing::get};
use iqs_core::InterceptInfo;
use iqs_core::protocol::{
    ENDPOINT_CONSUME_HERE, ENDPOINT_INTERCEPT_INFO, HEADER_CALLER_INTERCEPT_ID,
    HEADER_INTERCEPT_ID,
};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(ENDPOINT_CONSUME_HERE, get(consume_here))
        .route(ENDPOINT_INTERCEPT_INFO, get(intercept_info))
}

/// Whether the asking process should handle the request itself.
///
/// True when a client-side sensor sees an intercepted request, or when a
/// cluster-side agent sees a request that is not intercepted.
#[utoipa::path(
    get,
    path = "/consume-here",
    params(
        ("x-telepresence-intercept-id" = Option<String>, Header, description = "Intercept id stamped on the original request"),
        ("x-telepresence-caller-intercept-id" = Option<String>, Header, description = "Intercept session of the caller"),
    ),
    responses(
        (status = 200, description = "Decision", body = bool),
        (status = 500, description = "The decision could not be made", body = String, content_type = "text/plain"),
        (status = 503, description = "Intercept state unavailable", body = String, content_type = "text/plain")
    ),
    tag = "intercepts"
)]
pub async fn consume_here(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<bool>, AppError> {
    query(&state, &uri, &headers, |info| info.consume_here()).await
}

/// Full intercept status of the request, including metadata.
#[utoipa::path(
    get,
    path = "/intercept-info",
    params(
        ("x-telepresence-intercept-id" = Option<String>, Header, description = "Intercept id stamped on the original request"),
        ("x-telepresence-caller-intercept-id" = Option<String>, Header, description = "Intercept session of the caller"),
    ),
    responses(
        (status = 200, description = "Intercept status", body = InterceptInfo),
        (status = 500, description = "The decision could not be made", body = String, content_type = "text/plain"),
        (status = 503, description = "Intercept state unavailable", body = String, content_type = "text/plain")
    ),
    tag = "intercepts"
)]
pub async fn intercept_info(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<InterceptInfo>, AppError> {
    query(&state, &uri, &headers, |info| info).await
}

/// Shared by both endpoints; they differ only in `project`.
async fn query<T>(
    state: &AppState,
    uri: &Uri,
    headers: &HeaderMap,
    project: impl FnOnce(InterceptInfo) -> T,
) -> Result<Json<T>, AppError> {
    let intercept_id = header_str(headers, HEADER_INTERCEPT_ID);
    let caller_intercept_id = header_str(headers, HEADER_CALLER_INTERCEPT_ID);
    let path = uri.path();

    let info = state
        .agent
        .intercept_info(caller_intercept_id, path, headers)
        .await?;

    tracing::debug!(
        intercept_id,
        caller_intercept_id,
        path,
        intercepted = info.intercepted,
        client_side = info.client_side,
        "answered intercept query"
    );
    Ok(Json(project(info)))
}

/// Absent or non-ASCII values read as empty.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use iqs_core::{AgentError, AgentState};
    use tower::ServiceExt;

    use super::*;

    /// Records the inputs it was called with.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, String, Option<String>)>>,
    }

    #[async_trait]
    impl AgentState for Recorder {
        async fn intercept_info(
            &self,
            caller_intercept_id: &str,
            path: &str,
            headers: &HeaderMap,
        ) -> Result<InterceptInfo, AgentError> {
            let extra = headers
                .get("x-extra")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            self.seen.lock().unwrap().push((
                caller_intercept_id.to_string(),
                path.to_string(),
                extra,
            ));
            Ok(InterceptInfo::new(true, true))
        }
    }

    #[test]
    fn header_str_defaults_to_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(header_str(&headers, HEADER_INTERCEPT_ID), "");
        headers.insert(HEADER_INTERCEPT_ID, "abc:123".parse().unwrap());
        assert_eq!(header_str(&headers, HEADER_INTERCEPT_ID), "abc:123");
    }

    #[tokio::test]
    async fn passes_caller_id_path_and_all_headers_to_agent() {
        let recorder = Arc::new(Recorder::default());
        let app = router().with_state(AppState {
            agent: recorder.clone(),
        });

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/intercept-info")
                    .header("X-Telepresence-Caller-Intercept-Id", "abc:123")
                    .header("x-extra", "yes")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");
        assert_eq!(response.status(), StatusCode::OK);

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![(
                "abc:123".to_string(),
                "/intercept-info".to_string(),
                Some("yes".to_string())
            )]
        );
    }

    #[tokio::test]
    async fn missing_caller_id_is_empty_string() {
        let recorder = Arc::new(Recorder::default());
        let app = router().with_state(AppState {
            agent: recorder.clone(),
        });

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/consume-here")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        assert_eq!(&body[..], b"true");
        assert_eq!(recorder.seen.lock().unwrap()[0].0, "");
    }
}
