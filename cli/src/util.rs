use serde_json::json;

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Print a structured CLI error to stderr.
pub fn print_error(error: &str, message: &str, docs_hint: Option<&str>) {
    let mut err = json!({
        "error": error,
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!(
        "{}",
        serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string())
    );
}

fn format_json(value: &serde_json::Value, raw: bool) -> String {
    let formatted = if raw {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    formatted.unwrap_or_else(|_| value.to_string())
}

/// Map an HTTP status to the CLI exit code.
///
/// Exit codes: 0=success (2xx), 1=client error (4xx), 2=server error (5xx),
///             3=connection error, 4=usage error
pub fn exit_code_for(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

/// Execute a GET against the query service, print the answer, return the exit code.
///
/// Successful bodies are JSON and printed to stdout. Error bodies are plain
/// text and reported on stderr with the status.
pub async fn query_request(
    api_url: &str,
    path: &str,
    headers: &[(String, String)],
    raw: bool,
) -> i32 {
    let url = match reqwest::Url::parse(&format!("{}{path}", api_url.trim_end_matches('/'))) {
        Ok(u) => u,
        Err(e) => {
            print_error("cli_error", &format!("Invalid URL: {api_url}{path}: {e}"), None);
            return 4;
        }
    };

    let mut req = client().get(url);
    for (k, v) in headers {
        req = req.header(k.as_str(), v.as_str());
    }

    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            print_error(
                "connection_error",
                &format!("{e}"),
                Some("Is the query service running? Check IQS_API_URL."),
            );
            return 3;
        }
    };

    let status = resp.status().as_u16();
    let exit_code = exit_code_for(status);
    tracing::debug!(status, path, "query service responded");

    let text = match resp.text().await {
        Ok(t) => t,
        Err(e) => {
            print_error("connection_error", &format!("Failed to read response: {e}"), None);
            return 3;
        }
    };

    if exit_code != 0 {
        let err = json!({
            "error": "query_failed",
            "status": status,
            "message": text.trim(),
        });
        eprintln!("{}", format_json(&err, raw));
        return exit_code;
    }

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(body) => {
            println!("{}", format_json(&body, raw));
            0
        }
        Err(e) => {
            print_error(
                "invalid_response",
                &format!("Failed to parse response as JSON: {e}"),
                None,
            );
            2
        }
    }
}
