use iqs_core::error::parse_pair;
use iqs_core::protocol::{
    ENDPOINT_CONSUME_HERE, ENDPOINT_INTERCEPT_INFO, HEADER_CALLER_INTERCEPT_ID,
    HEADER_INTERCEPT_ID,
};

use crate::QueryArgs;
use crate::util::{print_error, query_request};

pub async fn consume_here(api_url: &str, args: &QueryArgs) -> i32 {
    run(api_url, ENDPOINT_CONSUME_HERE, args).await
}

pub async fn intercept_info(api_url: &str, args: &QueryArgs) -> i32 {
    run(api_url, ENDPOINT_INTERCEPT_INFO, args).await
}

async fn run(api_url: &str, endpoint: &str, args: &QueryArgs) -> i32 {
    let headers = match query_headers(args) {
        Ok(h) => h,
        Err(e) => {
            print_error(
                "usage_error",
                &e.to_string(),
                Some("Pass extra headers as --header NAME=VALUE"),
            );
            return 4;
        }
    };
    query_request(api_url, endpoint, &headers, args.raw).await
}

/// Correlation headers first, then the extra `--header` pairs in order.
fn query_headers(args: &QueryArgs) -> Result<Vec<(String, String)>, iqs_core::ConfigError> {
    let mut headers = Vec::new();
    if let Some(id) = &args.intercept_id {
        headers.push((HEADER_INTERCEPT_ID.to_string(), id.clone()));
    }
    if let Some(id) = &args.caller_intercept_id {
        headers.push((HEADER_CALLER_INTERCEPT_ID.to_string(), id.clone()));
    }
    for raw in &args.headers {
        headers.push(parse_pair(raw)?);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(headers: &[&str]) -> QueryArgs {
        QueryArgs {
            intercept_id: Some("abc:123".to_string()),
            caller_intercept_id: None,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            raw: false,
        }
    }

    #[test]
    fn query_headers_include_correlation_and_extra_headers() {
        let headers = query_headers(&args(&["header-a=value-a"])).unwrap();
        assert_eq!(
            headers,
            vec![
                (HEADER_INTERCEPT_ID.to_string(), "abc:123".to_string()),
                ("header-a".to_string(), "value-a".to_string()),
            ]
        );
    }

    #[test]
    fn query_headers_reject_malformed_pairs() {
        assert!(query_headers(&args(&["header-a"])).is_err());
    }
}
