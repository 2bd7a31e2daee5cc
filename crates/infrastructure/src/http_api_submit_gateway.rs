use std::time::Duration;

use appdeck_application::{ApiSubmitGateway, ApiSubmitRequest};
use appdeck_core::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// HTTP implementation of the api submit boundary.
///
/// `GET` sends the collected fields as query parameters, every other method
/// sends them as a JSON object body. Transport errors, `5xx` and `429` are
/// retried with linear backoff.
pub struct HttpApiSubmitGateway {
    http_client: reqwest::Client,
    max_attempts: u8,
    retry_backoff_ms: u64,
}

impl HttpApiSubmitGateway {
    /// Creates a new gateway around a configured client.
    #[must_use]
    pub fn new(http_client: reqwest::Client, max_attempts: u8, retry_backoff_ms: u64) -> Self {
        Self {
            http_client,
            max_attempts: max_attempts.max(1),
            retry_backoff_ms: retry_backoff_ms.max(50),
        }
    }

    /// Builds a client with a request timeout.
    pub fn client_with_timeout(timeout_ms: u64) -> AppResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build api submit http client: {error}"))
            })
    }

    fn build_request(
        &self,
        method: &reqwest::Method,
        request: &ApiSubmitRequest,
    ) -> reqwest::RequestBuilder {
        let mut builder = self.http_client.request(method.clone(), &request.endpoint);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if method == reqwest::Method::GET {
            builder.query(&query_pairs(request))
        } else {
            builder.json(&request.fields)
        }
    }
}

fn query_pairs(request: &ApiSubmitRequest) -> Vec<(String, String)> {
    request
        .fields
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| {
            let value = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (name.clone(), value)
        })
        .collect()
}

#[async_trait]
impl ApiSubmitGateway for HttpApiSubmitGateway {
    async fn submit(&self, request: ApiSubmitRequest) -> AppResult<()> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|error| {
            AppError::Validation(format!(
                "api submit has invalid HTTP method '{}': {error}",
                request.method
            ))
        })?;

        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < self.max_attempts {
            attempt = attempt.saturating_add(1);
            let response = self.build_request(&method, &request).send().await;

            match response {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response)
                    if response.status().is_server_error()
                        || response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS =>
                {
                    last_error = Some(format!(
                        "transient HTTP status {} from '{}'",
                        response.status(),
                        request.endpoint
                    ));
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
                    return Err(AppError::Validation(format!(
                        "api submit to '{}' failed with status {status}: {body}",
                        request.endpoint
                    )));
                }
                Err(error) => {
                    last_error = Some(format!("api submit transport error: {error}"));
                }
            }

            if attempt < self.max_attempts {
                debug!(
                    endpoint = %request.endpoint,
                    attempt,
                    "retrying api submit"
                );
                let delay = self.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Internal(
            last_error.unwrap_or_else(|| "api submit exhausted retries".to_owned()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use appdeck_application::{ApiSubmitGateway, ApiSubmitRequest};
    use appdeck_core::AppError;
    use serde_json::json;

    use super::{HttpApiSubmitGateway, query_pairs};

    fn request(method: &str) -> ApiSubmitRequest {
        ApiSubmitRequest {
            endpoint: "http://127.0.0.1:9/submit".to_owned(),
            method: method.to_owned(),
            headers: BTreeMap::new(),
            fields: json!({"title": "Buy milk", "count": 2, "missing": null})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        }
    }

    #[test]
    fn query_pairs_flatten_scalars_and_skip_nulls() {
        let pairs = query_pairs(&request("GET"));
        assert_eq!(
            pairs,
            vec![
                ("count".to_owned(), "2".to_owned()),
                ("title".to_owned(), "Buy milk".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn invalid_method_is_rejected_before_sending() {
        let gateway = HttpApiSubmitGateway::new(reqwest::Client::new(), 1, 0);
        let result = gateway.submit(request("NOT A METHOD")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
