//! HTTP layer: bearer auth, status mapping, retry, 401 teardown.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{LoginRedirect, SessionToken};
use crate::detail::extract_detail_message;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionStorage;

/// Upper bound for any single backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// HTTP backend for making requests (holds reqwest client, session, config).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) token: SessionToken,
    pub(crate) storage: Arc<dyn SessionStorage>,
    pub(crate) redirect: Arc<dyn LoginRedirect>,
    pub(crate) max_retries: u32,
}

impl HttpBackend {
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request built by `build`. GET requests are retried on
    /// transient failures; everything else is sent exactly once.
    pub(crate) async fn request<F>(
        &self,
        method: Method,
        path: &str,
        build: F,
    ) -> ClientResult<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        use rand::Rng;

        let max_retries = if method == Method::GET {
            self.max_retries
        } else {
            0
        };
        let mut retries = 0;

        loop {
            let result = self.request_once(method.clone(), path, &build).await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retries < max_retries => {
                    retries += 1;

                    let backoff = match &e {
                        ClientError::RateLimited {
                            retry_after: Some(retry_after),
                        } => {
                            let base_ms = (*retry_after).min(MAX_BACKOFF).as_millis() as u64;
                            let jitter_factor: f64 =
                                rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
                            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
                            Duration::from_millis(jittered_ms.max(100))
                        }
                        _ => {
                            let base_backoff = Duration::from_secs(1 << retries).min(MAX_BACKOFF);
                            let jittered_ms =
                                rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
                            Duration::from_millis(jittered_ms.max(10))
                        }
                    };

                    warn!(
                        error = %e,
                        method = %method,
                        path = path,
                        retry = retries,
                        max_retries = max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Send a request exactly once. Used for bodies that cannot be rebuilt,
    /// such as streamed multipart uploads.
    pub(crate) async fn request_once<F>(
        &self,
        method: Method,
        path: &str,
        build: F,
    ) -> ClientResult<Response>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let url = self.url(path);
        // A request that cannot be built will not build on retry either.
        let mut request = build(self.client.request(method, &url))
            .build()
            .map_err(|e| ClientError::Config {
                message: format!("invalid request for {}: {}", path, e),
            })?;

        // An explicit Authorization header set by `build` wins over the
        // session token and exempts the request from session teardown.
        let uses_session = !request.headers().contains_key(AUTHORIZATION);
        if uses_session {
            if let Some(token) = self.token.get() {
                request
                    .headers_mut()
                    .insert(AUTHORIZATION, bearer_header(&token)?);
            }
        }

        debug!(method = %request.method(), url = %url, "sending request");
        let response = self.client.execute(request).await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => Ok(response),

            401 => {
                let message = read_detail(response).await;
                if uses_session {
                    self.end_session();
                }
                Err(ClientError::Unauthorized { message })
            }

            429 => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);

                Err(ClientError::RateLimited { retry_after })
            }

            code => {
                let message = read_detail(response).await;
                debug!(status = code, message = %message, "request rejected");
                Err(ClientError::Api {
                    status: code,
                    message,
                })
            }
        }
    }

    /// Global 401 handling: forget the token and the persisted session,
    /// then hand over to the login redirect.
    fn end_session(&self) {
        let had_token = self.token.clear().is_some();
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "failed to clear persisted session after 401");
        }
        debug!(had_token, "session cleared after 401");
        self.redirect.redirect_to_login();
    }

    /// Read a JSON body into `T`.
    pub(crate) async fn parse<T: DeserializeOwned>(
        response: Response,
        what: &str,
    ) -> ClientResult<T> {
        let text = response.text().await.map_err(|e| ClientError::Network {
            message: format!("failed to read {} response: {}", what, e),
        })?;
        serde_json::from_str(&text).map_err(|e| ClientError::InvalidResponse {
            message: format!("failed to parse {} response: {}", what, e),
        })
    }

    /// Drain a body whose content is not needed (204, acknowledgements).
    pub(crate) async fn discard(response: Response) -> ClientResult<()> {
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        response.bytes().await.map_err(|e| ClientError::Network {
            message: format!("failed to read response body: {}", e),
        })?;
        Ok(())
    }
}

pub(crate) fn bearer_header(token: &str) -> ClientResult<HeaderValue> {
    let mut value =
        HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| ClientError::Config {
            message: "session token contains characters not allowed in a header".to_string(),
        })?;
    value.set_sensitive(true);
    Ok(value)
}

async fn read_detail(response: Response) -> String {
    let body = response.text().await.unwrap_or_default();
    extract_detail_message(&body)
}
