//! Shared HTTP client.
//!
//! Single point of outbound request configuration: base URL, bearer-token
//! injection, the fixed request timeout, and the single-retry policy for
//! network-level failures. All services go through this client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::config::Config;
use crate::errors::{ApiError, ErrorBody};

/// Configured HTTP client with auth injection and retry/timeout policy.
///
/// Cheap to clone; the inner [`reqwest::Client`] and the session are shared.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    session: Arc<AuthSession>,
    retry_backoff: Duration,
}

impl HttpClient {
    pub fn new(config: &Config, session: Arc<AuthSession>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            retry_backoff: config.retry_backoff,
        })
    }

    /// The session this client injects tokens from.
    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = self.client.get(self.url(path));
        self.send_json(req, path).await
    }

    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let req = self.client.get(self.url(path)).query(query);
        self.send_json(req, path).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.client.post(self.url(path)).json(body);
        self.send_json(req, path).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.client.put(self.url(path)).json(body);
        self.send_json(req, path).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let req = self.client.delete(self.url(path));
        self.send(req, path).await?;
        Ok(())
    }

    pub async fn delete_query(&self, path: &str, query: &[(&str, &str)]) -> Result<(), ApiError> {
        let req = self.client.delete(self.url(path)).query(query);
        self.send(req, path).await?;
        Ok(())
    }

    /// POST and return the raw response body (sitemap download).
    pub async fn post_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let req = self.client.post(self.url(path));
        let resp = self.send(req, path).await?;
        Ok(resp.bytes().await.map_err(ApiError::from)?.to_vec())
    }

    /// GET and return the response body as text (robots.txt).
    pub async fn get_text(&self, path: &str) -> Result<String, ApiError> {
        let req = self.client.get(self.url(path));
        let resp = self.send(req, path).await?;
        resp.text().await.map_err(ApiError::from)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let resp = self.send(req, path).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(format!("Failed to decode response: {}", e)))
    }

    /// Send a request, retrying exactly once after the fixed backoff if the
    /// first attempt fails at the network level. The retry state lives with
    /// the request itself, so concurrent requests retry independently.
    async fn send(&self, req: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let request_id = Uuid::new_v4();
        let req = self.authorize(req);
        // Bodies here are always buffered JSON, so the builder is clonable.
        let retry = req.try_clone();

        tracing::debug!(%request_id, path, "sending request");

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(err) => {
                let api_err = ApiError::from(err);
                let Some(retry_req) = retry.filter(|_| api_err.is_retryable()) else {
                    return Err(api_err);
                };
                tracing::warn!(
                    %request_id,
                    path,
                    backoff_ms = self.retry_backoff.as_millis() as u64,
                    "network failure, retrying once"
                );
                tokio::time::sleep(self.retry_backoff).await;
                retry_req.send().await.map_err(ApiError::from)?
            }
        };

        self.check_status(resp, request_id, path).await
    }

    async fn check_status(
        &self,
        resp: Response,
        request_id: Uuid,
        path: &str,
    ) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let mut message = ErrorBody::extract_message(&body);
        if message.trim().is_empty() {
            message = status.to_string();
        }

        if status == StatusCode::UNAUTHORIZED {
            // Terminal, user-visible: tear the session down, never retry.
            tracing::warn!(%request_id, path, "received 401, tearing down session");
            self.session.invalidate();
            return Err(ApiError::Unauthorized(message));
        }

        if status.is_server_error() {
            tracing::error!(%request_id, path, status = status.as_u16(), "server error");
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(%request_id, path, status = status.as_u16(), "request rejected");
        Err(ApiError::Validation(message))
    }
}
