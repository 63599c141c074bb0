use http::header::CONTENT_TYPE;
use log::info;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{ConfigError, OpaConfig};
use crate::errors::OpaError;
use crate::schema::{OpaQuery, OpaQueryInput};

/// Transport between the bridge and the policy endpoints. It serializes
/// one input document per call, validates the HTTP status, and decodes
/// the typed verdict. It never interprets the decision content.
///
/// The client is shared across all callbacks and is safe to use from
/// concurrent fan-out requests; the underlying connection pool is the
/// only shared resource.
#[derive(Debug, Clone)]
pub struct OpaHttpClient {
    http: reqwest::Client,
    log_requests: bool,
    log_responses: bool,
}

impl OpaHttpClient {
    pub fn new(config: &OpaConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_client.request_timeout)
            .connect_timeout(config.http_client.connect_timeout)
            .pool_max_idle_per_host(config.http_client.pool_max_idle_per_host)
            .pool_idle_timeout(config.http_client.pool_idle_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            log_requests: config.log_requests,
            log_responses: config.log_responses,
        })
    }

    /// POST one input document to `uri` and decode the response as `R`.
    pub async fn request<R: DeserializeOwned>(
        &self,
        uri: &Url,
        input: OpaQueryInput,
    ) -> Result<R, OpaError> {
        if input.action.resource.is_some() && input.action.filter_resources.is_some() {
            return Err(OpaError::Internal(
                "resource and filterResources cannot both be set on an authorization query"
                    .to_string(),
            ));
        }

        let body = serde_json::to_vec(&OpaQuery { input }).map_err(OpaError::SerializeFailed)?;
        if self.log_requests {
            info!(
                "Sending OPA request to {uri}: headers={{content-type: application/json}} body={}",
                String::from_utf8_lossy(&body)
            );
        }

        let response = self
            .http
            .post(uri.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(OpaError::QueryFailed)?;

        let status = response.status();
        let body = response.text().await.map_err(OpaError::QueryFailed)?;
        if self.log_responses {
            info!("Received OPA response from {uri}: status={status} body={body}");
        }

        match status.as_u16() {
            200 => {}
            404 => {
                return Err(OpaError::PolicyNotFound {
                    policy_uri: uri.to_string(),
                })
            }
            _ => {
                return Err(OpaError::OpaServerError {
                    policy_uri: uri.to_string(),
                    status,
                    body,
                })
            }
        }

        serde_json::from_str(&body).map_err(|e| OpaError::DeserializeFailed {
            reason: e.to_string(),
        })
    }
}
