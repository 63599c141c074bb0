use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const POLICY_URI: &str = "opa.policy.uri";
pub const BATCHED_POLICY_URI: &str = "opa.policy.batched-uri";
pub const LOG_REQUESTS: &str = "opa.log-requests";
pub const LOG_RESPONSES: &str = "opa.log-responses";
pub const ALLOW_PERMISSION_MANAGEMENT: &str = "opa.allow-permission-management-operations";
pub const HTTP_REQUEST_TIMEOUT: &str = "opa.http-client.request-timeout";
pub const HTTP_CONNECT_TIMEOUT: &str = "opa.http-client.connect-timeout";
pub const HTTP_POOL_MAX_IDLE_PER_HOST: &str = "opa.http-client.pool-max-idle-per-host";
pub const HTTP_POOL_IDLE_TIMEOUT: &str = "opa.http-client.pool-idle-timeout";

const KNOWN_PROPERTIES: &[&str] = &[
    POLICY_URI,
    BATCHED_POLICY_URI,
    LOG_REQUESTS,
    LOG_RESPONSES,
    ALLOW_PERMISSION_MANAGEMENT,
    HTTP_REQUEST_TIMEOUT,
    HTTP_CONNECT_TIMEOUT,
    HTTP_POOL_MAX_IDLE_PER_HOST,
    HTTP_POOL_IDLE_TIMEOUT,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration property '{0}'")]
    MissingProperty(&'static str),

    #[error("Invalid value '{value}' for configuration property '{key}': {reason}")]
    InvalidProperty {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration property '{0}'")]
    UnknownProperty(String),

    #[error("Failed to construct OPA HTTP client: {0}")]
    HttpClient(String),
}

/// Tuning knobs passed through to the underlying HTTP client. The bridge
/// declares no timeout of its own; these are the only timeouts in play.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpClientConfig {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

/// Bridge configuration, resolved from the flat property map the host
/// engine hands to access control plugins.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaConfig {
    /// Single-decision endpoint. Mandatory.
    pub policy_uri: Url,
    /// Batch filtering endpoint. When set, filter callbacks send one
    /// request carrying all candidates instead of fanning out.
    pub batched_policy_uri: Option<Url>,
    /// Log the URI, headers and body of every policy request. Verbose.
    pub log_requests: bool,
    /// Log the URI, status and body of every policy response. Verbose.
    pub log_responses: bool,
    /// Let grant/deny/revoke and role lifecycle operations succeed
    /// locally instead of failing them. Neither setting consults OPA.
    pub allow_permission_management: bool,
    pub http_client: HttpClientConfig,
}

impl OpaConfig {
    pub fn new(policy_uri: Url) -> Self {
        Self {
            policy_uri,
            batched_policy_uri: None,
            log_requests: false,
            log_responses: false,
            allow_permission_management: false,
            http_client: HttpClientConfig::default(),
        }
    }

    pub fn from_properties(properties: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        for key in properties.keys() {
            if key.starts_with("opa.") && !KNOWN_PROPERTIES.contains(&key.as_str()) {
                return Err(ConfigError::UnknownProperty(key.clone()));
            }
        }

        let policy_uri = parse_uri(properties, POLICY_URI)?
            .ok_or(ConfigError::MissingProperty(POLICY_URI))?;
        let defaults = HttpClientConfig::default();

        Ok(Self {
            policy_uri,
            batched_policy_uri: parse_uri(properties, BATCHED_POLICY_URI)?,
            log_requests: parse_bool(properties, LOG_REQUESTS)?.unwrap_or(false),
            log_responses: parse_bool(properties, LOG_RESPONSES)?.unwrap_or(false),
            allow_permission_management: parse_bool(properties, ALLOW_PERMISSION_MANAGEMENT)?
                .unwrap_or(false),
            http_client: HttpClientConfig {
                request_timeout: parse_seconds(properties, HTTP_REQUEST_TIMEOUT)?
                    .unwrap_or(defaults.request_timeout),
                connect_timeout: parse_seconds(properties, HTTP_CONNECT_TIMEOUT)?
                    .unwrap_or(defaults.connect_timeout),
                pool_max_idle_per_host: parse_number(properties, HTTP_POOL_MAX_IDLE_PER_HOST)?
                    .unwrap_or(defaults.pool_max_idle_per_host),
                pool_idle_timeout: parse_seconds(properties, HTTP_POOL_IDLE_TIMEOUT)?
                    .unwrap_or(defaults.pool_idle_timeout),
            },
        })
    }
}

fn parse_uri(
    properties: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<Option<Url>, ConfigError> {
    properties
        .get(key)
        .map(|value| {
            Url::parse(value).map_err(|e| ConfigError::InvalidProperty {
                key: key.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_bool(
    properties: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<Option<bool>, ConfigError> {
    properties
        .get(key)
        .map(|value| match value.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ConfigError::InvalidProperty {
                key: key.to_string(),
                value: value.clone(),
                reason: "expected 'true' or 'false'".to_string(),
            }),
        })
        .transpose()
}

fn parse_number(
    properties: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<Option<usize>, ConfigError> {
    properties
        .get(key)
        .map(|value| {
            value.parse::<usize>().map_err(|e| ConfigError::InvalidProperty {
                key: key.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_seconds(
    properties: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    Ok(parse_number(properties, key)?.map(|seconds| Duration::from_secs(seconds as u64)))
}
