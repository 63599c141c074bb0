use log::LevelFilter;
use serde_json::Value;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::access_control::OpaAccessControl;
use crate::config::OpaConfig;
use crate::spi::{Identity, SystemSecurityContext};

pub const ALLOW_PATH: &str = "/v1/data/trino/allow";
pub const TEST_TRINO_VERSION: &str = "455";

/// Test environment with a mocked policy server. Authorizers built from
/// the fixture point their policy URIs at the mock.
pub struct TestFixture {
    pub opa_mock: MockServer,
}

impl TestFixture {
    pub async fn new() -> Self {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
        Self {
            opa_mock: MockServer::start().await,
        }
    }

    pub fn config(&self) -> OpaConfig {
        let uri = Url::parse(&format!("{}{}", self.opa_mock.uri(), ALLOW_PATH)).unwrap();
        OpaConfig::new(uri)
    }

    pub fn authorizer(&self) -> OpaAccessControl {
        OpaAccessControl::new(&self.config(), Some(TEST_TRINO_VERSION))
            .expect("failed to build authorizer")
    }

    pub fn gate_authorizer(&self, allow_permission_management: bool) -> OpaAccessControl {
        let mut config = self.config();
        config.allow_permission_management = allow_permission_management;
        OpaAccessControl::new(&config, Some(TEST_TRINO_VERSION))
            .expect("failed to build authorizer")
    }

    /// Mount a response for the single-decision endpoint.
    pub async fn add_allow_response(&self, response: Value, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(ALLOW_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .expect(expected_calls)
            .mount(&self.opa_mock)
            .await;
    }

    /// Mount a non-JSON or non-200 response for the single-decision endpoint.
    pub async fn add_allow_status(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(ALLOW_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.opa_mock)
            .await;
    }

    pub async fn received_bodies(&self) -> Vec<Value> {
        self.opa_mock
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).expect("request body is JSON"))
            .collect()
    }

    /// The `input.action` object of every request received, in arrival order.
    pub async fn received_actions(&self) -> Vec<Value> {
        self.received_bodies()
            .await
            .into_iter()
            .map(|body| body["input"]["action"].clone())
            .collect()
    }

    pub async fn assert_no_requests(&self) {
        assert!(
            self.opa_mock.received_requests().await.unwrap_or_default().is_empty(),
            "expected no policy traffic"
        );
    }
}

pub fn test_identity() -> Identity {
    Identity::for_user("source-user").with_groups(["some-group"])
}

pub fn test_context() -> SystemSecurityContext {
    SystemSecurityContext::new(test_identity())
}
