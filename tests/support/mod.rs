//! Shared test utilities for driving the library against a mock GraphQL
//! server.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use org_activity::github::{
    GraphQlEndpoint, HttpGatewayConfig, HttpGraphQlGateway, PersonalAccessToken, RetryPolicy,
    RetryingGateway,
};
use org_activity::ActivityError;
use rstest_bdd::Slot;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

/// Path GitHub Enterprise style endpoints resolve to for a bare host.
pub const GRAPHQL_PATH: &str = "/api/graphql";

/// Tokio runtime that can be stored in an `rstest-bdd` Slot.
///
/// The runtime only hosts the mock server; the blocking client under test is
/// always called from the test thread.
#[derive(Clone)]
pub struct SharedRuntime(Rc<RefCell<Runtime>>);

impl SharedRuntime {
    pub fn new(runtime: Runtime) -> Self {
        Self(Rc::new(RefCell::new(runtime)))
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.borrow().block_on(future)
    }
}

/// Ensures a Tokio runtime and Wiremock server are initialised.
///
/// # Errors
///
/// Returns an error if the Tokio runtime cannot be created.
pub fn ensure_runtime_and_server(
    runtime: &Slot<SharedRuntime>,
    server: &Slot<MockServer>,
) -> Result<SharedRuntime, io::Error> {
    if runtime.with_ref(|_| ()).is_none() {
        runtime.set(SharedRuntime::new(Runtime::new()?));
    }

    let shared_runtime = runtime
        .get()
        .ok_or_else(|| io::Error::other("runtime not initialised after set"))?;

    if server.with_ref(|_| ()).is_none() {
        server.set(shared_runtime.block_on(MockServer::start()));
    }

    Ok(shared_runtime)
}

/// Starts a POST matcher on the GraphQL path.
pub fn graphql_post() -> MockBuilder {
    Mock::given(method("POST")).and(path(GRAPHQL_PATH))
}

/// Mounts `mock` on the server held in `server`.
///
/// # Errors
///
/// Returns an error when no server has been started.
pub fn mount(
    runtime: &SharedRuntime,
    server: &Slot<MockServer>,
    mock: Mock,
) -> Result<(), ActivityError> {
    server
        .with_ref(|mock_server| runtime.block_on(mock.mount(mock_server)))
        .ok_or_else(|| ActivityError::Api {
            message: "mock server not initialised".to_owned(),
        })
}

/// A GraphQL `data` envelope for one search page.
pub fn search_page(nodes: &serde_json::Value, end_cursor: Option<&str>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "data": {
            "search": {
                "pageInfo": {
                    "hasNextPage": end_cursor.is_some(),
                    "endCursor": end_cursor
                },
                "nodes": nodes
            }
        }
    }))
}

/// The production gateway stack pointed at the mock server.
///
/// # Errors
///
/// Returns an error when the server is missing or the client cannot be built.
pub fn gateway_for(
    server: &Slot<MockServer>,
) -> Result<RetryingGateway<HttpGraphQlGateway>, ActivityError> {
    let uri = server
        .with_ref(MockServer::uri)
        .ok_or_else(|| ActivityError::InvalidUrl("mock server URL missing".to_owned()))?;
    let endpoint = GraphQlEndpoint::parse(&uri)?;
    let token = PersonalAccessToken::new("test-token")?;
    let http = HttpGraphQlGateway::new(&token, HttpGatewayConfig::new(endpoint))?;
    Ok(RetryingGateway::new(http, RetryPolicy::default()))
}
