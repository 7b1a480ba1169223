//! The reqwest transport against a local mock server.
//!
//! `SiteRedirect` points the fixed `https://<site>.cardconnect.com` URL at the
//! mock server so the full client path runs over real HTTP.
//!
//! Run:  cargo test -p cardpointe-gateway --test reqwest_transport

use bytes::Bytes;
use cardpointe::{CardPointeClient, CardPointeError, ClientConfig, ReqwestTransport, Transport};
use http::StatusCode;
use mockito::{Matcher, Server};
use serde_json::json;

const ALICE_AUTH: &str = "Basic YWxpY2U6c2VjcmV0";

struct SiteRedirect {
    inner: ReqwestTransport,
    target: url::Url,
}

impl Transport for SiteRedirect {
    async fn send(
        &self,
        mut request: reqwest::Request,
    ) -> Result<http::Response<Bytes>, CardPointeError> {
        let url = request.url_mut();
        url.set_scheme(self.target.scheme()).unwrap();
        url.set_host(self.target.host_str()).unwrap();
        url.set_port(self.target.port()).unwrap();
        self.inner.send(request).await
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn client_for(server: &Server) -> CardPointeClient<SiteRedirect> {
    let config = ClientConfig::new("alice", "secret", "example").with_header("X-Merchant", "1");
    let transport = SiteRedirect {
        inner: ReqwestTransport::from_config(&config).unwrap(),
        target: url::Url::parse(&server.url()).unwrap(),
    };
    CardPointeClient::with_transport(config, transport).unwrap()
}

#[tokio::test]
async fn json_round_trip_over_http() {
    init_tracing();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/cardconnect/rest/auth")
        .match_header("authorization", ALICE_AUTH)
        .match_header("content-type", "application/json")
        .match_header("x-merchant", "1")
        .match_body(Matcher::Json(json!({ "amount": "100" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"respstat":"A","retref":"343005123105"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let resp = client.put("auth", &json!({ "amount": "100" })).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let data = resp.data().unwrap();
    assert_eq!(data.as_json().unwrap()["retref"], "343005123105");
    mock.assert_async().await;
}

#[tokio::test]
async fn non_json_body_and_error_status_pass_through() {
    init_tracing();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/cardconnect/rest/")
        .with_status(401)
        .with_header("content-type", "text/html")
        .with_body("<h1>Unauthorized</h1>")
        .create_async()
        .await;

    let client = client_for(&server);
    let resp = client.get("").await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.reason_phrase(), "Unauthorized");
    assert_eq!(resp.data().unwrap().as_str(), Some("<h1>Unauthorized</h1>"));
    mock.assert_async().await;
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    init_tracing();
    let transport = ReqwestTransport::with_http_client(reqwest::Client::new());
    // Port 1 on loopback is never listening in test environments.
    let request = reqwest::Request::new(
        reqwest::Method::GET,
        url::Url::parse("http://127.0.0.1:1/cardconnect/rest/").unwrap(),
    );

    let err = transport.send(request).await.unwrap_err();
    assert!(matches!(err, CardPointeError::Transport(_)));
}
