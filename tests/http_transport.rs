use std::sync::Arc;

use feedauth::{ConfigStore, Error, MemoryConfig, TokenRefresher, REFRESH_TOKEN_KEY, TOKEN_ENDPOINT_KEY};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(endpoint: String, refresh_token: &str) -> Arc<MemoryConfig> {
    Arc::new(MemoryConfig::from_iter([
        (TOKEN_ENDPOINT_KEY, endpoint),
        (REFRESH_TOKEN_KEY, refresh_token.to_string()),
    ]))
}

#[tokio::test]
async fn exchanges_refresh_token_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(query_param("code", "a+b/c"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"access_token":"A","refresh_token":"B"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(format!("{}/token", server.uri()), "a+b/c");
    let refresher = TokenRefresher::new(config.clone());

    assert_eq!(refresher.user_auth_token().await.unwrap(), "A");
    assert_eq!(config.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("B"));
}

#[tokio::test]
async fn rejected_exchange_is_a_protocol_error() {
    let server = MockServer::start().await;
    let body = r#"{"error":"invalid_grant"}"#;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(format!("{}/token", server.uri()), "expired");
    let err = TokenRefresher::new(config.clone()).user_auth_token().await.unwrap_err();

    assert!(matches!(err, Error::Protocol { .. }), "{err}");
    assert_eq!(err.body(), Some(body));
    assert_eq!(config.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("expired"));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let endpoint = format!("http://127.0.0.1:{port}/token");

    let config = config_for(endpoint, "r");
    let err = TokenRefresher::new(config.clone()).user_auth_token().await.unwrap_err();

    assert!(matches!(err, Error::Network(_)), "{err}");
    assert_eq!(config.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r"));
}
