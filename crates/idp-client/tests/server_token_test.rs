//! Server token exchange and the shared request pipeline.
//!
//! Covers the client-credentials exchange at `POST /v1/oauth/token`, the
//! per-session token slot, configuration checks and error mapping.

use idp_client::{IdpClient, IdpConfig, IdpError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(mock_server: &MockServer) -> IdpClient {
    let config = IdpConfig {
        timeout_secs: 5,
        ..IdpConfig::new(mock_server.uri().parse().unwrap(), "client-1", "secret-1")
    };
    IdpClient::new(config).unwrap()
}

async fn mount_token_exchange(mock_server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/oauth/token"))
        .and(body_json(json!({
            "grant_type": "client_credentials",
            "client_id": "client-1",
            "client_secret": "secret-1",
            "scope": "*"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3600,
            "access_token": "server-token"
        })))
        .expect(expected_calls)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn server_token_is_exchanged_once_per_session() {
    let mock_server = MockServer::start().await;
    mount_token_exchange(&mock_server, 1).await;

    let session = test_client(&mock_server).session();
    let first = session.server_token().await.unwrap();
    let second = session.server_token().await.unwrap();
    let via_clone = session.clone().server_token().await.unwrap();

    assert_eq!(first.access_token(), "server-token");
    assert_eq!(first.expires_in(), 3600);
    assert_eq!(first, second);
    assert_eq!(first, via_clone);
}

#[tokio::test]
async fn each_session_exchanges_its_own_token() {
    let mock_server = MockServer::start().await;
    mount_token_exchange(&mock_server, 2).await;

    let client = test_client(&mock_server);
    client.session().server_token().await.unwrap();
    client.session().server_token().await.unwrap();
}

#[tokio::test]
async fn server_token_authorizes_later_calls() {
    let mock_server = MockServer::start().await;
    mount_token_exchange(&mock_server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user/USR-1"))
        .and(header("authorization", "Bearer server-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "USR-1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = test_client(&mock_server).session();
    let user = session.get_user("USR-1").await.unwrap();
    assert_eq!(user.id.as_deref(), Some("USR-1"));
}

#[tokio::test]
async fn missing_base_url_fails_before_any_call() {
    let client = IdpClient::new(IdpConfig {
        client_id: Some("client-1".into()),
        client_secret: Some("secret-1".to_string().into()),
        ..IdpConfig::default()
    })
    .unwrap();

    let err = client.session().server_token().await.unwrap_err();
    assert!(matches!(
        err,
        IdpError::MissingConfiguration { option: "base_url" }
    ));
}

#[tokio::test]
async fn missing_credentials_fail_before_any_call() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri().parse().unwrap();

    let without_id = IdpClient::new(IdpConfig {
        base_url: Some(base_url),
        client_secret: Some("secret-1".to_string().into()),
        ..IdpConfig::default()
    })
    .unwrap();
    let err = without_id.session().server_token().await.unwrap_err();
    assert!(matches!(
        err,
        IdpError::MissingConfiguration { option: "client_id" }
    ));

    let without_secret = IdpClient::new(IdpConfig {
        base_url: Some(mock_server.uri().parse().unwrap()),
        client_id: Some("client-1".into()),
        ..IdpConfig::default()
    })
    .unwrap();
    let err = without_secret.session().get_user("USR-1").await.unwrap_err();
    assert!(matches!(
        err,
        IdpError::MissingConfiguration {
            option: "client_secret"
        }
    ));

    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_exchange_is_remote_status_and_not_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Client authentication failed"
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let session = test_client(&mock_server).session();
    for _ in 0..2 {
        let err = session.server_token().await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.messages(), ["Client authentication failed".to_string()]);
    }
    assert!(session.cache().server_token().is_none());
}

#[tokio::test]
async fn error_messages_follow_the_body_shape() {
    let mock_server = MockServer::start().await;
    mount_token_exchange(&mock_server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user/string-message"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/list-message"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": ["first", "second"]})),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/no-body"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let session = test_client(&mock_server).session();

    match session.get_user("string-message").await.unwrap_err() {
        IdpError::RemoteStatus {
            endpoint,
            status,
            messages,
        } => {
            assert_eq!(endpoint, "GET /api/v1/user/string-message");
            assert_eq!(status, 500);
            assert_eq!(messages, vec!["boom"]);
        }
        other => panic!("expected RemoteStatus, got {other:?}"),
    }

    let err = session.get_user("list-message").await.unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.messages(), ["first".to_string(), "second".to_string()]);

    let err = session.get_user("no-body").await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.messages().is_empty());
}

#[tokio::test]
async fn unexpected_success_body_is_a_deserialization_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&mock_server)
        .await;

    let err = test_client(&mock_server)
        .session()
        .server_token()
        .await
        .unwrap_err();
    assert!(matches!(err, IdpError::Deserialization { .. }));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let client = IdpClient::new(IdpConfig {
        timeout_secs: 1,
        ..IdpConfig::new("http://127.0.0.1:1".parse().unwrap(), "client-1", "secret-1")
    })
    .unwrap();

    match client.session().server_token().await.unwrap_err() {
        IdpError::Transport { endpoint, .. } => assert_eq!(endpoint, "POST /v1/oauth/token"),
        other => panic!("expected Transport, got {other:?}"),
    }
}
