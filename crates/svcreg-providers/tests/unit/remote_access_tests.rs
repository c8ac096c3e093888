//! Tests for the HTTP remote access checker

use mockito::Matcher;
use std::time::Duration;
use svcreg_application::ports::registry::{
    RemoteAccessProviderConfig, resolve_remote_access_provider,
};
use svcreg_domain::entities::Attributes;
use svcreg_domain::policies::{
    AccessStrategy, RegisteredServiceAccessStrategy, RemoteEndpointAccessStrategy,
};
use svcreg_domain::ports::RemoteAccessCheckProvider;
use svcreg_providers::remote_access::{HttpRemoteAccessCheckProvider, NullRemoteAccessCheckProvider};

fn checker() -> HttpRemoteAccessCheckProvider {
    let timeout = Duration::from_secs(2);
    let client = reqwest::Client::builder().timeout(timeout).build().unwrap();
    HttpRemoteAccessCheckProvider::new(client, timeout)
}

#[tokio::test]
async fn test_status_code_is_returned() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/decide")
        .match_query(Matcher::UrlEncoded("username".into(), "alice".into()))
        .with_status(202)
        .create_async()
        .await;

    let status = checker()
        .check(&format!("{}/decide", server.url()), "alice")
        .await
        .unwrap();
    assert_eq!(status, 202);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_strategy_grants_on_acceptable_code_only() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/decide")
        .match_query(Matcher::UrlEncoded("username".into(), "alice".into()))
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("GET", "/decide")
        .match_query(Matcher::UrlEncoded("username".into(), "mallory".into()))
        .with_status(403)
        .create_async()
        .await;

    let strategy: AccessStrategy =
        RemoteEndpointAccessStrategy::new(format!("{}/decide", server.url())).into();
    let checker = checker();
    let attributes = Attributes::new();

    assert!(
        strategy
            .do_principal_attributes_allow_service_access("alice", &attributes, &checker)
            .await
    );
    assert!(
        !strategy
            .do_principal_attributes_allow_service_access("mallory", &attributes, &checker)
            .await
    );
}

#[tokio::test]
async fn test_unreachable_endpoint_denies() {
    let strategy: AccessStrategy =
        RemoteEndpointAccessStrategy::new("http://127.0.0.1:1/decide").into();
    let checker = checker();
    assert!(checker.check("http://127.0.0.1:1/decide", "alice").await.is_err());
    assert!(
        !strategy
            .do_principal_attributes_allow_service_access("alice", &Attributes::new(), &checker)
            .await
    );
}

#[tokio::test]
async fn test_null_checker_denies() {
    let strategy: AccessStrategy = RemoteEndpointAccessStrategy::new("http://localhost/decide").into();
    assert!(
        !strategy
            .do_principal_attributes_allow_service_access(
                "alice",
                &Attributes::new(),
                &NullRemoteAccessCheckProvider::new()
            )
            .await
    );
}

#[tokio::test]
async fn test_http_checker_resolves_by_name() {
    let config = RemoteAccessProviderConfig::new("http")
        .with_timeout(Duration::from_secs(1))
        .with_user_agent("svcreg-test");
    let checker = resolve_remote_access_provider(&config).unwrap();
    assert_eq!(checker.provider_name(), "http");
}
