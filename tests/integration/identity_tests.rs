//! Identity source and pool tests against mock list servers

use crate::common::user_agent_page;
use catalog_harvest::config::IdentityConfig;
use catalog_harvest::identity::{
    HttpIdentitySource, IdentityError, IdentityPool, IdentitySource,
};
use std::collections::HashSet;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn identity_config(server: &MockServer) -> IdentityConfig {
    IdentityConfig {
        proxy_source: format!("{}/proxies.txt", server.uri()),
        user_agent_source: format!("{}/agents.html", server.uri()),
        user_agent_selector: "#liste li".to_string(),
        max_proxy_uses: 1,
        max_user_agents: 30,
    }
}

fn source(server: &MockServer) -> HttpIdentitySource {
    HttpIdentitySource::new(&identity_config(server), Duration::from_secs(5))
        .expect("Failed to build identity source")
}

#[tokio::test]
async fn test_fetch_proxy_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/proxies.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("10.1.1.1:8080\r\n10.1.1.2:3128\r\n\r\n"),
        )
        .mount(&server)
        .await;

    let proxies = source(&server).fetch_proxies().await.unwrap();

    assert_eq!(
        proxies,
        vec!["http://10.1.1.1:8080".to_string(), "http://10.1.1.2:3128".to_string()]
    );
}

#[tokio::test]
async fn test_fetch_user_agents_respects_selector_and_max() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/agents.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(user_agent_page(&["Mozilla/5.0 (A)", "Mozilla/5.0 (B)", "Opera/9.80 (C)"]))
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let agents = source(&server).fetch_user_agents(2).await.unwrap();

    assert_eq!(
        agents,
        vec!["Mozilla/5.0 (A)".to_string(), "Mozilla/5.0 (B)".to_string()]
    );
}

#[tokio::test]
async fn test_server_error_is_source_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/proxies.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = source(&server).fetch_proxies().await;

    match result {
        Err(IdentityError::SourceUnavailable { url, reason }) => {
            assert!(url.ends_with("/proxies.txt"));
            assert!(reason.contains("500"));
        }
        other => panic!("Expected SourceUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_selector_rejected() {
    let server = MockServer::start().await;
    let mut config = identity_config(&server);
    config.user_agent_selector = "li[".to_string();

    assert!(HttpIdentitySource::new(&config, Duration::from_secs(5)).is_err());
}

#[tokio::test]
async fn test_pool_refills_from_http_source() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/proxies.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("10.1.1.1:8080\n10.1.1.2:8080\n"))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/agents.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(user_agent_page(&[
            "agent-1", "agent-2", "agent-3", "agent-4",
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // One use per proxy: two draws drain the queue, the third refills it
    let mut pool = IdentityPool::new(source(&server), 1, 30);
    let mut agents = HashSet::new();
    let mut proxies = Vec::new();
    for _ in 0..3 {
        let identity = pool.next_identity().await.unwrap();
        proxies.push(identity.proxy);
        agents.insert(identity.user_agent);
    }

    assert_eq!(
        proxies,
        vec![
            "http://10.1.1.1:8080".to_string(),
            "http://10.1.1.2:8080".to_string(),
            "http://10.1.1.1:8080".to_string(),
        ]
    );
    // Agents are not reused before the set is exhausted
    assert_eq!(agents.len(), 3);
    assert_eq!(pool.user_agents_remaining(), 1);
}

#[tokio::test]
async fn test_empty_proxy_list_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/proxies.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\n\n"))
        .mount(&server)
        .await;

    let mut pool = IdentityPool::new(source(&server), 5, 30);

    assert!(matches!(
        pool.next_proxy().await,
        Err(IdentityError::EmptySource { .. })
    ));
}
