//! End-to-end harvest tests
//!
//! The proxy and user-agent lists come from a wiremock server through the
//! real `HttpIdentitySource`; catalog pages are served by `PageTransport`.

use crate::common::{
    detail_page, detail_url, index_page, user_agent_page, write_config, PageTransport, INDEX_URL,
};
use catalog_harvest::config::{load_config_with_hash, Config};
use catalog_harvest::fetch::{FetchClient, RetryPolicy};
use catalog_harvest::harvester::{Coordinator, HarvestSummary};
use catalog_harvest::identity::{HttpIdentitySource, IdentityPool};
use catalog_harvest::storage::{RunStatus, SqliteStorage, Storage};
use catalog_harvest::DependencyKind;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_identity_lists(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/proxies.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("10.9.0.1:8080\n10.9.0.2:8080\n10.9.0.3:8080\n"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/agents.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(user_agent_page(&[
            "Mozilla/5.0 (X11; Linux x86_64)",
            "Mozilla/5.0 (Windows NT 10.0)",
            "Mozilla/5.0 (Macintosh)",
        ])))
        .mount(server)
        .await;
}

fn catalog_pages() -> Vec<(String, String)> {
    vec![
        (INDEX_URL.to_string(), index_page(&["A3", "abc", "zoo"])),
        (
            detail_url("A3"),
            detail_page("A3", "R (&ge; 2.15.0), xtable, pbapply", ""),
        ),
        (
            detail_url("abc"),
            detail_page("abc", "R (&ge; 2.10)", "Rcpp (&ge; 1.0.0), xtable"),
        ),
        (
            detail_url("zoo"),
            detail_page("zoo", "R (&ge; 3.1.0), stats", "utils, graphics, grDevices, lattice (&ge; 0.20-27)"),
        ),
    ]
}

fn coordinator(
    config: Config,
    config_hash: &str,
    transport: PageTransport,
) -> Coordinator<SqliteStorage, HttpIdentitySource, PageTransport> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .expect("Failed to open database");
    let source = HttpIdentitySource::new(&config.identity, Duration::from_secs(5))
        .expect("Failed to build identity source");
    let pool = IdentityPool::new(
        source,
        config.identity.max_proxy_uses,
        config.identity.max_user_agents,
    );
    let policy = RetryPolicy::from_limits(config.fetch.rotate_after, config.fetch.max_attempts);
    let client = FetchClient::new(pool, transport, policy);

    Coordinator::with_parts(config, config_hash, storage, client)
}

#[tokio::test]
async fn test_full_harvest_from_config_file() {
    let server = MockServer::start().await;
    mount_identity_lists(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config_path = write_config(dir.path(), &server.uri(), &db_path);
    let (config, hash) = load_config_with_hash(&config_path).unwrap();

    let mut coordinator = coordinator(config, &hash, PageTransport::new(catalog_pages()));
    let summary = coordinator.run().await.unwrap();

    assert_eq!(
        summary,
        HarvestSummary {
            discovered: 3,
            already_present: 0,
            stored: 3,
            skipped: 0,
            failed: 0,
        }
    );

    let storage = coordinator.storage();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, hash);
    assert_eq!(run.entries_stored, 3);

    let zoo = storage.load("zoo").unwrap();
    assert_eq!(zoo.description.as_deref(), Some("Utilities for working with zoo."));
    assert_eq!(zoo.maintainer.as_deref(), Some("Jane Doe <jane@example.org>"));
    assert_eq!(zoo.requires_compilation, Some(false));
    assert_eq!(zoo.links(), &[detail_url("zoo")]);

    let lattice = zoo
        .dependencies()
        .iter()
        .find(|d| d.name == "lattice")
        .unwrap();
    assert_eq!(lattice.kind, DependencyKind::Imported);
    assert_eq!(lattice.version_constraint.as_deref(), Some("≥ 0.20-27"));
    assert!(zoo.has_dependency("stats", DependencyKind::Required));

    // xtable without a constraint is declared as Required by A3 and Imported by abc
    let abc = storage.load("abc").unwrap();
    assert!(abc.has_dependency("xtable", DependencyKind::Imported));
    let a3 = storage.load("A3").unwrap();
    assert!(a3.has_dependency("xtable", DependencyKind::Required));
}

#[tokio::test]
async fn test_requests_use_listed_identities() {
    let server = MockServer::start().await;
    mount_identity_lists(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path(), &server.uri(), &dir.path().join("catalog.db"));
    let (config, hash) = load_config_with_hash(&config_path).unwrap();

    let mut coordinator = coordinator(config, &hash, PageTransport::new(catalog_pages()));
    coordinator.run().await.unwrap();

    let requests = coordinator_requests(&coordinator);
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[0].0, INDEX_URL);
    for (_, identity) in &requests {
        assert!(identity.proxy.starts_with("http://10.9.0."));
        assert!(identity.user_agent.starts_with("Mozilla/5.0"));
    }
}

#[tokio::test]
async fn test_interrupted_harvest_resumes() {
    let server = MockServer::start().await;
    mount_identity_lists(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config_path = write_config(dir.path(), &server.uri(), &db_path);
    let (config, hash) = load_config_with_hash(&config_path).unwrap();

    // First run stops after one entry
    let mut limited = config.clone();
    limited.harvest.limit = 1;
    let summary = coordinator(limited, &hash, PageTransport::new(catalog_pages()))
        .run()
        .await
        .unwrap();
    assert_eq!(summary.stored, 1);

    // Second run, fresh process state, same database
    let mut resumed = coordinator(config, &hash, PageTransport::new(catalog_pages()));
    let summary = resumed.run().await.unwrap();

    assert_eq!(summary.already_present, 1);
    assert_eq!(summary.stored, 2);
    assert!(!coordinator_requests(&resumed)
        .iter()
        .any(|(url, _)| *url == detail_url("A3")));

    drop(resumed);
    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_entries().unwrap(), 3);
}

#[tokio::test]
async fn test_missing_detail_page_is_fetched_once() {
    let server = MockServer::start().await;
    mount_identity_lists(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path(), &server.uri(), &dir.path().join("catalog.db"));
    let (mut config, hash) = load_config_with_hash(&config_path).unwrap();
    // Unbounded retries apply to the index only
    config.fetch.max_attempts = 0;

    let mut pages = catalog_pages();
    pages.retain(|(url, _)| *url != detail_url("abc"));

    let mut coordinator = coordinator(config, &hash, PageTransport::new(pages));
    let summary = tokio::time::timeout(Duration::from_secs(10), coordinator.run())
        .await
        .expect("harvest did not finish")
        .unwrap();

    assert_eq!(summary.stored, 2);
    assert_eq!(summary.failed, 1);

    let attempts = coordinator_requests(&coordinator)
        .into_iter()
        .filter(|(url, _)| *url == detail_url("abc"))
        .count();
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn test_index_retried_with_rotation() {
    let server = MockServer::start().await;
    mount_identity_lists(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path(), &server.uri(), &dir.path().join("catalog.db"));
    let (config, hash) = load_config_with_hash(&config_path).unwrap();

    // No index page: max-attempts = 4 with rotation after every 2 failures
    let mut coordinator = coordinator(config, &hash, PageTransport::new(Vec::new()));
    assert!(coordinator.run().await.is_err());

    let attempts = coordinator_requests(&coordinator);
    assert_eq!(attempts.len(), 4);
    assert!(attempts.iter().all(|(url, _)| url == INDEX_URL));
    assert_eq!(attempts[0].1, attempts[1].1);
    assert_ne!(attempts[1].1, attempts[2].1);
}

fn coordinator_requests(
    coordinator: &Coordinator<SqliteStorage, HttpIdentitySource, PageTransport>,
) -> Vec<(String, catalog_harvest::identity::Identity)> {
    coordinator.client().transport().requests()
}
