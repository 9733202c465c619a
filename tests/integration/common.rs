//! Shared fixtures for the integration tests

use catalog_harvest::fetch::{FetchedPage, Transport, TransportError};
use catalog_harvest::identity::Identity;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

pub const INDEX_URL: &str = "http://catalog.test/web/packages/available_packages_by_name.html";

pub fn detail_url(name: &str) -> String {
    format!("http://catalog.test/package={}", name)
}

/// Serves fixed pages by URL and records every request
///
/// Unknown URLs answer 404.
pub struct PageTransport {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<(String, Identity)>>,
}

impl PageTransport {
    pub fn new(pages: Vec<(String, String)>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, Identity)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for PageTransport {
    async fn send(&self, url: &str, identity: &Identity) -> Result<FetchedPage, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), identity.clone()));

        let (status, body) = match self.pages.get(url) {
            Some(body) => (200, body.clone()),
            None => (404, "Not Found".to_string()),
        };
        Ok(FetchedPage {
            url: url.to_string(),
            status,
            body,
        })
    }
}

/// Index page listing `names`, with the header row the live catalog has
pub fn index_page(names: &[&str]) -> String {
    let rows: String = names
        .iter()
        .map(|name| {
            format!(
                "<tr><td><a href=\"../../web/packages/{0}/index.html\"><span class=\"CRAN\">{0}</span></a></td>\
                 <td>Tools for {0}</td></tr>\n",
                name
            )
        })
        .collect();

    format!(
        "<html><head><title>CRAN: Available Packages By Name</title></head><body>\
         <table summary=\"Available CRAN packages by name.\">\n\
         <tr><th>Package</th><th>Title</th></tr>\n{}</table></body></html>",
        rows
    )
}

pub fn detail_page(name: &str, depends: &str, imports: &str) -> String {
    format!(
        r#"<html><head><title>CRAN: Package {name}</title></head><body>
        <h2>{name}: A Package</h2>
        <p>Utilities for
           working with {name}.</p>
        <table summary="Package {name} summary">
        <tr><td>Version:</td><td>0.2.1</td></tr>
        <tr><td>Depends:</td><td>{depends}</td></tr>
        <tr><td>Imports:</td><td>{imports}</td></tr>
        <tr><td>Published:</td><td>2024-03-01</td></tr>
        <tr><td>Author:</td><td>Jane Doe [aut, cre]</td></tr>
        <tr><td>Maintainer:</td><td>Jane Doe  &lt;jane at example.org&gt;</td></tr>
        <tr><td>License:</td><td>GPL-3</td></tr>
        <tr><td>NeedsCompilation:</td><td>no</td></tr>
        </table></body></html>"#
    )
}

pub fn user_agent_page(agents: &[&str]) -> String {
    let items: String = agents
        .iter()
        .map(|agent| format!("<li><a href=\"/ua\">{}</a></li>", agent))
        .collect();
    format!(
        "<html><body><div id=\"liste\"><ul>{}</ul></div>\
         <ul><li>not an agent</li></ul></body></html>",
        items
    )
}

/// Writes a harvester config file pointing the identity lists at `lists_uri`
pub fn write_config(dir: &Path, lists_uri: &str, database_path: &Path) -> std::path::PathBuf {
    let content = format!(
        r#"
[catalog]
index-url = "{INDEX_URL}"
detail-url = "http://catalog.test/package={{name}}"

[identity]
proxy-source = "{lists_uri}/proxies.txt"
user-agent-source = "{lists_uri}/agents.html"
max-proxy-uses = 1
max-user-agents = 10

[fetch]
timeout-secs = 5
rotate-after = 2
max-attempts = 4

[output]
database-path = "{}"

[harvest]
progress-interval = 1
"#,
        database_path.display()
    );

    let path = dir.join("harvest.toml");
    std::fs::write(&path, content).unwrap();
    path
}
