//! Godot class reference scraper writing one text file per class.

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::{IndexError, Result};

const CLASS_LINK_SELECTOR: &str = ".toctree-l1 a";
const SECTION_SELECTORS: &[&str] = &[".section", "section"];

/// Written into the output directory once a scrape has run to the end.
pub const COMPLETE_MARKER: &str = ".complete";

#[derive(Debug, Clone)]
pub struct DocsConfig {
    /// Root of the docs site, e.g. `https://docs.godotengine.org/en`.
    pub base_url: String,
    pub cache_dir: PathBuf,
    pub request_delay: Duration,
    pub timeout: Duration,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://docs.godotengine.org/en".into(),
            cache_dir: PathBuf::from("."),
            request_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct DocsScraper {
    client: reqwest::Client,
    config: DocsConfig,
}

impl DocsScraper {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: DocsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("gdrag/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Output directory for `version`: `<cache_dir>/godot_docs_<version>`.
    #[must_use]
    pub fn output_dir(&self, version: &str) -> PathBuf {
        self.config.cache_dir.join(format!("godot_docs_{version}"))
    }

    /// Download the class reference for `version` and return the directory
    /// holding the `.txt` pages. A directory carrying [`COMPLETE_MARKER`] is
    /// reused as is; anything else is scraped again.
    ///
    /// # Errors
    ///
    /// Returns an error if the class index cannot be fetched or parsed, or the
    /// output directory cannot be created. Individual class pages that fail
    /// are logged and skipped.
    pub async fn scrape(&self, version: &str) -> Result<PathBuf> {
        let out_dir = self.output_dir(version);
        if is_complete(&out_dir).await {
            tracing::info!(dir = %out_dir.display(), "reusing cached docs");
            return Ok(out_dir);
        }
        tokio::fs::create_dir_all(&out_dir).await?;

        let index_url = Url::parse(&format!(
            "{}/{version}/classes/index.html",
            self.config.base_url.trim_end_matches('/')
        ))?;
        tracing::info!(version, url = %index_url, "scraping class reference");
        let index_html = self.fetch(&index_url).await?;
        let links = extract_class_links(&index_html, &index_url)?;
        tracing::info!(classes = links.len(), "found class pages");

        let total = links.len();
        for (i, link) in links.iter().enumerate() {
            let name = class_name(link);
            tracing::debug!(progress = format_args!("{}/{total}", i + 1), class = %name);
            if let Err(e) = self.scrape_page(link, &out_dir.join(format!("{name}.txt"))).await {
                tracing::warn!(url = %link, "failed to scrape page: {e:#}");
            }
            if i + 1 < total && !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }
        }

        tokio::fs::write(out_dir.join(COMPLETE_MARKER), version).await?;
        Ok(out_dir)
    }

    async fn scrape_page(&self, url: &Url, dest: &Path) -> Result<()> {
        let html = self.fetch(url).await?;
        match extract_section_text(&html)? {
            Some(text) => tokio::fs::write(dest, text).await?,
            None => tracing::debug!(url = %url, "no content section"),
        }
        Ok(())
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let resp = self.client.get(url.clone()).send().await?;
        let resp = resp.error_for_status()?;
        Ok(resp.text().await?)
    }
}

async fn is_complete(dir: &Path) -> bool {
    tokio::fs::try_exists(dir.join(COMPLETE_MARKER))
        .await
        .unwrap_or(false)
}

/// Absolute URLs of class pages linked from the class index, deduplicated in
/// document order.
fn extract_class_links(html: &str, base: &Url) -> Result<Vec<Url>> {
    let soup = scrape_core::Soup::parse(html);
    let tags = soup
        .find_all(CLASS_LINK_SELECTOR)
        .map_err(|e| IndexError::Scrape(format!("invalid selector: {e}")))?;

    let mut links: Vec<Url> = Vec::new();
    for tag in tags {
        let Some(href) = tag.get("href") else {
            continue;
        };
        if !href.contains("class_") {
            continue;
        }
        let url = base.join(href)?;
        if !links.contains(&url) {
            links.push(url);
        }
    }
    Ok(links)
}

/// Text of the first content section, if the page has one.
fn extract_section_text(html: &str) -> Result<Option<String>> {
    let soup = scrape_core::Soup::parse(html);
    for selector in SECTION_SELECTORS {
        let tags = soup
            .find_all(selector)
            .map_err(|e| IndexError::Scrape(format!("invalid selector: {e}")))?;
        if let Some(tag) = tags.into_iter().next() {
            return Ok(Some(tag.text()));
        }
    }
    Ok(None)
}

/// `class_node` from `.../classes/class_node.html#anchor`.
fn class_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
        .trim_end_matches(".html")
        .to_owned()
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const INDEX_HTML: &str = r#"<html><body>
        <ul>
          <li class="toctree-l1"><a href="class_node.html">Node</a></li>
          <li class="toctree-l1"><a href="class_node2d.html#description">Node2D</a></li>
          <li class="toctree-l1"><a href="class_node.html">Node again</a></li>
          <li class="toctree-l1"><a href="../tutorials/index.html">Tutorials</a></li>
          <li class="toctree-l2"><a href="class_sprite2d.html">nested</a></li>
        </ul></body></html>"#;

    #[test]
    fn class_links_are_filtered_resolved_and_deduped() {
        let base = Url::parse("https://docs.example.org/en/stable/classes/index.html").unwrap();
        let links = extract_class_links(INDEX_HTML, &base).unwrap();
        let links: Vec<&str> = links.iter().map(Url::as_str).collect();
        assert_eq!(
            links,
            vec![
                "https://docs.example.org/en/stable/classes/class_node.html",
                "https://docs.example.org/en/stable/classes/class_node2d.html#description",
            ]
        );
    }

    #[test]
    fn class_name_strips_html_and_fragment() {
        let url =
            Url::parse("https://docs.example.org/en/stable/classes/class_node2d.html#x").unwrap();
        assert_eq!(class_name(&url), "class_node2d");
    }

    #[test]
    fn section_text_extracted() {
        let html = r#"<div class="section"><h1>Node</h1><p>Base class for all scene objects.</p></div>"#;
        let text = extract_section_text(html).unwrap().unwrap();
        assert!(text.contains("Node"));
        assert!(text.contains("Base class for all scene objects."));
    }

    #[test]
    fn missing_section_is_none() {
        let html = "<html><body><p>nothing here</p></body></html>";
        assert!(extract_section_text(html).unwrap().is_none());
    }

    fn scraper(base_url: String, cache_dir: &Path) -> DocsScraper {
        DocsScraper::new(DocsConfig {
            base_url,
            cache_dir: cache_dir.to_path_buf(),
            request_delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn scrape_writes_one_file_per_class() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stable/classes/index.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(INDEX_HTML))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stable/classes/class_node.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<div class="section">Node docs</div>"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stable/classes/class_node2d.html"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let s = scraper(server.uri(), dir.path());
        let out = s.scrape("stable").await.unwrap();

        assert_eq!(out, dir.path().join("godot_docs_stable"));
        let node = std::fs::read_to_string(out.join("class_node.txt")).unwrap();
        assert_eq!(node.trim(), "Node docs");
        assert!(!out.join("class_node2d.txt").exists());
        assert!(out.join(COMPLETE_MARKER).exists());

        // second run hits the cache
        let again = s.scrape("stable").await.unwrap();
        assert_eq!(again, out);
    }

    #[tokio::test]
    async fn scrape_fails_when_index_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let s = scraper(server.uri(), dir.path());
        assert!(s.scrape("4.4").await.is_err());
        assert!(!s.output_dir("4.4").join(COMPLETE_MARKER).exists());
    }

    #[tokio::test]
    async fn interrupted_cache_is_scraped_again() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stable/classes/index.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(INDEX_HTML))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stable/classes/class_node.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<div class="section">Node docs</div>"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stable/classes/class_node2d.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<div class="section">Node2D docs</div>"#),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let s = scraper(server.uri(), dir.path());
        let partial = s.output_dir("stable");
        std::fs::create_dir_all(&partial).unwrap();
        std::fs::write(partial.join("class_node.txt"), "truncated").unwrap();

        let out = s.scrape("stable").await.unwrap();
        assert_eq!(out, partial);
        let node = std::fs::read_to_string(out.join("class_node.txt")).unwrap();
        assert_eq!(node.trim(), "Node docs");
        assert!(out.join("class_node2d.txt").exists());
        assert!(out.join(COMPLETE_MARKER).exists());
    }
}
