//! XML sitemap generation.

use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::config::DocsConfig;
use crate::error::{DocsError, Result};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub struct SitemapGenerator {
    base_url: String,
    url_scheme: String,
    version: String,
    language: String,
}

impl SitemapGenerator {
    pub fn new(base_url: impl Into<String>, url_scheme: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            url_scheme: url_scheme.into(),
            version: String::new(),
            language: String::new(),
        }
    }

    pub fn from_config(config: &DocsConfig) -> Self {
        let mut generator = Self::new(
            config.html.baseurl.clone(),
            config.sitemap_url_scheme.clone(),
        );
        if let Some(language) = &config.language {
            generator.language = format!("{}/", language);
        }
        generator
    }

    /// Version substituted for `{version}`, with its trailing slash.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = if version.is_empty() {
            String::new()
        } else {
            format!("{}/", version)
        };
        self
    }

    /// Absolute URL of a page.
    pub fn page_url(&self, docname: &str) -> String {
        let link = format!("{}.html", docname);
        let path = self
            .url_scheme
            .replace("{lang}", &self.language)
            .replace("{version}", &self.version)
            .replace("{link}", &link);
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn render<S: AsRef<str>>(&self, docnames: &[S]) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        xml.push_str(&format!("<urlset xmlns=\"{}\">\n", SITEMAP_NS));
        for docname in docnames {
            let url = self.page_url(docname.as_ref());
            xml.push_str(&format!(
                "  <url><loc>{}</loc></url>\n",
                html_escape::encode_text(&url)
            ));
        }
        xml.push_str("</urlset>\n");
        xml
    }

    /// Write `sitemap.xml` into `output_dir`. Skipped without a base URL.
    pub fn write<S: AsRef<str>>(
        &self,
        output_dir: &Path,
        docnames: &[S],
    ) -> Result<Option<PathBuf>> {
        if self.base_url.is_empty() {
            warn!("html_baseurl is not set, skipping sitemap generation");
            return Ok(None);
        }

        let path = output_dir.join("sitemap.xml");
        std::fs::write(&path, self.render(docnames)).map_err(|e| DocsError::io(&path, e))?;
        info!("Wrote sitemap with {} pages", docnames.len());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_page_url_default_scheme() {
        let generator = SitemapGenerator::from_config(&DocsConfig::default());
        assert_eq!(
            generator.page_url("topics/basics/uuids/README"),
            "https://cpp-driver.docs.scylladb.com/stable/topics/basics/uuids/README.html"
        );
    }

    #[test]
    fn test_page_url_with_version_and_language() {
        let config = DocsConfig {
            language: Some("en".to_string()),
            sitemap_url_scheme: "{lang}{version}{link}".to_string(),
            ..DocsConfig::default()
        };
        let generator = SitemapGenerator::from_config(&config).with_version("master");
        assert_eq!(
            generator.page_url("index"),
            "https://cpp-driver.docs.scylladb.com/en/master/index.html"
        );
    }

    #[test]
    fn test_render_escapes_urls() {
        let generator = SitemapGenerator::new("https://example.com/", "{link}");
        let xml = generator.render(&["a&b"]);
        assert!(xml.contains("<loc>https://example.com/a&amp;b.html</loc>"));
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_write_without_base_url() {
        let temp_dir = TempDir::new().unwrap();
        let generator = SitemapGenerator::new("", "{link}");
        assert_eq!(generator.write(temp_dir.path(), &["index"]).unwrap(), None);
        assert!(!temp_dir.path().join("sitemap.xml").exists());
    }

    #[test]
    fn test_write() {
        let temp_dir = TempDir::new().unwrap();
        let generator = SitemapGenerator::from_config(&DocsConfig::default());
        let path = generator
            .write(temp_dir.path(), &["contents", "api/struct.CassUuid"])
            .unwrap()
            .unwrap();
        let xml = std::fs::read_to_string(path).unwrap();
        assert_eq!(xml.matches("<url>").count(), 2);
        assert!(xml.contains("/stable/api/struct.CassUuid.html"));
    }
}
