//! Redirect pages for moved documentation.
//!
//! The redirections file is a YAML mapping from an old path to its new URL.
//! Each old path gets a static HTML page that forwards to the new location.

use indexmap::IndexMap;
use log::{debug, info, warn};
use minijinja::{context, Environment};
use std::path::{Component, Path, PathBuf};

use crate::error::{DocsError, Result};

const REDIRECT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8" />
    <title>Redirecting&hellip;</title>
    <link rel="canonical" href="{{ url }}" />
    <meta http-equiv="refresh" content="0; url={{ url }}" />
</head>
<body>
    <p>This page has moved to <a href="{{ url }}">{{ url }}</a>.</p>
</body>
</html>
"#;

/// Read the redirections mapping at `path`.
pub fn load_redirects(path: &Path) -> Result<IndexMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| DocsError::io(path, e))?;
    // An empty file is an empty mapping
    if content.trim().is_empty() {
        return Ok(IndexMap::new());
    }
    serde_yaml::from_str(&content).map_err(|source| DocsError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Where the page for `old_path` is written, relative to the output directory.
///
/// Paths without an extension are directories and get an `index.html`.
pub fn redirect_target(old_path: &str) -> Result<PathBuf> {
    let trimmed = old_path.trim_start_matches('/');
    let relative = Path::new(trimmed);

    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(DocsError::Config(format!(
            "redirect source '{}' must stay inside the output directory",
            old_path
        )));
    }

    if trimmed.is_empty() || trimmed.ends_with('/') || relative.extension().is_none() {
        Ok(relative.join("index.html"))
    } else {
        Ok(relative.to_path_buf())
    }
}

pub fn render_redirect(url: &str) -> Result<String> {
    // Named with `.html` so the URL is attribute-escaped
    let mut env = Environment::new();
    env.add_template("redirect.html", REDIRECT_TEMPLATE)?;
    let html = env
        .get_template("redirect.html")?
        .render(context! { url => url })?;
    Ok(html)
}

/// Write one page per redirect. Returns the pages written.
pub fn write_redirects(
    redirects: &IndexMap<String, String>,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(redirects.len());
    for (old_path, new_url) in redirects {
        let path = output_dir.join(redirect_target(old_path)?);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocsError::io(parent, e))?;
        }
        std::fs::write(&path, render_redirect(new_url)?).map_err(|e| DocsError::io(&path, e))?;
        debug!("Redirect {} -> {}", old_path, new_url);
        written.push(path);
    }
    Ok(written)
}

/// Generate redirect pages from the configured file, relative to `source_dir`.
///
/// A missing file is not an error.
pub fn generate_redirects(
    redirects_file: Option<&Path>,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let Some(file) = redirects_file else {
        return Ok(Vec::new());
    };
    let path = source_dir.join(file);
    if !path.exists() {
        warn!("Redirections file {} not found, skipping", path.display());
        return Ok(Vec::new());
    }

    let redirects = load_redirects(&path)?;
    let written = write_redirects(&redirects, output_dir)?;
    info!("Wrote {} redirect pages", written.len());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_redirect_target() {
        assert_eq!(
            redirect_target("/stable/old.html").unwrap(),
            PathBuf::from("stable/old.html")
        );
        assert_eq!(
            redirect_target("/stable/topics/").unwrap(),
            PathBuf::from("stable/topics/index.html")
        );
        assert_eq!(
            redirect_target("stable/topics").unwrap(),
            PathBuf::from("stable/topics/index.html")
        );
        assert!(redirect_target("/../escape.html").is_err());
    }

    #[test]
    fn test_render_redirect() {
        let html = render_redirect("https://cpp-driver.docs.scylladb.com/master/").unwrap();
        assert!(html.contains(
            r#"<meta http-equiv="refresh" content="0; url=https:&#x2f;&#x2f;cpp-driver.docs.scylladb.com&#x2f;master&#x2f;" />"#
        ));
    }

    #[test]
    fn test_render_redirect_escapes_url() {
        let html = render_redirect(r#"https://x/"><script>alert(1)</script>"#).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"href="https:&#x2f;&#x2f;x&#x2f;&quot;&gt;&lt;script&gt;"#));
    }

    #[test]
    fn test_generate_redirects() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        let output = temp_dir.path().join("out");
        fs::create_dir_all(source.join("_utils")).unwrap();
        fs::create_dir_all(&output).unwrap();
        fs::write(
            source.join("_utils/redirections.yaml"),
            "/stable/old.html: /stable/new.html\n/stable/gone/: https://example.com/\n",
        )
        .unwrap();

        let written = generate_redirects(
            Some(Path::new("_utils/redirections.yaml")),
            &source,
            &output,
        )
        .unwrap();
        assert_eq!(written.len(), 2);
        assert!(output.join("stable/old.html").exists());
        let page = fs::read_to_string(output.join("stable/gone/index.html")).unwrap();
        assert!(page.contains("https:&#x2f;&#x2f;example.com&#x2f;"));
    }

    #[test]
    fn test_missing_redirects_file_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let written = generate_redirects(
            Some(Path::new("_utils/redirections.yaml")),
            temp_dir.path(),
            temp_dir.path(),
        )
        .unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn test_malformed_redirects_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("redirections.yaml");
        fs::write(&path, "- just\n- a list\n").unwrap();
        assert!(matches!(
            load_redirects(&path),
            Err(DocsError::Yaml { .. })
        ));
    }
}
