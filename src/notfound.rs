//! The site's 404 page.

use log::{debug, info};
use minijinja::{context, Environment};
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::config::DocsConfig;
use crate::error::{DocsError, Result};

const TEMPLATE_NAME: &str = "404.html";

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ language }}">
<head>
    <meta charset="utf-8" />
    <title>Page not found &mdash; {{ project }}</title>
    <link rel="stylesheet" href="{{ urls_prefix }}_static/theme.css" />
</head>
<body>
    <h1>Page not found</h1>
    <p>Sorry, the page you are looking for does not exist.</p>
    <p><a href="{{ urls_prefix }}{{ master_doc }}.html">Back to {{ project }}</a></p>
    <footer>
        <p>&copy; {{ copyright }}</p>
        {% if last_updated %}<p>Last updated on {{ last_updated }}.</p>{% endif %}
    </footer>
</body>
</html>
"#;

/// Current local time in `fmt`, or a config error when `fmt` is not a valid strftime string.
pub fn format_last_updated(fmt: &str) -> Result<String> {
    let mut stamp = String::new();
    write!(stamp, "{}", chrono::Local::now().format(fmt))
        .map_err(|_| DocsError::Config(format!("invalid last_updated_fmt '{}'", fmt)))?;
    Ok(stamp)
}

/// Renders `404.html` from the project template, or the built-in one.
pub struct NotFoundPage<'a> {
    config: &'a DocsConfig,
}

impl<'a> NotFoundPage<'a> {
    pub fn new(config: &'a DocsConfig) -> Self {
        Self { config }
    }

    /// Project override of the template, under `_templates`.
    fn template_source(&self, source_dir: &Path) -> Result<String> {
        let custom = source_dir
            .join("_templates")
            .join(&self.config.notfound.template);
        if custom.is_file() {
            debug!("Using 404 template {}", custom.display());
            return std::fs::read_to_string(&custom).map_err(|e| DocsError::io(&custom, e));
        }
        Ok(DEFAULT_TEMPLATE.to_string())
    }

    pub fn render(&self, source_dir: &Path) -> Result<String> {
        let config = self.config;
        let last_updated = config
            .html
            .last_updated_fmt
            .as_deref()
            .map(|fmt| format_last_updated(if fmt.is_empty() { "%b %d, %Y" } else { fmt }))
            .transpose()?;

        let source = self.template_source(source_dir)?;
        // Named with `.html` so values are HTML-escaped
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, &source)?;
        let html = env.get_template(TEMPLATE_NAME)?.render(context! {
            project => config.project,
            copyright => config.copyright(),
            language => config.language.as_deref().unwrap_or("en"),
            master_doc => config.master_doc,
            urls_prefix => config.notfound.urls_prefix,
            html_baseurl => config.html.baseurl,
            last_updated => last_updated,
            theme_options => config.theme_options(),
            context => config.html_context(),
        })?;
        Ok(html)
    }

    pub fn write(&self, source_dir: &Path, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(TEMPLATE_NAME);
        let html = self.render(source_dir)?;
        std::fs::write(&path, html).map_err(|e| DocsError::io(&path, e))?;
        info!("Wrote {}", path.display());
        Ok(path)
    }
}
