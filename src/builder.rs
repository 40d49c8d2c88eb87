//! Build driver: runs the hooks and writes the site-wide pages.

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app::{self, BuildContext, DocsApp};
use crate::config::DocsConfig;
use crate::matching::{SourceFile, SourceMatcher};
use crate::notfound::NotFoundPage;
use crate::redirects;
use crate::sitemap::SitemapGenerator;

#[derive(Debug, Clone)]
pub struct BuildStats {
    pub pages_processed: usize,
    /// Pages whose text was changed by a `source-read` handler
    pub pages_rewritten: usize,
    /// API reference stubs written by `builder-inited`
    pub stubs_written: usize,
    pub redirects_written: usize,
    pub sitemap: Option<PathBuf>,
    pub build_time: Duration,
}

/// Runs one build pass: hooks, source pages, then the site-wide pages.
pub struct DocsBuilder {
    app: DocsApp,
    context: BuildContext,
}

impl DocsBuilder {
    pub fn new(config: DocsConfig, source_dir: PathBuf, output_dir: PathBuf) -> Result<Self> {
        let mut app = DocsApp::new(config.clone());
        app::setup(&mut app).context("Failed to set up documentation hooks")?;

        let context = BuildContext::new(config, source_dir, output_dir);
        Ok(Self { app, context })
    }

    /// Resolve relative configuration paths against `conf_dir` instead of the source directory.
    pub fn with_conf_dir(mut self, conf_dir: PathBuf) -> Self {
        self.context = self.context.with_conf_dir(conf_dir);
        self
    }

    pub fn app(&self) -> &DocsApp {
        &self.app
    }

    pub fn source_dir(&self) -> &Path {
        &self.context.source_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.context.output_dir
    }

    pub fn build(&self) -> Result<BuildStats> {
        let start_time = Instant::now();
        info!("Starting build of {}", self.source_dir().display());

        std::fs::create_dir_all(self.output_dir()).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                self.output_dir().display()
            )
        })?;

        self.app
            .emit_builder_inited(&self.context)
            .context("builder-inited handler failed")?;
        let stubs_written = self
            .app
            .take_generated_stubs()
            .map_or(0, |stubs| stubs.len());

        let sources = self.discover_source_files()?;
        info!("Discovered {} source files", sources.len());

        let mut docnames = Vec::with_capacity(sources.len());
        let mut pages_rewritten = 0;
        for source in &sources {
            if self.process_source(source)? {
                pages_rewritten += 1;
            }
            docnames.push(source.docname.clone());
        }

        let config = &self.context.config;
        let sitemap = SitemapGenerator::from_config(config)
            .with_version(&config.versions.latest)
            .write(self.output_dir(), docnames.as_slice())
            .context("Failed to write sitemap")?;

        let redirects_written = redirects::generate_redirects(
            config.redirects_file.as_deref(),
            self.source_dir(),
            self.output_dir(),
        )
        .context("Failed to write redirect pages")?
        .len();

        NotFoundPage::new(config)
            .write(self.source_dir(), self.output_dir())
            .context("Failed to write 404 page")?;

        let build_time = start_time.elapsed();
        info!("Build completed in {:?}", build_time);

        Ok(BuildStats {
            pages_processed: docnames.len(),
            pages_rewritten,
            stubs_written,
            redirects_written,
            sitemap,
            build_time,
        })
    }

    pub fn discover_source_files(&self) -> Result<Vec<SourceFile>> {
        let config = &self.context.config;
        let mut matcher = SourceMatcher::new(self.app.source_suffixes(), &config.exclude_patterns)?;
        matcher.exclude_dir(self.source_dir(), self.output_dir())?;
        Ok(matcher
            .discover(self.source_dir())
            .with_context(|| format!("Failed to scan {}", self.source_dir().display()))?)
    }

    /// Read one page, run `source-read` over it and stage the result under `_sources`.
    fn process_source(&self, source: &SourceFile) -> Result<bool> {
        debug!("Processing {}", source.docname);

        let original = std::fs::read_to_string(&source.path)
            .with_context(|| format!("Failed to read source file: {}", source.path.display()))?;
        let mut text = original.clone();
        self.app
            .emit_source_read(&self.context, &source.docname, &mut text)
            .with_context(|| format!("source-read handler failed for {}", source.docname))?;

        let relative = source
            .path
            .strip_prefix(self.source_dir())
            .unwrap_or(&source.path);
        let output_path = self.output_dir().join("_sources").join(relative);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
        std::fs::write(&output_path, &text)
            .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;

        Ok(text != original)
    }
}
