//! Application object the build hooks are registered on.
//!
//! A `DocsApp` holds the configuration, the source parsers that are
//! available, and the handlers connected to each build event. The builder
//! emits the events; handlers run in the order they were connected.

use indexmap::IndexMap;
use log::debug;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::{DocsConfig, SourceFormat};
use crate::doxygen::{self, GeneratedStubs};
use crate::error::{DocsError, Result};
use crate::links::{self, LinkRewriter};

/// Build lifecycle points handlers can be connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// Emitted once, after the builder is created and before any page is read
    BuilderInited,
    /// Emitted for every source page, with its raw text
    SourceRead,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::BuilderInited => "builder-inited",
            Event::SourceRead => "source-read",
        }
    }
}

/// What handlers see of the running build.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub config: DocsConfig,
    /// Directory holding the source pages
    pub source_dir: PathBuf,
    /// Directory relative configuration paths resolve against
    pub conf_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl BuildContext {
    pub fn new(config: DocsConfig, source_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            config,
            conf_dir: source_dir.clone(),
            source_dir,
            output_dir,
        }
    }

    pub fn with_conf_dir(mut self, conf_dir: PathBuf) -> Self {
        self.conf_dir = conf_dir;
        self
    }
}

type BuilderInitedHandler = Box<dyn Fn(&BuildContext) -> Result<()>>;
type SourceReadHandler = Box<dyn Fn(&BuildContext, &str, &mut String) -> Result<()>>;

pub struct DocsApp {
    config: DocsConfig,
    parsers: HashSet<SourceFormat>,
    config_values: IndexMap<String, serde_json::Value>,
    builder_inited: Vec<BuilderInitedHandler>,
    source_read: Vec<SourceReadHandler>,
    /// Filled by the stub hook on each `builder-inited`
    stubs: Rc<RefCell<Option<GeneratedStubs>>>,
}

impl DocsApp {
    /// reStructuredText is always parseable; other formats need a registered parser.
    pub fn new(config: DocsConfig) -> Self {
        let mut parsers = HashSet::new();
        parsers.insert(SourceFormat::RestructuredText);

        Self {
            config,
            parsers,
            config_values: IndexMap::new(),
            builder_inited: Vec::new(),
            source_read: Vec::new(),
            stubs: Rc::new(RefCell::new(None)),
        }
    }

    pub fn config(&self) -> &DocsConfig {
        &self.config
    }

    pub fn add_source_parser(&mut self, format: SourceFormat) {
        debug!("Registered source parser for {:?}", format);
        self.parsers.insert(format);
    }

    /// Format of `path` if its suffix is configured and a parser handles it.
    pub fn source_format(&self, path: &Path) -> Option<SourceFormat> {
        self.config
            .source_format(path)
            .filter(|format| self.parsers.contains(format))
    }

    /// Suffixes whose format has a registered parser.
    pub fn source_suffixes(&self) -> Vec<String> {
        self.config
            .source_suffix
            .iter()
            .filter(|(_, format)| self.parsers.contains(format))
            .map(|(suffix, _)| suffix.clone())
            .collect()
    }

    /// Register an extra named configuration value. Names are unique.
    pub fn add_config_value(
        &mut self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<()> {
        let name = name.into();
        if self.config_values.contains_key(&name) {
            return Err(DocsError::Config(format!(
                "config value '{}' is already present",
                name
            )));
        }
        self.config_values.insert(name, value);
        Ok(())
    }

    pub fn config_value(&self, name: &str) -> Option<&serde_json::Value> {
        self.config_values.get(name)
    }

    pub fn connect_builder_inited<F>(&mut self, handler: F)
    where
        F: Fn(&BuildContext) -> Result<()> + 'static,
    {
        self.builder_inited.push(Box::new(handler));
    }

    pub fn connect_source_read<F>(&mut self, handler: F)
    where
        F: Fn(&BuildContext, &str, &mut String) -> Result<()> + 'static,
    {
        self.source_read.push(Box::new(handler));
    }

    /// Stubs written by the last `builder-inited`, if the stub hook ran since the previous take.
    pub fn take_generated_stubs(&self) -> Option<GeneratedStubs> {
        self.stubs.borrow_mut().take()
    }

    pub fn listener_count(&self, event: Event) -> usize {
        match event {
            Event::BuilderInited => self.builder_inited.len(),
            Event::SourceRead => self.source_read.len(),
        }
    }

    pub fn emit_builder_inited(&self, ctx: &BuildContext) -> Result<()> {
        debug!(
            "Emitting {} to {} handler(s)",
            Event::BuilderInited.name(),
            self.builder_inited.len()
        );
        for handler in &self.builder_inited {
            handler(ctx)?;
        }
        Ok(())
    }

    pub fn emit_source_read(
        &self,
        ctx: &BuildContext,
        docname: &str,
        source: &mut String,
    ) -> Result<()> {
        for handler in &self.source_read {
            handler(ctx, docname, source)?;
        }
        Ok(())
    }
}

/// Wire the driver documentation hooks into `app`.
pub fn setup(app: &mut DocsApp) -> Result<()> {
    debug!("Configured extensions: {}", app.config().extensions.join(", "));

    // Markdown pages
    app.add_source_parser(SourceFormat::Markdown);
    let markdown = serde_json::to_value(&app.config().markdown)?;
    app.add_config_value("recommonmark_config", markdown)?;

    // Legacy DataStax links
    let replacements = app.config().replacements();
    app.add_config_value("replacements", serde_json::to_value(&replacements)?)?;
    let rewriter = LinkRewriter::new(replacements)?;
    app.connect_source_read(move |ctx, docname, source| {
        links::replace_relative_links(&rewriter, ctx, docname, source)
    });

    // API reference stubs
    let stubs = Rc::clone(&app.stubs);
    app.connect_builder_inited(move |ctx| {
        let generated = doxygen::generate_doxygen(ctx)?;
        *stubs.borrow_mut() = Some(generated);
        Ok(())
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn context() -> BuildContext {
        BuildContext::new(
            DocsConfig::default(),
            PathBuf::from("/docs/source"),
            PathBuf::from("/docs/_build"),
        )
    }

    #[test]
    fn test_markdown_requires_registered_parser() {
        let mut app = DocsApp::new(DocsConfig::default());
        assert_eq!(app.source_format(Path::new("index.md")), None);
        assert_eq!(app.source_suffixes(), vec![".rst".to_string()]);

        app.add_source_parser(SourceFormat::Markdown);
        assert_eq!(
            app.source_format(Path::new("index.md")),
            Some(SourceFormat::Markdown)
        );
        assert_eq!(app.source_suffixes(), vec![".rst".to_string(), ".md".to_string()]);
    }

    #[test]
    fn test_duplicate_config_value() {
        let mut app = DocsApp::new(DocsConfig::default());
        app.add_config_value("replacements", serde_json::json!([])).unwrap();
        assert!(app
            .add_config_value("replacements", serde_json::json!([]))
            .is_err());
    }

    #[test]
    fn test_source_read_handlers_run_in_order() {
        let mut app = DocsApp::new(DocsConfig::default());
        app.connect_source_read(|_, _, source| {
            source.push_str(" one");
            Ok(())
        });
        app.connect_source_read(|_, _, source| {
            source.push_str(" two");
            Ok(())
        });

        let mut source = "zero".to_string();
        app.emit_source_read(&context(), "index", &mut source).unwrap();
        assert_eq!(source, "zero one two");
    }

    #[test]
    fn test_first_error_stops_emission() {
        let calls = Rc::new(RefCell::new(0));
        let mut app = DocsApp::new(DocsConfig::default());
        app.connect_builder_inited(|_| Err(DocsError::Config("boom".to_string())));
        let counter = Rc::clone(&calls);
        app.connect_builder_inited(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        assert!(app.emit_builder_inited(&context()).is_err());
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_setup_registers_hooks() {
        let mut app = DocsApp::new(DocsConfig::default());
        setup(&mut app).unwrap();

        assert_eq!(app.listener_count(Event::BuilderInited), 1);
        assert_eq!(app.listener_count(Event::SourceRead), 1);
        assert_eq!(
            app.config_value("recommonmark_config").unwrap()["enable_eval_rst"],
            true
        );
        assert_eq!(
            app.config_value("replacements").unwrap().as_array().unwrap().len(),
            3
        );

        let mut source = "See http://datastax.github.io/cpp-driver/topics/".to_string();
        app.emit_source_read(&context(), "topics/index", &mut source)
            .unwrap();
        assert_eq!(
            source,
            "See https://cpp-driver.docs.scylladb.com/master/topics/"
        );
    }

    #[test]
    fn test_stub_hook_records_generated_stubs() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("docs/source");
        let xml = temp_dir.path().join("doxygen/xml");
        fs::create_dir_all(source.join("api")).unwrap();
        fs::create_dir_all(&xml).unwrap();
        fs::write(xml.join("struct_cass_uuid.xml"), "").unwrap();
        fs::write(xml.join("struct_cass_inet.xml"), "").unwrap();

        let mut app = DocsApp::new(DocsConfig::default());
        setup(&mut app).unwrap();
        assert!(app.take_generated_stubs().is_none());

        let ctx = BuildContext::new(DocsConfig::default(), source, temp_dir.path().join("out"));
        app.emit_builder_inited(&ctx).unwrap();

        let stubs = app.take_generated_stubs().unwrap();
        assert_eq!(stubs.len(), 2);
        assert!(stubs.collisions.is_empty());
        assert!(app.take_generated_stubs().is_none());
    }
}
