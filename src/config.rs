//! Site configuration for the driver documentation.
//!
//! `DocsConfig::default()` is the configuration the site is built with; a
//! YAML, TOML or JSON file may override any subset of it.

use chrono::format::{Item, StrftimeItems};
use chrono::Datelike;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DocsError, Result};
use crate::links::{default_replacements, LinkRewriter, ReplacementRule};

/// Parser a source suffix is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    RestructuredText,
    Markdown,
}

/// Versions published on the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionsConfig {
    /// Tags to build documentation for
    pub tags: Vec<String>,
    /// Branches to build documentation for
    pub branches: Vec<String>,
    /// The version considered latest; must be one of the tags or branches
    pub latest: String,
    /// Versions not released yet
    pub unstable: Vec<String>,
    /// Deprecated versions
    pub deprecated: Vec<String>,
}

impl Default for VersionsConfig {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            branches: vec!["master".to_string()],
            latest: "master".to_string(),
            unstable: Vec::new(),
            deprecated: vec![String::new()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiversionConfig {
    /// Remotes whose branches are considered; `None` means local branches only
    pub remote_whitelist: Option<String>,
    /// Matched against `tags/<name>` or `heads/<name>` to flag released versions
    pub released_pattern: String,
    /// Output directory per version, `{ref.name}` is substituted
    pub outputdir_format: String,
    /// Directory name used for the latest version instead of its own name, when set
    pub rename_latest_version: String,
}

impl Default for MultiversionConfig {
    fn default() -> Self {
        Self {
            remote_whitelist: Some(r"^origin$".to_string()),
            released_pattern: r"^tags/.*$".to_string(),
            outputdir_format: "{ref.name}".to_string(),
            rename_latest_version: String::new(),
        }
    }
}

/// Doxygen XML projects the API reference is generated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreatheConfig {
    pub projects: IndexMap<String, PathBuf>,
    pub default_project: String,
    pub default_members: Vec<String>,
}

impl Default for BreatheConfig {
    fn default() -> Self {
        let mut projects = IndexMap::new();
        projects.insert("API".to_string(), PathBuf::from("../../doxygen/xml/"));
        Self {
            projects,
            default_project: "API".to_string(),
            default_members: vec!["members".to_string(), "undoc-members".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotFoundConfig {
    /// Template used to render the 404 page
    pub template: String,
    /// Prefix added to every URL in the 404 page
    pub urls_prefix: String,
}

impl Default for NotFoundConfig {
    fn default() -> Self {
        Self {
            template: "404.html".to_string(),
            urls_prefix: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub enable_eval_rst: bool,
    pub enable_auto_toc_tree: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            enable_eval_rst: true,
            enable_auto_toc_tree: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    pub theme: String,
    /// Theme options; version lists are merged in by [`DocsConfig::theme_options`]
    pub theme_options: IndexMap<String, serde_json::Value>,
    /// strftime format of the "last updated" stamp
    pub last_updated_fmt: Option<String>,
    pub sidebars: IndexMap<String, Vec<String>>,
    pub htmlhelp_basename: String,
    /// Root URL of the published documentation
    pub baseurl: String,
    pub context: IndexMap<String, serde_json::Value>,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        let theme_options = [
            ("conf_py_path", "docs/source/"),
            ("default_branch", "master"),
            ("github_repository", "scylladb/cpp-driver"),
            ("github_issues_repository", "scylladb/cpp-driver"),
            ("hide_edit_this_page_button", "false"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
        .collect();

        let mut sidebars = IndexMap::new();
        sidebars.insert("**".to_string(), vec!["side-nav.html".to_string()]);

        Self {
            theme: "sphinx_scylladb_theme".to_string(),
            theme_options,
            last_updated_fmt: Some("%d %B %Y".to_string()),
            sidebars,
            htmlhelp_basename: "ScyllaDocumentationdoc".to_string(),
            baseurl: "https://cpp-driver.docs.scylladb.com".to_string(),
            context: IndexMap::new(),
        }
    }
}

/// Complete documentation site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    pub project: String,
    /// Computed from the current year when absent
    pub copyright: Option<String>,
    pub author: String,
    pub master_doc: String,
    pub language: Option<String>,
    pub pygments_style: String,
    pub todo_include_todos: bool,
    pub autosectionlabel_prefix_document: bool,
    pub extensions: Vec<String>,
    pub source_suffix: IndexMap<String, SourceFormat>,
    /// Glob patterns, relative to the source directory, of files and directories to skip
    pub exclude_patterns: Vec<String>,
    pub suppress_warnings: Vec<String>,
    pub versions: VersionsConfig,
    pub multiversion: MultiversionConfig,
    pub breathe: BreatheConfig,
    pub sitemap_url_scheme: String,
    pub notfound: NotFoundConfig,
    /// YAML mapping of old paths to new URLs, relative to the source directory
    pub redirects_file: Option<PathBuf>,
    pub html: HtmlConfig,
    pub markdown: MarkdownConfig,
    /// Link rewriting rules; the legacy DataStax rules when absent
    pub replacements: Option<Vec<ReplacementRule>>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        let mut source_suffix = IndexMap::new();
        source_suffix.insert(".rst".to_string(), SourceFormat::RestructuredText);
        source_suffix.insert(".md".to_string(), SourceFormat::Markdown);

        Self {
            project: "Scylla C/C++ Driver Documentation".to_string(),
            copyright: None,
            author: "Scylla Project Contributors".to_string(),
            master_doc: "contents".to_string(),
            language: None,
            pygments_style: "sphinx".to_string(),
            todo_include_todos: true,
            autosectionlabel_prefix_document: true,
            extensions: [
                "sphinx.ext.todo",
                "sphinx.ext.mathjax",
                "sphinx.ext.githubpages",
                "sphinx.ext.extlinks",
                "sphinx_sitemap",
                "sphinx_scylladb_theme",
                "sphinx_multiversion",
                "breathe",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            source_suffix,
            exclude_patterns: vec![
                "_build".to_string(),
                "Thumbs.db".to_string(),
                ".DS_Store".to_string(),
            ],
            suppress_warnings: vec!["ref.*".to_string()],
            versions: VersionsConfig::default(),
            multiversion: MultiversionConfig::default(),
            breathe: BreatheConfig::default(),
            sitemap_url_scheme: "stable/{link}".to_string(),
            notfound: NotFoundConfig::default(),
            redirects_file: Some(PathBuf::from("_utils/redirections.yaml")),
            html: HtmlConfig::default(),
            markdown: MarkdownConfig::default(),
            replacements: None,
        }
    }
}

impl DocsConfig {
    /// Load a configuration file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DocsError::io(path, e))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        let config: DocsConfig = match extension {
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|source| DocsError::Yaml {
                path: path.to_path_buf(),
                source,
            })?,
            "toml" => toml::from_str(&content).map_err(|source| DocsError::Toml {
                path: path.to_path_buf(),
                source,
            })?,
            "json" => serde_json::from_str(&content)?,
            other => {
                return Err(DocsError::Config(format!(
                    "unsupported configuration format '{}' for {}",
                    other,
                    path.display()
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !self.breathe.projects.contains_key(&self.breathe.default_project) {
            return Err(DocsError::UnknownProject(
                self.breathe.default_project.clone(),
            ));
        }

        let latest = &self.versions.latest;
        if !self.versions.tags.contains(latest) && !self.versions.branches.contains(latest) {
            return Err(DocsError::Config(format!(
                "latest version '{}' is neither a configured tag nor a branch",
                latest
            )));
        }

        // Compiling surfaces the first bad pattern
        LinkRewriter::new(self.replacements())?;

        if let Some(fmt) = &self.html.last_updated_fmt {
            if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
                return Err(DocsError::Config(format!(
                    "invalid last_updated_fmt '{}'",
                    fmt
                )));
            }
        }

        Ok(())
    }

    pub fn copyright(&self) -> String {
        self.copyright.clone().unwrap_or_else(|| {
            format!(
                "{}, ScyllaDB. All rights reserved.",
                chrono::Local::now().year()
            )
        })
    }

    /// Replacement rules in application order.
    pub fn replacements(&self) -> Vec<ReplacementRule> {
        self.replacements
            .clone()
            .unwrap_or_else(|| default_replacements(&self.versions.latest))
    }

    /// The XML directory of the default doxygen project, resolved against `conf_dir`.
    pub fn doxygen_xml_dir(&self, conf_dir: &Path) -> Result<PathBuf> {
        let project = &self.breathe.default_project;
        let dir = self
            .breathe
            .projects
            .get(project)
            .ok_or_else(|| DocsError::UnknownProject(project.clone()))?;

        Ok(if dir.is_absolute() {
            dir.clone()
        } else {
            conf_dir.join(dir)
        })
    }

    /// Source format for a path, by its registered suffix.
    pub fn source_format(&self, path: &Path) -> Option<SourceFormat> {
        let name = path.file_name()?.to_str()?;
        self.source_suffix
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix.as_str()) && name.len() > suffix.len())
            .map(|(_, format)| *format)
    }

    /// Theme options with the version lists merged in.
    pub fn theme_options(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut options: serde_json::Map<_, _> = self
            .html
            .theme_options
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        options.insert(
            "versions_unstable".to_string(),
            serde_json::json!(self.versions.unstable),
        );
        options.insert(
            "versions_deprecated".to_string(),
            serde_json::json!(self.versions.deprecated),
        );
        options
    }

    /// Values passed to every page template.
    pub fn html_context(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut context: serde_json::Map<_, _> = self
            .html
            .context
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        context
            .entry("html_baseurl")
            .or_insert_with(|| serde_json::Value::from(self.html.baseurl.clone()));
        context
    }
}
