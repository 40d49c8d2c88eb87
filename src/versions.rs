//! Selection of the git refs the documentation is built for.
//!
//! Tags and branches are whitelisted by anchored regexes built from the
//! configured version lists. Each selected version gets its own output
//! directory.

use log::debug;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::process::Command;

use crate::config::DocsConfig;
use crate::error::{DocsError, Result};

/// Whitelist regex matching exactly the given names.
///
/// `None` when the list is empty, which selects nothing.
pub fn regex_builder(versions: &[String]) -> Option<String> {
    match versions {
        [] => None,
        [only] => Some(format!("^{}$", regex::escape(only))),
        many => {
            let alternatives: Vec<_> = many.iter().map(|v| regex::escape(v)).collect();
            Some(format!("^({})$", alternatives.join("|")))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Tag,
    Branch,
}

/// A tag or branch, optionally on a remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRef {
    pub name: String,
    pub kind: RefKind,
    pub remote: Option<String>,
}

impl GitRef {
    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RefKind::Tag,
            remote: None,
        }
    }

    pub fn branch(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RefKind::Branch,
            remote: None,
        }
    }

    pub fn remote_branch(remote: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RefKind::Branch,
            remote: Some(remote.into()),
        }
    }

    /// Parse a full refname such as `refs/remotes/origin/master`.
    pub fn parse_refname(refname: &str) -> Option<Self> {
        if let Some(name) = refname.strip_prefix("refs/tags/") {
            return Some(Self::tag(name));
        }
        if let Some(name) = refname.strip_prefix("refs/heads/") {
            return Some(Self::branch(name));
        }
        let rest = refname.strip_prefix("refs/remotes/")?;
        let (remote, name) = rest.split_once('/')?;
        if name == "HEAD" {
            return None;
        }
        Some(Self::remote_branch(remote, name))
    }

    /// `tags/<name>` or `heads/<name>`, what the released pattern is matched against.
    pub fn qualified_name(&self) -> String {
        match self.kind {
            RefKind::Tag => format!("tags/{}", self.name),
            RefKind::Branch => format!("heads/{}", self.name),
        }
    }
}

/// List tags and branches of the repository at `repo`.
pub fn list_git_refs(repo: &Path) -> Result<Vec<GitRef>> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["for-each-ref", "--format=%(refname)"])
        .output()
        .map_err(|e| DocsError::Git(format!("failed to run git: {}", e)))?;

    if !output.status.success() {
        return Err(DocsError::Git(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| GitRef::parse_refname(line.trim()))
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Latest,
    Unstable,
    Deprecated,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedVersion {
    pub name: String,
    pub kind: RefKind,
    pub released: bool,
    pub status: VersionStatus,
    /// Directory below the build root this version is written to
    pub output_dir: String,
}

pub struct VersionSelector {
    tag_whitelist: Option<Regex>,
    branch_whitelist: Option<Regex>,
    remote_whitelist: Option<Regex>,
    released: Regex,
    outputdir_format: String,
    latest: String,
    rename_latest: String,
    unstable: Vec<String>,
    deprecated: Vec<String>,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| DocsError::invalid_pattern(pattern, e))
}

impl VersionSelector {
    pub fn from_config(config: &DocsConfig) -> Result<Self> {
        let versions = &config.versions;
        let multiversion = &config.multiversion;

        Ok(Self {
            tag_whitelist: regex_builder(&versions.tags)
                .map(|p| compile(&p))
                .transpose()?,
            branch_whitelist: regex_builder(&versions.branches)
                .map(|p| compile(&p))
                .transpose()?,
            remote_whitelist: multiversion
                .remote_whitelist
                .as_deref()
                .map(compile)
                .transpose()?,
            released: compile(&multiversion.released_pattern)?,
            outputdir_format: multiversion.outputdir_format.clone(),
            latest: versions.latest.clone(),
            rename_latest: multiversion.rename_latest_version.clone(),
            unstable: versions.unstable.clone(),
            deprecated: versions.deprecated.clone(),
        })
    }

    fn is_whitelisted(&self, git_ref: &GitRef) -> bool {
        let whitelist = match git_ref.kind {
            RefKind::Tag => &self.tag_whitelist,
            RefKind::Branch => &self.branch_whitelist,
        };
        if !whitelist.as_ref().is_some_and(|re| re.is_match(&git_ref.name)) {
            return false;
        }

        match (&git_ref.remote, &self.remote_whitelist) {
            (None, _) => true,
            (Some(remote), Some(re)) => re.is_match(remote),
            (Some(_), None) => false,
        }
    }

    pub fn status(&self, name: &str) -> VersionStatus {
        if name == self.latest {
            VersionStatus::Latest
        } else if self.unstable.iter().any(|v| v == name) {
            VersionStatus::Unstable
        } else if self.deprecated.iter().any(|v| v == name) {
            VersionStatus::Deprecated
        } else {
            VersionStatus::Stable
        }
    }

    pub fn output_dir(&self, name: &str) -> String {
        let dir_name = if name == self.latest && !self.rename_latest.is_empty() {
            self.rename_latest.as_str()
        } else {
            name
        };
        self.outputdir_format.replace("{ref.name}", dir_name)
    }

    /// Whitelisted refs, one per name, in input order. A local ref shadows
    /// a remote one of the same name.
    pub fn select(&self, refs: &[GitRef]) -> Vec<SelectedVersion> {
        let mut chosen: Vec<&GitRef> = Vec::new();

        for git_ref in refs.iter().filter(|r| self.is_whitelisted(r)) {
            match chosen
                .iter_mut()
                .find(|c| c.name == git_ref.name && c.kind == git_ref.kind)
            {
                Some(existing) => {
                    if existing.remote.is_some() && git_ref.remote.is_none() {
                        *existing = git_ref;
                    }
                }
                None => chosen.push(git_ref),
            }
        }

        chosen
            .into_iter()
            .map(|git_ref| {
                debug!("Selected {:?} '{}'", git_ref.kind, git_ref.name);
                SelectedVersion {
                    name: git_ref.name.clone(),
                    kind: git_ref.kind,
                    released: self.released.is_match(&git_ref.qualified_name()),
                    status: self.status(&git_ref.name),
                    output_dir: self.output_dir(&git_ref.name),
                }
            })
            .collect()
    }
}
