//! Source page discovery.
//!
//! Exclusion patterns use the same glob dialect as Sphinx's
//! `exclude_patterns`, matched against `/`-separated paths relative to the
//! source directory. A directory that matches is skipped with everything
//! below it.

use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use walkdir::WalkDir;

use crate::error::{DocsError, Result};

lazy_static::lazy_static! {
    /// Compiled patterns, keyed by glob
    static ref PATTERN_CACHE: Mutex<HashMap<String, Regex>> = Mutex::new(HashMap::new());
}

/// Translate a glob into an anchored regex.
///
/// - `**/` matches zero or more directories, a trailing `**` anything
/// - `*` matches within one path segment
/// - `?` matches one character within a segment
/// - `[seq]` and `[!seq]` are character classes
pub fn translate_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < n {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:[^/]+/)*");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push('[');
                    let mut k = i + 1;
                    if chars[k] == '!' || chars[k] == '^' {
                        out.push('^');
                        k += 1;
                    }
                    while k < end {
                        if chars[k] == '\\' && k + 1 < end {
                            out.push('\\');
                            out.push(chars[k + 1]);
                            k += 2;
                        } else {
                            out.push(chars[k]);
                            k += 1;
                        }
                    }
                    out.push(']');
                    i = end + 1;
                }
                None => {
                    out.push_str("\\[");
                    i += 1;
                }
            },
            c => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }

    format!("^{}$", out)
}

/// Index of the `]` closing the class opened at `start`, if any.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if j < chars.len() && (chars[j] == '!' || chars[j] == '^') {
        j += 1;
    }
    // A leading ']' is part of the class
    if j < chars.len() && chars[j] == ']' {
        j += 1;
    }
    while j < chars.len() && chars[j] != ']' {
        j += 1;
    }
    (j < chars.len()).then_some(j)
}

pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let mut cache = PATTERN_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(&translate_pattern(pattern))
        .map_err(|e| DocsError::invalid_pattern(pattern, e))?;
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

pub fn pattern_match(name: &str, pattern: &str) -> Result<bool> {
    Ok(compile_pattern(pattern)?.is_match(name))
}

/// `/`-separated form of a relative path.
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// A discovered source page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the source directory, without suffix
    pub docname: String,
}

/// Finds source pages below a directory.
pub struct SourceMatcher {
    suffixes: Vec<String>,
    excludes: Vec<Regex>,
}

impl SourceMatcher {
    pub fn new(suffixes: Vec<String>, exclude_patterns: &[String]) -> Result<Self> {
        let excludes = exclude_patterns
            .iter()
            .map(|p| compile_pattern(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { suffixes, excludes })
    }

    /// Also skip everything below `dir`, when it lies inside the source directory.
    pub fn exclude_dir(&mut self, source_dir: &Path, dir: &Path) -> Result<()> {
        let (Ok(source), Ok(dir)) = (source_dir.canonicalize(), dir.canonicalize()) else {
            return Ok(());
        };
        if let Ok(relative) = dir.strip_prefix(&source) {
            let relative = normalize_path(relative);
            if !relative.is_empty() {
                debug!("Excluding output directory {} from sources", relative);
                self.excludes.push(compile_pattern(&relative)?);
            }
        }
        Ok(())
    }

    pub fn is_excluded(&self, relative: &str) -> bool {
        self.excludes.iter().any(|regex| regex.is_match(relative))
    }

    fn suffix_of(&self, file_name: &str) -> Option<&str> {
        self.suffixes
            .iter()
            .find(|suffix| file_name.len() > suffix.len() && file_name.ends_with(suffix.as_str()))
            .map(|s| s.as_str())
    }

    /// Source pages below `source_dir`, sorted by docname.
    pub fn discover(&self, source_dir: &Path) -> Result<Vec<SourceFile>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(source_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                let Ok(relative) = entry.path().strip_prefix(source_dir) else {
                    return true;
                };
                let relative = normalize_path(relative);
                relative.is_empty() || !self.is_excluded(&relative)
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(source_dir).to_path_buf();
                DocsError::Io {
                    path,
                    source: e.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(suffix) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| self.suffix_of(name))
            else {
                continue;
            };

            let relative = normalize_path(path.strip_prefix(source_dir).unwrap_or(path));
            let docname = relative[..relative.len() - suffix.len()].to_string();
            files.push(SourceFile {
                path: path.to_path_buf(),
                docname,
            });
        }

        files.sort_by(|a, b| a.docname.cmp(&b.docname));
        Ok(files)
    }
}
