//! Rewriting of legacy documentation links in page sources.
//!
//! Rules are applied one after another, so a rule sees the text produced by
//! every rule before it.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::app::BuildContext;
use crate::error::{DocsError, Result};

/// Base URL of the published driver documentation.
pub const DOCS_BASE_URL: &str = "https://cpp-driver.docs.scylladb.com";

/// A regex pattern and its replacement.
///
/// The replacement may reference groups of its own pattern (`$1`, `${name}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementRule {
    pub pattern: String,
    pub replacement: String,
}

impl ReplacementRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// The rules that move DataStax-hosted driver links to the Scylla site.
///
/// The `api/cassandra.h/` rule comes first; the broader
/// `datastax.github.io/cpp-driver` rule would otherwise consume its prefix.
pub fn default_replacements(latest_version: &str) -> Vec<ReplacementRule> {
    vec![
        ReplacementRule::new(
            "http://datastax.github.io/cpp-driver/api/cassandra.h/",
            format!("{}/{}/api", DOCS_BASE_URL, latest_version),
        ),
        ReplacementRule::new(
            "http://datastax.github.io/cpp-driver",
            format!("{}/{}", DOCS_BASE_URL, latest_version),
        ),
        ReplacementRule::new(
            "http://docs.datastax.com/en/developer/cpp-driver/latest",
            format!("{}/{}", DOCS_BASE_URL, latest_version),
        ),
    ]
}

#[derive(Debug, Clone)]
struct CompiledRule {
    regex: Regex,
    replacement: String,
}

/// An ordered set of compiled replacement rules.
#[derive(Debug, Clone, Default)]
pub struct LinkRewriter {
    rules: Vec<CompiledRule>,
}

impl LinkRewriter {
    pub fn new(rules: impl IntoIterator<Item = ReplacementRule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let regex = Regex::new(&rule.pattern)
                    .map_err(|e| DocsError::invalid_pattern(&rule.pattern, e))?;
                Ok(CompiledRule {
                    regex,
                    replacement: rule.replacement,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule, in order, to `source`.
    pub fn rewrite(&self, source: &str) -> String {
        let mut result = source.to_string();
        for rule in &self.rules {
            result = rule
                .regex
                .replace_all(&result, rule.replacement.as_str())
                .into_owned();
        }
        result
    }

    /// Rewrite `source` in place. Returns whether the text changed.
    pub fn rewrite_in_place(&self, source: &mut String) -> bool {
        let rewritten = self.rewrite(source);
        if rewritten == *source {
            return false;
        }
        *source = rewritten;
        true
    }
}

/// `source-read` hook: rewrite legacy links in the page text.
pub fn replace_relative_links(
    rewriter: &LinkRewriter,
    _ctx: &BuildContext,
    docname: &str,
    source: &mut String,
) -> Result<()> {
    if rewriter.rewrite_in_place(source) {
        log::debug!("Rewrote legacy links in {}", docname);
    }
    Ok(())
}
