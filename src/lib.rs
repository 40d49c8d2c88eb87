//! Driver Docs
//!
//! Documentation build configuration and hooks for the Scylla C/C++ driver:
//! API reference stubs from Doxygen XML, legacy link rewriting, version
//! selection, sitemap, redirects and the 404 page.

pub mod app;
pub mod builder;
pub mod config;
pub mod doxygen;
pub mod error;
pub mod links;
pub mod matching;
pub mod notfound;
pub mod redirects;
pub mod sitemap;
pub mod versions;

pub use app::{setup, BuildContext, DocsApp, Event};
pub use builder::{BuildStats, DocsBuilder};
pub use config::{DocsConfig, SourceFormat};
pub use doxygen::{derive_type_name, generate_doxygen, render_stub, GeneratedStubs, StubGenerator};
pub use error::{DocsError, Result};
pub use links::{default_replacements, replace_relative_links, LinkRewriter, ReplacementRule};
pub use matching::{SourceFile, SourceMatcher};
pub use notfound::NotFoundPage;
pub use sitemap::SitemapGenerator;
pub use versions::{GitRef, SelectedVersion, VersionSelector, VersionStatus};
