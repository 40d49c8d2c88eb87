//! API reference stubs generated from Doxygen XML output.
//!
//! Doxygen writes one `struct_<name>.xml` descriptor per C struct. For each of
//! them a small reStructuredText page is written whose only content is a
//! `doxygenstruct` directive; the directive is expanded when the page is built.

use indexmap::IndexMap;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::app::BuildContext;
use crate::error::{DocsError, Result};

/// Filenames must contain this to be considered.
pub const STRUCT_MARKER: &str = "struct";
/// Filenames containing this are skipped. Doxygen uses it for member and
/// nested-type descriptors.
pub const EXCLUSION_MARKER: &str = "__";
const STRUCT_PREFIX: &str = "struct_";
const XML_SUFFIX: &str = ".xml";

/// Whether `file_name` is a descriptor a stub page is generated for.
pub fn is_struct_descriptor(file_name: &str) -> bool {
    file_name.contains(STRUCT_MARKER) && !file_name.contains(EXCLUSION_MARKER)
}

/// Turn a descriptor filename into the type name it documents.
///
/// `struct_cass_uuid.xml` becomes `CassUuid`. Applying this to its own
/// output returns the output unchanged.
pub fn derive_type_name(file_name: &str) -> String {
    let words = file_name
        .replace(STRUCT_PREFIX, "")
        .replace('_', " ")
        .replace(XML_SUFFIX, "");
    title_case(&words).replace(' ', "")
}

/// Uppercase every letter that does not follow another letter.
fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut after_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() && !after_letter {
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
        after_letter = c.is_alphabetic();
    }
    result
}

/// Page content for one struct.
pub fn render_stub(type_name: &str, project: &str) -> String {
    format!(
        "{name}\n{underline}\n\n.. doxygenstruct:: {name} \n  :project: {project}",
        name = type_name,
        underline = "=".repeat(type_name.chars().count()),
        project = project,
    )
}

/// Output filename for a struct page.
pub fn stub_file_name(type_name: &str) -> String {
    format!("struct.{}.rst", type_name)
}

/// Result of one generation pass.
#[derive(Debug, Clone, Default)]
pub struct GeneratedStubs {
    /// Written files, one per distinct type name
    pub written: Vec<PathBuf>,
    /// Type names that more than one descriptor mapped to, with those descriptors
    pub collisions: Vec<(String, Vec<String>)>,
}

impl GeneratedStubs {
    pub fn len(&self) -> usize {
        self.written.len()
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }
}

pub struct StubGenerator {
    project: String,
}

impl StubGenerator {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
        }
    }

    /// Type names found in `xml_dir`, each with the descriptors it came from.
    ///
    /// Directory entries are visited in name order.
    pub fn scan(&self, xml_dir: &Path) -> Result<IndexMap<String, Vec<String>>> {
        let mut file_names = Vec::new();
        for entry in std::fs::read_dir(xml_dir).map_err(|e| DocsError::io(xml_dir, e))? {
            let entry = entry.map_err(|e| DocsError::io(xml_dir, e))?;
            match entry.file_name().into_string() {
                Ok(name) => file_names.push(name),
                Err(name) => warn!("Skipping non UTF-8 filename {:?}", name),
            }
        }
        file_names.sort();

        let mut structs: IndexMap<String, Vec<String>> = IndexMap::new();
        for file_name in file_names {
            if !is_struct_descriptor(&file_name) {
                continue;
            }
            structs
                .entry(derive_type_name(&file_name))
                .or_default()
                .push(file_name);
        }
        Ok(structs)
    }

    /// Write one stub per struct found in `xml_dir` into `out_dir`.
    ///
    /// `out_dir` must exist.
    pub fn generate(&self, xml_dir: &Path, out_dir: &Path) -> Result<GeneratedStubs> {
        let structs = self.scan(xml_dir)?;
        let mut generated = GeneratedStubs::default();

        for (type_name, sources) in structs {
            if sources.len() > 1 {
                warn!(
                    "Descriptors {} all map to struct '{}'; writing it once",
                    sources.join(", "),
                    type_name
                );
                generated.collisions.push((type_name.clone(), sources));
            }

            let path = out_dir.join(stub_file_name(&type_name));
            std::fs::write(&path, render_stub(&type_name, &self.project))
                .map_err(|e| DocsError::io(&path, e))?;
            debug!("Wrote {}", path.display());
            generated.written.push(path);
        }

        Ok(generated)
    }
}

/// `builder-inited` hook: generate the API reference pages under `<srcdir>/api`.
pub fn generate_doxygen(ctx: &BuildContext) -> Result<GeneratedStubs> {
    let xml_dir = ctx.config.doxygen_xml_dir(&ctx.conf_dir)?;
    let out_dir = ctx.source_dir.join("api");

    let generator = StubGenerator::new(ctx.config.breathe.default_project.as_str());
    let generated = generator.generate(&xml_dir, &out_dir)?;
    info!(
        "Generated {} API reference stubs in {}",
        generated.len(),
        out_dir.display()
    );
    Ok(generated)
}
