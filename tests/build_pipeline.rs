//! Integration tests for a full build pass over a documentation tree.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use driver_docs::{DocsBuilder, DocsConfig};

/// Lay out `<root>/docs/source` and `<root>/doxygen/xml` like the driver repository.
fn create_project(root: &Path) {
    let source = root.join("docs/source");
    let xml = root.join("doxygen/xml");
    fs::create_dir_all(source.join("api")).unwrap();
    fs::create_dir_all(source.join("topics/ssl")).unwrap();
    fs::create_dir_all(source.join("_utils")).unwrap();
    fs::create_dir_all(source.join("_build/html")).unwrap();
    fs::create_dir_all(&xml).unwrap();

    for name in [
        "struct_cass_uuid.xml",
        "struct_cass_uuid__.xml",
        "struct_cass_inet.xml",
        "cassandra_8h.xml",
    ] {
        fs::write(xml.join(name), "<doxygen/>").unwrap();
    }

    fs::write(
        source.join("contents.rst"),
        "Contents\n========\n\n.. toctree::\n\n   topics/ssl/README\n",
    )
    .unwrap();
    fs::write(
        source.join("topics/ssl/README.md"),
        "# SSL\n\nSee [the API](http://datastax.github.io/cpp-driver/api/cassandra.h/#cass-ssl).\n",
    )
    .unwrap();
    fs::write(
        source.join("topics/README.md"),
        "# Topics\n\nOld home: http://docs.datastax.com/en/developer/cpp-driver/latest/topics/\n",
    )
    .unwrap();
    fs::write(source.join("_build/html/stale.rst"), "stale").unwrap();
    fs::write(source.join("conf.py"), "# not a page").unwrap();
    fs::write(
        source.join("_utils/redirections.yaml"),
        "/stable/topics/old.html: /stable/topics/README.html\n",
    )
    .unwrap();
}

#[test]
fn test_full_build() {
    let temp_dir = TempDir::new().unwrap();
    create_project(temp_dir.path());
    let source = temp_dir.path().join("docs/source");
    let output = temp_dir.path().join("docs/_build/dirhtml");

    let builder = DocsBuilder::new(DocsConfig::default(), source.clone(), output.clone()).unwrap();
    let stats = builder.build().unwrap();

    // Stubs land in the source tree, before pages are discovered
    let stub = fs::read_to_string(source.join("api/struct.CassUuid.rst")).unwrap();
    assert_eq!(
        stub,
        "CassUuid\n========\n\n.. doxygenstruct:: CassUuid \n  :project: API"
    );
    assert!(source.join("api/struct.CassInet.rst").exists());
    assert!(!source.join("api/struct.CassUuid__.rst").exists());

    // contents, two Markdown topics and two stubs; _build and conf.py are skipped
    assert_eq!(stats.pages_processed, 5);
    assert_eq!(stats.pages_rewritten, 2);
    assert_eq!(stats.stubs_written, 2);
    assert_eq!(stats.redirects_written, 1);

    let ssl = fs::read_to_string(output.join("_sources/topics/ssl/README.md")).unwrap();
    assert!(ssl.contains("https://cpp-driver.docs.scylladb.com/master/api#cass-ssl"));
    assert!(!ssl.contains("datastax"));

    let topics = fs::read_to_string(output.join("_sources/topics/README.md")).unwrap();
    assert!(topics.contains("https://cpp-driver.docs.scylladb.com/master/topics/"));

    // The source itself is left alone
    let original = fs::read_to_string(source.join("topics/ssl/README.md")).unwrap();
    assert!(original.contains("datastax.github.io"));

    let sitemap = fs::read_to_string(output.join("sitemap.xml")).unwrap();
    assert!(sitemap.contains(
        "<loc>https://cpp-driver.docs.scylladb.com/stable/api/struct.CassUuid.html</loc>"
    ));
    assert!(sitemap.contains("/stable/topics/ssl/README.html"));
    assert!(!sitemap.contains("stale"));

    assert!(output.join("stable/topics/old.html").exists());
    assert!(output.join("404.html").exists());
}

#[test]
fn test_build_is_repeatable() {
    let temp_dir = TempDir::new().unwrap();
    create_project(temp_dir.path());
    let source = temp_dir.path().join("docs/source");
    let output = temp_dir.path().join("docs/_build/dirhtml");

    let builder = DocsBuilder::new(DocsConfig::default(), source.clone(), output).unwrap();
    let first = builder.build().unwrap();
    let stub_before = fs::read_to_string(source.join("api/struct.CassUuid.rst")).unwrap();

    let second = builder.build().unwrap();
    let stub_after = fs::read_to_string(source.join("api/struct.CassUuid.rst")).unwrap();

    assert_eq!(first.pages_processed, second.pages_processed);
    assert_eq!(first.stubs_written, second.stubs_written);
    assert_eq!(stub_before, stub_after);
}

#[test]
fn test_build_fails_without_api_directory() {
    let temp_dir = TempDir::new().unwrap();
    create_project(temp_dir.path());
    let source = temp_dir.path().join("docs/source");
    fs::remove_dir_all(source.join("api")).unwrap();

    let builder = DocsBuilder::new(
        DocsConfig::default(),
        source,
        temp_dir.path().join("out"),
    )
    .unwrap();
    let err = builder.build().unwrap_err();
    assert!(format!("{:#}", err).contains("builder-inited"));
}

#[test]
fn test_custom_replacements_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    create_project(temp_dir.path());
    let source = temp_dir.path().join("docs/source");
    let output = temp_dir.path().join("out");

    let config_path = temp_dir.path().join("docs.yaml");
    fs::write(
        &config_path,
        r#"
replacements:
  - pattern: "http://docs\\.datastax\\.com/en/developer/cpp-driver/latest"
    replacement: "https://example.com/driver"
"#,
    )
    .unwrap();
    let config = DocsConfig::load(&config_path).unwrap();

    let stats = DocsBuilder::new(config, source, output.clone())
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(stats.pages_rewritten, 1);

    let topics = fs::read_to_string(output.join("_sources/topics/README.md")).unwrap();
    assert!(topics.contains("https://example.com/driver/topics/"));
    let ssl = fs::read_to_string(output.join("_sources/topics/ssl/README.md")).unwrap();
    assert!(ssl.contains("http://datastax.github.io/cpp-driver/api/cassandra.h/"));
}

#[test]
fn test_sitemap_uses_latest_version() {
    let temp_dir = TempDir::new().unwrap();
    create_project(temp_dir.path());
    let source = temp_dir.path().join("docs/source");
    let output = temp_dir.path().join("out");

    let config = DocsConfig {
        sitemap_url_scheme: "{version}{link}".to_string(),
        ..DocsConfig::default()
    };
    DocsBuilder::new(config, source, output.clone())
        .unwrap()
        .build()
        .unwrap();

    let sitemap = fs::read_to_string(output.join("sitemap.xml")).unwrap();
    assert!(sitemap
        .contains("<loc>https://cpp-driver.docs.scylladb.com/master/contents.html</loc>"));
}
