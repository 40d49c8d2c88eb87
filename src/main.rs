use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;

use driver_docs::{
    versions, DocsBuilder, DocsConfig, LinkRewriter, StubGenerator, VersionSelector,
};

#[derive(Parser)]
#[command(name = "driver-docs")]
#[command(about = "Documentation build tooling for the Scylla C/C++ driver")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full build pass over a source tree
    Build {
        /// Source directory
        #[arg(short, long, default_value = "docs/source")]
        source: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "docs/_build/dirhtml")]
        output: PathBuf,

        /// Directory relative configuration paths resolve against (defaults to the source directory)
        #[arg(long)]
        conf_dir: Option<PathBuf>,
    },
    /// Generate API reference stubs from Doxygen XML
    Stubs {
        /// Doxygen XML directory
        #[arg(short, long)]
        xml_dir: PathBuf,

        /// Directory the stub pages are written to; must exist
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Doxygen project named in the stubs (defaults to the configured default project)
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Rewrite legacy documentation links in source files
    Rewrite {
        /// Files to rewrite
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write results back instead of printing them
        #[arg(short, long)]
        in_place: bool,
    },
    /// List the versions that would be built
    Versions {
        /// Git repository to read refs from
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config {
        #[arg(short, long, value_enum, default_value_t = ConfigFormat::Yaml)]
        format: ConfigFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ConfigFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = match &cli.config {
        Some(path) => DocsConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => DocsConfig::default(),
    };

    match cli.command {
        Commands::Build {
            source,
            output,
            conf_dir,
        } => {
            let mut builder = DocsBuilder::new(config, source, output)?;
            if let Some(conf_dir) = conf_dir {
                builder = builder.with_conf_dir(conf_dir);
            }
            let stats = builder.build()?;

            println!("Build completed successfully!");
            println!("Pages processed: {}", stats.pages_processed);
            println!("Pages with rewritten links: {}", stats.pages_rewritten);
            println!("API reference stubs: {}", stats.stubs_written);
            println!("Redirect pages: {}", stats.redirects_written);
            if let Some(sitemap) = &stats.sitemap {
                println!("Sitemap: {}", sitemap.display());
            }
            println!("Build time: {:.2}s", stats.build_time.as_secs_f64());
        }
        Commands::Stubs {
            xml_dir,
            out_dir,
            project,
        } => {
            let project = project.unwrap_or_else(|| config.breathe.default_project.clone());
            let generated = StubGenerator::new(project)
                .generate(&xml_dir, &out_dir)
                .with_context(|| format!("Failed to generate stubs from {}", xml_dir.display()))?;
            for path in &generated.written {
                println!("{}", path.display());
            }
            info!("Generated {} stubs", generated.len());
        }
        Commands::Rewrite { files, in_place } => {
            let rewriter = LinkRewriter::new(config.replacements())?;
            for file in files {
                let mut text = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let changed = rewriter.rewrite_in_place(&mut text);
                if in_place {
                    if changed {
                        std::fs::write(&file, &text)
                            .with_context(|| format!("Failed to write {}", file.display()))?;
                        info!("Rewrote {}", file.display());
                    }
                } else {
                    print!("{}", text);
                }
            }
        }
        Commands::Versions { repo, json } => {
            let refs = versions::list_git_refs(&repo)?;
            let selected = VersionSelector::from_config(&config)?.select(&refs);
            if json {
                println!("{}", serde_json::to_string_pretty(&selected)?);
            } else {
                for version in &selected {
                    println!(
                        "{:<20} {:<8} {:<12} {}",
                        version.name,
                        format!("{:?}", version.kind).to_lowercase(),
                        format!("{:?}", version.status).to_lowercase(),
                        version.output_dir
                    );
                }
            }
        }
        Commands::Config { format } => {
            let rendered = match format {
                ConfigFormat::Yaml => serde_yaml::to_string(&config)?,
                ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
            };
            println!("{}", rendered);
        }
    }

    Ok(())
}
