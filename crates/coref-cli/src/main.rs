//! Coref CLI - Command-line interface
//!
//! Usage:
//!   corefgraph resolve <input.json>... [--config coref.toml] [--output DIR] [--diagnostics]
//!   corefgraph rules
//!   corefgraph check [--config coref.toml]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::{error, info, warn};

use coref_core::{CorefConfig, DocumentGraph, Language, LoggingConfig, PipelineConfig, RuleKind, Span};
use coref_extractor::{Diagnostics, DiagnosticsSummary};
use coref_graph::DocumentInput;
use coref_multisieve::Registry;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::with_defaults);

#[derive(Parser)]
#[command(name = "corefgraph")]
#[command(about = "Multi-sieve coreference resolution")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve coreference in parsed JSON documents
    Resolve {
        /// Input documents
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Write one result file per document into this directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Collect diagnostics against gold mentions
        #[arg(long)]
        diagnostics: bool,
    },
    /// List the registered rule names
    Rules,
    /// Validate the pipeline configuration
    Check,
}

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Serialize)]
struct MentionOutput {
    id: String,
    span: Span,
    form: String,
}

#[derive(Debug, Serialize)]
struct EntityOutput {
    id: String,
    mentions: Vec<MentionOutput>,
}

#[derive(Debug, Serialize)]
struct DocumentOutput {
    id: String,
    entities: Vec<EntityOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<Diagnostics>,
}

// ============================================================================
// Commands
// ============================================================================

fn load_config(path: Option<&Path>) -> anyhow::Result<CorefConfig> {
    let config = match path {
        Some(path) => CorefConfig::from_file(path)?.with_env_override()?,
        None => CorefConfig::from_env()?,
    };
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_file(path: &Path, config: &PipelineConfig, language: Arc<Language>) -> anyhow::Result<DocumentOutput> {
    let input = DocumentInput::from_file(path).with_context(|| format!("Failed to load {}", path.display()))?;
    let mut document = input
        .into_document()
        .with_context(|| format!("Invalid document {}", path.display()))?;

    let mut processor = REGISTRY.processor(config, language)?;
    let entities = processor.resolve_document(&mut document);

    let entities = entities
        .into_iter()
        .map(|entity| EntityOutput {
            id: entity.id,
            mentions: entity
                .mentions
                .into_iter()
                .map(|m| {
                    let node = document.node(m);
                    MentionOutput {
                        id: node.label.clone(),
                        span: node.span,
                        form: node.form.clone(),
                    }
                })
                .collect(),
        })
        .collect();

    Ok(DocumentOutput {
        id: document.id.clone(),
        entities,
        diagnostics: processor.take_diagnostics(),
    })
}

/// Result file name, qualified by the input stem when the id was already written
fn output_name(id: &str, source: &Path, written: &mut HashSet<String>) -> String {
    let name = format!("{id}.coref.json");
    if written.insert(name.clone()) {
        return name;
    }
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let qualified = format!("{id}.{stem}.coref.json");
    warn!(document = %id, source = %source.display(), file = %qualified, "Duplicate document id");
    written.insert(qualified.clone());
    qualified
}

fn write_output(
    output: &DocumentOutput,
    source: &Path,
    dir: Option<&Path>,
    written: &mut HashSet<String>,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(output)?;
    match dir {
        Some(dir) => {
            let path = dir.join(output_name(&output.id, source, written));
            std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!(document = %output.id, path = %path.display(), "Result written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn resolve(
    config: CorefConfig,
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    diagnostics: bool,
) -> anyhow::Result<()> {
    let mut pipeline = config.pipeline;
    pipeline.meta_info |= diagnostics;
    REGISTRY.validate(&pipeline)?;
    let language = Arc::new(Language::by_code(&config.language)?);
    if let Some(dir) = &output {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    info!(documents = inputs.len(), language = %language.code, "Resolving documents");
    let tasks = inputs.into_iter().map(|path| {
        let pipeline = pipeline.clone();
        let language = language.clone();
        tokio::task::spawn_blocking(move || {
            let result = resolve_file(&path, &pipeline, language);
            (path, result)
        })
    });

    let mut summary = DiagnosticsSummary::default();
    let mut failures = 0;
    let mut written = HashSet::new();
    for joined in futures::future::join_all(tasks).await {
        let (path, result) = joined?;
        match result {
            Ok(document) => {
                if let Some(d) = &document.diagnostics {
                    summary.add(d);
                }
                write_output(&document, &path, output.as_deref(), &mut written)?;
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Document failed");
                failures += 1;
            }
        }
    }

    if pipeline.meta_info {
        eprintln!("{}", summary.report());
    }
    if failures > 0 {
        anyhow::bail!("{failures} document(s) failed");
    }
    Ok(())
}

fn list_rules() {
    for kind in [
        RuleKind::Catcher,
        RuleKind::Filter,
        RuleKind::Strategy,
        RuleKind::Sieve,
        RuleKind::Purge,
    ] {
        println!("{kind}:");
        for name in REGISTRY.names(kind) {
            println!("  {name}");
        }
    }
}

fn check(config: &CorefConfig) -> anyhow::Result<()> {
    REGISTRY.validate(&config.pipeline)?;
    Language::by_code(&config.language)?;
    println!("Configuration OK");
    println!("  sieves:   {}", config.pipeline.sieves.join(", "));
    println!("  catchers: {}", config.pipeline.mention_catchers.join(", "));
    println!("  filters:  {}", config.pipeline.mention_filters.join(", "));
    println!("  purges:   {}", config.pipeline.mention_purges.join(", "));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Resolve {
            inputs,
            output,
            diagnostics,
        } => resolve(config, inputs, output, diagnostics).await?,
        Commands::Rules => list_rules(),
        Commands::Check => check(&config)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_name_disambiguates_duplicate_ids() {
        let mut written = HashSet::new();
        assert_eq!(output_name("doc", Path::new("in/a.json"), &mut written), "doc.coref.json");
        assert_eq!(output_name("doc", Path::new("in/b.json"), &mut written), "doc.b.coref.json");
        assert_eq!(output_name("other", Path::new("in/c.json"), &mut written), "other.coref.json");
    }
}
