use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use quarry_core::Config;
use quarry_core::bootstrap::{create_service, health_check, load_config, resolve_config_path};
use quarry_index::{IngestReport, Lang, RetrievalService, detect_language, format_results};
use quarry_llm::EmbeddingProvider;
use tokio::io::AsyncBufReadExt;

/// Extract functions, calls and imports from Python files and search them by
/// embedding similarity.
#[derive(Parser)]
#[command(name = "quarry", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Falls back to `QUARRY_CONFIG`, then
    /// `config/default.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest files into one in-memory index and answer queries against it.
    ///
    /// Without `--query`, queries are read from stdin one per line until EOF.
    Search {
        /// Python source files, ingested in order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Query text. Repeat for several queries.
        #[arg(short, long = "query")]
        queries: Vec<String>,

        /// Results per query (default: `index.top_k`).
        #[arg(short)]
        k: Option<usize>,

        /// Print reports and results as JSON lines.
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical text and extracted artifacts of one file.
    Inspect {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber(&resolve_config_path(cli.config.as_deref()));
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Search {
            files,
            queries,
            k,
            json,
        } => {
            let k = k.unwrap_or(config.index.top_k);
            if k == 0 {
                bail!("-k must be at least 1");
            }
            run_search(&config, &files, &queries, k, json).await
        }
        Command::Inspect { file, json } => run_inspect(&config, &file, json).await,
    }
}

fn init_subscriber(config_path: &Path) {
    let default_level = Config::load(config_path)
        .map(|c| c.observability.log_level)
        .unwrap_or_else(|_| "info".into());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_search(
    config: &Config,
    files: &[PathBuf],
    queries: &[String],
    k: usize,
    json: bool,
) -> anyhow::Result<()> {
    let service = create_service(config)?;
    health_check(
        service.embedder().provider(),
        Duration::from_secs(config.embedding.timeout_secs),
    )
    .await;

    let mut out = std::io::stdout().lock();
    let ingested = ingest_files(&service, files, json, &mut out).await?;
    if ingested == 0 {
        bail!("none of the {} file(s) could be ingested", files.len());
    }

    if !queries.is_empty() {
        for query in queries {
            answer(&service, query, k, json, &mut out).await?;
        }
        return Ok(());
    }

    let interactive = std::io::stdin().is_terminal();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            eprint!("query> ");
        }
        let Some(line) = lines.next_line().await.context("failed to read query")? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        answer(&service, query, k, json, &mut out).await?;
    }
    Ok(())
}

/// Ingest every file, reporting and skipping the ones that fail. Returns the
/// number ingested.
async fn ingest_files<P: EmbeddingProvider>(
    service: &RetrievalService<P>,
    files: &[PathBuf],
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let mut ingested = 0;
    for file in files {
        if detect_language(file) != Some(Lang::Python) {
            tracing::warn!("{} has no Python extension, parsing it as Python", file.display());
        }
        match service.ingest(file).await {
            Ok(report) => {
                ingested += 1;
                write_report(&report, json, out)?;
            }
            Err(e) => {
                tracing::error!("skipping {}: {e}", file.display());
                if json {
                    let line = serde_json::json!({
                        "file": file.display().to_string(),
                        "error": e.to_string(),
                    });
                    writeln!(out, "{line}")?;
                }
            }
        }
    }
    Ok(ingested)
}

fn write_report(report: &IngestReport, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    if json {
        writeln!(out, "{}", serde_json::json!({ "report": report }))?;
        return Ok(());
    }
    writeln!(
        out,
        "ingested {}: {} artifact(s), {} record(s) in {} ms",
        report.origin, report.artifact_count, report.embedding_count, report.duration_ms
    )?;
    for warning in &report.warnings {
        writeln!(out, "  skipped {}: {}", warning.label, warning.message)?;
    }
    Ok(())
}

/// A failed query is reported and the session continues.
async fn answer<P: EmbeddingProvider>(
    service: &RetrievalService<P>,
    query: &str,
    k: usize,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let results = match service.query(query, k).await {
        Ok(results) => results,
        Err(e) => {
            tracing::error!("{e}");
            if json {
                let line = serde_json::json!({ "query": query, "error": e.to_string() });
                writeln!(out, "{line}")?;
            }
            return Ok(());
        }
    };

    if json {
        let line = serde_json::json!({ "query": query, "results": results });
        writeln!(out, "{line}")?;
    } else {
        writeln!(out, "query: {query}")?;
        write!(out, "{}", format_results(&results))?;
    }
    Ok(())
}

async fn run_inspect(config: &Config, file: &Path, json: bool) -> anyhow::Result<()> {
    let source = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let service = create_service(config)?;
    let processed = service
        .inspect(&source)
        .with_context(|| format!("failed to process {}", file.display()))?;

    let mut out = std::io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&processed)?)?;
        return Ok(());
    }

    let artifacts = &processed.artifacts;
    writeln!(out, "== canonical text ==\n{}\n", processed.canonical)?;
    writeln!(
        out,
        "== function definitions ({}) ==",
        artifacts.function_definitions.len()
    )?;
    for def in &artifacts.function_definitions {
        writeln!(out, "- {}\n{}", def.name, indent(&def.source_text))?;
    }
    writeln!(out, "\n== function calls ({}) ==", artifacts.function_calls.len())?;
    for call in &artifacts.function_calls {
        writeln!(out, "- {}: {}", call.callee_name, call.source_text)?;
    }
    writeln!(out, "\n== imports ({}) ==", artifacts.imports.len())?;
    for import in &artifacts.imports {
        writeln!(out, "- {}", import.source_text)?;
    }
    Ok(())
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("    {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}
