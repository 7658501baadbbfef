//! Command implementations for the roster CLI.
//!
//! Handles:
//! - normalize: sheet export to records file
//! - build: records to persisted index artifact
//! - query: artifact lookup with interactive disambiguation
//! - stats: artifact summary

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use roster_embeddings::{GeminiConfig, GeminiEmbedder};
use roster_indexing::{rebuild_index, BuildConfig, BuildReport, IndexBuilder, LoggingProgressCallback};
use roster_query::{QueryConfig, QueryEngine, QueryError, Resolution};
use roster_types::{load_corpus, load_records, Settings};
use roster_vector::{ArtifactManifest, IndexStats, IndexStore};

/// Load configuration and apply the global CLI overrides.
pub fn load_settings(config_path: Option<&str>, log_level: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(level) = log_level {
        settings.log_level = level.to_string();
    }
    Ok(settings)
}

/// Install the stderr tracing subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn embedder(settings: &Settings) -> Result<GeminiEmbedder> {
    let config =
        GeminiConfig::from_settings(&settings.embedding).context("Invalid embedding settings")?;
    GeminiEmbedder::new(config).context("Failed to create embedding client")
}

/// Normalize a sheet export into a records file.
pub fn run_normalize(input: &str, output: &str) -> Result<usize> {
    let records = load_corpus(input).with_context(|| format!("Failed to load corpus {}", input))?;

    let json = serde_json::to_vec_pretty(&records)?;
    if let Some(parent) = Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output, json).with_context(|| format!("Failed to write {}", output))?;

    info!(output, records = records.len(), "Wrote normalized records");
    println!("Normalized {} records into {}", records.len(), output);
    Ok(records.len())
}

/// Embed the corpus and persist the artifact.
pub fn run_build(
    mut settings: Settings,
    corpus: Option<String>,
    normalized: bool,
    index_dir: Option<String>,
    workers: Option<usize>,
) -> Result<BuildReport> {
    if let Some(corpus) = corpus {
        settings.corpus_path = corpus;
    }
    if let Some(index_dir) = index_dir {
        settings.index_dir = index_dir;
    }
    if let Some(workers) = workers {
        settings.build.workers = workers;
    }
    settings.validate()?;

    let corpus_path = settings.expanded_corpus_path();
    let records = if normalized {
        load_records(&corpus_path)
    } else {
        load_corpus(&corpus_path)
    }
    .with_context(|| format!("Failed to load corpus {:?}", corpus_path))?;

    let builder = IndexBuilder::new(
        Arc::new(embedder(&settings)?),
        BuildConfig::from_settings(&settings.build, settings.embedding.dimension),
    );
    let index_dir = settings.expanded_index_dir();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    let report = runtime
        .block_on(rebuild_index(
            &builder,
            records,
            &index_dir,
            &LoggingProgressCallback::new(100),
        ))
        .context("Index build failed")?;

    println!(
        "Indexed {} records (dimension {}, build {}) into {:?} in {:.1}s",
        report.records_indexed,
        report.dimension,
        report.build_id,
        index_dir,
        report.elapsed.as_secs_f64()
    );
    Ok(report)
}

/// Run one query against the persisted artifact.
pub fn run_query(
    mut settings: Settings,
    index_dir: Option<String>,
    top_k: Option<usize>,
    select: Option<String>,
    json: bool,
    text: &[String],
) -> Result<()> {
    if let Some(index_dir) = index_dir {
        settings.index_dir = index_dir;
    }
    if let Some(top_k) = top_k {
        settings.query.top_k = top_k;
    }
    settings.validate()?;

    let engine = QueryEngine::open(
        Arc::new(embedder(&settings)?),
        settings.expanded_index_dir(),
        QueryConfig::from_settings(&settings.query),
    )
    .context("Failed to open index")?;

    let resolution = engine.resolve(&text.join(" "))?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        present_json(resolution, select.as_deref(), &mut out)
    } else {
        present(resolution, select.as_deref(), &mut stdin.lock(), &mut out)
    }
}

/// Read the selection from `preset`, or one line of `input` when absent.
///
/// Undecodable bytes are replaced rather than rejected, so they fail as an
/// ordinary invalid selection.
fn read_selection<R: BufRead>(preset: Option<&str>, input: &mut R) -> Result<String> {
    match preset {
        Some(selection) => Ok(selection.to_string()),
        None => {
            let mut line = Vec::new();
            input.read_until(b'\n', &mut line)?;
            Ok(String::from_utf8_lossy(&line).into_owned())
        }
    }
}

/// Print a resolution for a person at a terminal.
///
/// An invalid selection is reported and ends the interaction without error.
pub fn present<R: BufRead, W: Write>(
    resolution: Resolution,
    preset: Option<&str>,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    match resolution {
        Resolution::NoMatch => writeln!(out, "No match found")?,
        Resolution::Single { candidate } => {
            writeln!(out, "Match found:")?;
            writeln!(out, "{}", candidate.detail())?;
        }
        Resolution::Ambiguous(choice) => {
            writeln!(out, "Multiple matches found. Please confirm:")?;
            writeln!(out, "{}", choice)?;
            if preset.is_none() {
                write!(out, "Select option (1-{}): ", choice.len())?;
                out.flush()?;
            }

            let selection = read_selection(preset, input)?;
            match choice.select(&selection) {
                Ok(candidate) => {
                    writeln!(out, "Selected:")?;
                    writeln!(out, "{}", candidate.detail())?;
                }
                Err(QueryError::InvalidSelection(_)) => writeln!(out, "Invalid selection")?,
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}

/// Print a resolution as JSON. Ambiguous results are resolved first when a
/// selection is given, otherwise the candidate list is printed.
pub fn present_json<W: Write>(
    resolution: Resolution,
    preset: Option<&str>,
    out: &mut W,
) -> Result<()> {
    let value = match (resolution, preset) {
        (Resolution::Ambiguous(choice), Some(selection)) => match choice.select(selection) {
            Ok(candidate) => serde_json::to_value(Resolution::Single { candidate })?,
            Err(QueryError::InvalidSelection(input)) => serde_json::json!({
                "outcome": "invalid_selection",
                "selection": input,
            }),
            Err(e) => return Err(e.into()),
        },
        (resolution, _) => serde_json::to_value(resolution)?,
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    Ok(())
}

/// Print a summary of the artifact.
pub fn run_stats(mut settings: Settings, index_dir: Option<String>) -> Result<()> {
    if let Some(index_dir) = index_dir {
        settings.index_dir = index_dir;
    }
    let dir = settings.expanded_index_dir();

    let (store, manifest) =
        IndexStore::load(&dir).with_context(|| format!("Failed to load index at {:?}", dir))?;

    println!("{}", format_stats(&dir, &manifest, &store.stats(), &store));
    Ok(())
}

fn format_stats(dir: &Path, manifest: &ArtifactManifest, stats: &IndexStats, store: &IndexStore) -> String {
    let groups = store
        .records()
        .iter()
        .filter(|r| r.kind() == roster_types::RecordKind::Group)
        .count();
    let users = store.len() - groups;

    format!(
        "Index: {}\n\
         Build id: {}\n\
         Built at: {}\n\
         Model: {}\n\
         Dimension: {}\n\
         Records: {} ({} groups, {} users)\n\
         Vector bytes: {}",
        dir.display(),
        manifest.build_id,
        manifest.built_at.to_rfc3339(),
        manifest.model,
        stats.dimension,
        stats.vector_count,
        groups,
        users,
        stats.size_bytes
    )
}
