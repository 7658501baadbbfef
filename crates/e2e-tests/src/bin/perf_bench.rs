use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use roster_embeddings::MockEmbedder;
use roster_indexing::{BuildConfig, IndexBuilder};
use roster_query::{QueryConfig, QueryEngine};
use roster_types::{GroupProfile, Profile, Record, UserProfile};

const SMALL_RECORD_COUNT: usize = 1_000;
const MEDIUM_RECORD_COUNT: usize = 10_000;
const DEFAULT_ITERATIONS: usize = 3;
const QUERIES_PER_ITERATION: usize = 200;
const DIMENSION: usize = 768;

#[derive(Parser, Debug)]
#[command(name = "perf_bench", about = "Roster build and query benchmark harness")]
struct Args {
    #[arg(long, value_enum, default_value = "small")]
    tier: DatasetTier,
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,
    #[arg(long, default_value_t = 4)]
    workers: usize,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum DatasetTier {
    Small,
    Medium,
}

impl DatasetTier {
    fn record_count(&self) -> usize {
        match self {
            DatasetTier::Small => SMALL_RECORD_COUNT,
            DatasetTier::Medium => MEDIUM_RECORD_COUNT,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StepMetrics {
    p50_ms: f64,
    p90_ms: f64,
    p99_ms: f64,
    samples: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct BenchmarkOutput {
    tier: DatasetTier,
    records: usize,
    dimension: usize,
    workers: usize,
    iterations: usize,
    generated_at: String,
    steps: BTreeMap<String, StepMetrics>,
}

fn synthetic_records(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            if i % 4 == 0 {
                let name = format!("office {}", i);
                Record::new(
                    format!("group_{}", i),
                    format!("Group Name: Office {}. Description: synthetic group.", i),
                    Profile::Group(GroupProfile {
                        group_id: i.to_string(),
                        name,
                        level: "District".to_string(),
                        description: "synthetic group".to_string(),
                        alternate_names: vec![],
                    }),
                )
            } else {
                Record::new(
                    format!("user_{}", i),
                    format!("User Name: Person {}. Designation: Clerk.", i),
                    Profile::User(UserProfile {
                        user_id: i.to_string(),
                        name: format!("person {}", i),
                        designation: "Clerk".to_string(),
                        hierarchy: "Block".to_string(),
                        level: "5".to_string(),
                    }),
                )
            }
        })
        .collect()
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

fn metrics(mut samples: Vec<f64>) -> StepMetrics {
    samples.sort_by(|a, b| a.total_cmp(b));
    StepMetrics {
        p50_ms: percentile(&samples, 50.0),
        p90_ms: percentile(&samples, 90.0),
        p99_ms: percentile(&samples, 99.0),
        samples: samples.len(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let records = synthetic_records(args.tier.record_count());
    let embedder = Arc::new(MockEmbedder::new(DIMENSION));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let mut build_samples = Vec::new();
    let mut query_samples = Vec::new();
    let mut rng = StdRng::seed_from_u64(42);

    for iteration in 0..args.iterations {
        let builder = IndexBuilder::new(
            Arc::clone(&embedder),
            BuildConfig::new(DIMENSION).with_workers(args.workers),
        );

        let start = Instant::now();
        let store = runtime.block_on(builder.build(records.clone()))?;
        build_samples.push(start.elapsed().as_secs_f64() * 1000.0);

        let engine = QueryEngine::new(Arc::clone(&embedder), Arc::new(store), QueryConfig::default());
        for _ in 0..QUERIES_PER_ITERATION {
            let target = &records[rng.random_range(0..records.len())];
            let start = Instant::now();
            engine.resolve(&target.content)?;
            query_samples.push(start.elapsed().as_secs_f64() * 1000.0);
        }

        eprintln!("iteration {} done", iteration + 1);
    }

    let mut steps = BTreeMap::new();
    steps.insert("build".to_string(), metrics(build_samples));
    steps.insert("query".to_string(), metrics(query_samples));

    let output = BenchmarkOutput {
        tier: args.tier,
        records: records.len(),
        dimension: DIMENSION,
        workers: args.workers,
        iterations: args.iterations,
        generated_at: Utc::now().to_rfc3339(),
        steps,
    };

    let json = serde_json::to_string_pretty(&output)?;
    match args.out {
        Some(path) => fs::write(path, json)?,
        None => println!("{}", json),
    }
    Ok(())
}
