use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use estimator::config::S3Config;
use estimator::embeddings::{build_cache, load_caches, EmbeddingCache, OpenAiEncoder};
use estimator::extraction::batch::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_WORKERS};
use estimator::extraction::checkpoint::build_s3_client;
use estimator::extraction::location::apply_refined_locations;
use estimator::extraction::{
    join_results, process_in_batches, read_jsonl, refine_locations, write_jsonl, BatchConfig,
    CheckpointStore, FileCheckpointStore, JobPosting, JoinedRow, S3CheckpointStore,
};
use estimator::features::{build_dataset_features, FeatureSchema};
use estimator::llm_client::{LlmClient, TextGeneration, DEFAULT_BASE_URL};
use estimator::normalize::{clean_skill_list, extract_job_function};

#[derive(Parser, Debug)]
#[command(
    name = "estimator-cli",
    about = "Offline dataset tooling for the salary estimator"
)]
struct Cli {
    #[command(flatten)]
    llm: LlmArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// Base URL of the OpenAI-compatible generation server
    #[arg(long, global = true, env = "LLM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    llm_base_url: String,

    #[arg(long, global = true, env = "LLM_API_KEY", default_value = "ollama")]
    llm_api_key: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract job details for every posting, resuming from a checkpoint
    Extract(ExtractArgs),
    /// Ask the LLM for locations the normalizer could not place
    RefineLocations(RefineArgs),
    /// Embed distinct job functions or skills into a cache file
    BuildCache(BuildCacheArgs),
    /// Assemble training features from extracted rows
    BuildFeatures(BuildFeaturesArgs),
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Postings as JSON Lines
    #[arg(long)]
    input: PathBuf,

    /// Local checkpoint file, or the object key when S3_BUCKET is set
    #[arg(long)]
    checkpoint: String,

    /// Joined rows (posting + details) as JSON Lines
    #[arg(long)]
    output: PathBuf,

    #[arg(long, env = "DECODER_MODEL", default_value = "llama3.1")]
    decoder_model: String,

    #[arg(long, env = "BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    #[arg(long, env = "MAX_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,
}

#[derive(Args, Debug)]
struct RefineArgs {
    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    output: PathBuf,

    #[arg(long, env = "DECODER_MODEL", default_value = "llama3.1")]
    decoder_model: String,

    #[arg(long, env = "MAX_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CacheKind {
    JobFunction,
    Skills,
}

#[derive(Args, Debug)]
struct BuildCacheArgs {
    /// Joined rows produced by `extract`
    #[arg(long)]
    input: PathBuf,

    #[arg(long, value_enum)]
    kind: CacheKind,

    #[arg(long)]
    output: PathBuf,

    #[arg(long, env = "ENCODER_MODEL", default_value = "all-minilm")]
    encoder_model: String,

    /// Expected vector size; the build fails if the encoder disagrees
    #[arg(long, env = "EMBEDDING_DIM")]
    embedding_dim: Option<usize>,

    #[arg(long, default_value_t = estimator::embeddings::builder::DEFAULT_ENCODE_CHUNK)]
    chunk_size: usize,
}

#[derive(Args, Debug)]
struct BuildFeaturesArgs {
    /// Joined rows produced by `extract`
    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    output: PathBuf,

    #[arg(long, env = "JOB_FUNCTION_CACHE_PATH")]
    job_function_cache: PathBuf,

    #[arg(long, env = "SKILL_CACHE_PATH")]
    skill_cache: PathBuf,

    #[arg(long, env = "EMBEDDING_DIM", default_value_t = 384)]
    embedding_dim: usize,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let llm = LlmClient::new(cli.llm.llm_base_url, cli.llm.llm_api_key)?;

    match cli.command {
        Commands::Extract(args) => extract(args, llm).await,
        Commands::RefineLocations(args) => refine(args, llm).await,
        Commands::BuildCache(args) => build_cache_file(args, llm).await,
        Commands::BuildFeatures(args) => build_features(args),
    }
}

async fn extract(args: ExtractArgs, llm: LlmClient) -> Result<()> {
    let dataset: Vec<JobPosting> = read_jsonl(&args.input)?;
    let config = BatchConfig {
        batch_size: args.batch_size,
        max_workers: args.max_workers,
        decoder_model: args.decoder_model,
    };
    let llm: Arc<dyn TextGeneration> = Arc::new(llm);

    let mut store: Box<dyn CheckpointStore> = match S3Config::from_env()? {
        Some(s3) => {
            let client = build_s3_client(&s3).await;
            Box::new(S3CheckpointStore::open(client, s3.bucket, args.checkpoint.clone()).await?)
        }
        None => Box::new(FileCheckpointStore::open(&args.checkpoint).await?),
    };

    let summary = process_in_batches(&dataset, store.as_mut(), llm, &config).await?;
    info!(
        "Extraction finished: {} resumed, {} processed in {} batch(es)",
        summary.resumed, summary.processed, summary.batches
    );

    let joined = join_results(&dataset, store.as_ref());
    write_jsonl(&args.output, &joined)?;
    info!("Wrote {} joined row(s) to '{}'", joined.len(), args.output.display());
    Ok(())
}

async fn refine(args: RefineArgs, llm: LlmClient) -> Result<()> {
    let mut rows: Vec<JoinedRow> = read_jsonl(&args.input)?;
    let mut postings: Vec<JobPosting> = rows.iter().map(|r| r.posting.clone()).collect();

    let refined = refine_locations(
        &postings,
        Arc::new(llm),
        &args.decoder_model,
        args.max_workers,
    )
    .await?;
    apply_refined_locations(&mut postings, &refined);

    for (row, posting) in rows.iter_mut().zip(postings) {
        row.posting = posting;
    }
    write_jsonl(&args.output, &rows)?;
    info!("Refined {} location(s)", refined.len());
    Ok(())
}

async fn build_cache_file(args: BuildCacheArgs, llm: LlmClient) -> Result<()> {
    let rows: Vec<JoinedRow> = read_jsonl(&args.input)?;
    let keys: Vec<String> = match args.kind {
        CacheKind::JobFunction => rows
            .iter()
            .map(|r| extract_job_function(r.posting.title.as_deref()))
            .collect(),
        CacheKind::Skills => rows
            .iter()
            .flat_map(|r| clean_skill_list(Some(r.details.skills.as_slice())))
            .collect(),
    };

    let encoder = OpenAiEncoder::new(llm, args.encoder_model);
    let cache: EmbeddingCache = build_cache(keys, &encoder, args.chunk_size).await?;

    if let Some(expected) = args.embedding_dim {
        if cache.dimension() != expected {
            bail!(
                "encoder produced {}-dimensional vectors, expected {expected}",
                cache.dimension()
            );
        }
    }

    cache
        .save(&args.output)
        .with_context(|| format!("saving {:?} cache", args.kind))?;
    Ok(())
}

fn build_features(args: BuildFeaturesArgs) -> Result<()> {
    let rows: Vec<JoinedRow> = read_jsonl(&args.input)?;
    let (job_function_cache, skill_cache) = load_caches(
        &args.job_function_cache,
        &args.skill_cache,
        args.embedding_dim,
    )?;
    let schema = FeatureSchema::new(args.embedding_dim);

    let built = build_dataset_features(&rows, &job_function_cache, &skill_cache, &schema)?;
    write_jsonl(&args.output, &built)?;
    info!(
        "Wrote {} feature row(s) with {} columns to '{}'",
        built.len(),
        schema.len(),
        args.output.display()
    );
    Ok(())
}
