//! supportrag - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use supportrag::{
    bot::{ConsoleTransport, SupportBot},
    cli::{Args, Commands, Verbosity},
    config::{Config, IndexBackend, Provider},
    embedding::EmbeddingEngine,
    generation::{AnthropicGenerator, OllamaGenerator, TextGenerator},
    index::{LocalIndex, QdrantIndex, VectorIndex},
    ingest::Ingestor,
    knowledge::{DocumentEncoder, Embedder},
    rag::{AnswerOutcome, ContextBuilder, RankingEngine, RuleSet, SupportPipeline},
    triage::TriageGate,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = args.verbosity();
    init_tracing(verbosity);

    let config = Config::load(args.config.clone()).context("Failed to load configuration")?;

    match &args.command {
        Commands::Ingest { file } => {
            let embedder = load_embedder(&config)?;
            let index = open_index(&config, embedder.dimension()).await?;
            let ingestor = Ingestor::new(DocumentEncoder::new(embedder), index.clone(), config.index.batch_size)
                .with_progress(verbosity.show_progress());

            let report = ingestor.ingest_file(file).await?;
            println!(
                "{} Indexed {} records ({} skipped). Collection now holds {} documents.",
                "✓".green(),
                report.indexed,
                report.skipped,
                index.count().await?
            );
        }
        Commands::Ask { question, top_k } => {
            let pipeline = build_pipeline(&config).await?;
            let top_k = top_k.unwrap_or(config.retrieval.top_k);
            let answer = pipeline.answer_with_top_k(question, top_k).await?;

            match answer.outcome {
                AnswerOutcome::Generated => println!("{}", answer.text),
                AnswerOutcome::ConfigurationError => eprintln!("{}", answer.text.red()),
            }
        }
        Commands::Search { query, top_k } => {
            let embedder = load_embedder(&config)?;
            let index = open_index(&config, embedder.dimension()).await?;
            let engine = RankingEngine::with_config(
                DocumentEncoder::new(embedder),
                index,
                config.search_params(),
                config.rerank_config(),
            );
            let hits = engine.rank(query, top_k.unwrap_or(config.retrieval.top_k)).await?;
            print_hits(&hits);
        }
        Commands::Count => {
            let index = open_index_for_admin(&config).await?;
            println!("{}", index.count().await?);
        }
        Commands::Reset => {
            let index = open_index_for_admin(&config).await?;
            index.reset().await?;
            println!("{} Collection '{}' reset", "✓".green(), config.index.collection);
        }
        Commands::Chat => {
            let pipeline = Arc::new(build_pipeline(&config).await?);
            let triage = TriageGate::with_max_tokens(
                build_generator(&config)?,
                config.generation.triage_max_tokens,
            );
            let bot = SupportBot::new(pipeline, triage);
            let mut console = ConsoleTransport::new(config.history_path())?;
            console.run(&bot).await?;
        }
        Commands::Config => {
            show_config(&args, &config)?;
        }
    }

    Ok(())
}

fn init_tracing(verbosity: Verbosity) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let engine = EmbeddingEngine::load(&config.embedding.model_id, config.embedding.normalize)?;
    Ok(Arc::new(engine))
}

async fn open_index(config: &Config, dimension: usize) -> Result<Arc<dyn VectorIndex>> {
    let index: Arc<dyn VectorIndex> = match config.index.backend {
        IndexBackend::Local => Arc::new(LocalIndex::open(&config.index_dir(), &config.index.collection)?),
        IndexBackend::Qdrant => Arc::new(
            QdrantIndex::connect(&config.index.qdrant_url, &config.index.collection, dimension).await?,
        ),
    };
    Ok(index)
}

/// Qdrant needs the vector size to recreate a collection; the local index does not
async fn open_index_for_admin(config: &Config) -> Result<Arc<dyn VectorIndex>> {
    let dimension = match config.index.backend {
        IndexBackend::Local => 0,
        IndexBackend::Qdrant => load_embedder(config)?.dimension(),
    };
    open_index(config, dimension).await
}

fn build_generator(config: &Config) -> Result<Arc<dyn TextGenerator>> {
    let url = config.generation_url();
    let generator: Arc<dyn TextGenerator> = match config.generation.provider {
        Provider::Anthropic => {
            let key = config.generation.api_key.as_deref().unwrap_or_default();
            Arc::new(AnthropicGenerator::with_base_url(&url, key, &config.generation.model)?)
        }
        Provider::Ollama => Arc::new(OllamaGenerator::with_config(&url, &config.generation.model)?),
    };
    Ok(generator)
}

async fn build_pipeline(config: &Config) -> Result<SupportPipeline> {
    let embedder = load_embedder(config)?;
    let index = open_index(config, embedder.dimension()).await?;
    let engine = RankingEngine::with_config(
        DocumentEncoder::new(embedder),
        index,
        config.search_params(),
        config.rerank_config(),
    );
    let rules = RuleSet::load(&config.rules_path())?;

    Ok(SupportPipeline::new(
        engine,
        ContextBuilder::with_config(config.context_config()),
        rules,
        build_generator(config)?,
        config.pipeline_config(),
    ))
}

fn print_hits(hits: &[supportrag::rag::RankedHit]) {
    if hits.is_empty() {
        println!("{}", "No matching documents.".yellow());
        return;
    }

    for (i, hit) in hits.iter().enumerate() {
        let meta = &hit.candidate.metadata;
        println!(
            "{} {} {}",
            format!("#{}", i + 1).bold(),
            meta.subject_or_missing().cyan(),
            format!("({})", hit.candidate.id).bright_black()
        );
        println!(
            "   blended {:.3} | similarity {:.3} | recency {:.3} | distance {:.3}",
            hit.blended_score, hit.similarity, hit.recency_score, hit.candidate.distance
        );
        println!("   {} | {}", meta.date_or_missing(), meta.sender());
    }
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    let source = args
        .config
        .clone()
        .or_else(|| Config::default_path().filter(|p| p.exists()));
    match source {
        Some(path) => println!("{} {}", "# Loaded from".bright_black(), path.display()),
        None => println!("{}", "# Built-in defaults".bright_black()),
    }
    print!("{}", config.to_display_toml()?);
    Ok(())
}
