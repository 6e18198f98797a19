//! `rag-router` command line.
//!
//! Wires the adapters from configuration and runs one operation: list the
//! tool schemas, answer a query, or evaluate routing accuracy.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use secrecy::ExposeSecret;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use rag_router::adapters::ai::{
    AnthropicConfig, AnthropicProvider, FailoverAIProvider, OpenAIConfig, OpenAIProvider,
    TracingEventCallback,
};
use rag_router::adapters::embeddings::{HashingEmbedder, OpenAIEmbedder, OpenAIEmbedderConfig};
use rag_router::adapters::example_store::{
    load_evaluation_cases, load_seed_examples, seed_store, InMemoryExampleStore,
};
use rag_router::adapters::tools::{corpus_tools, Corpus};
use rag_router::application::{
    AskQueryCommand, EvaluateRouterCommand, InvocationDispatcher, QueryPipeline, QueryRouter,
    RouterEvaluator, Synthesizer, ToolRegistry,
};
use rag_router::config::{AiConfig, AiProvider, AppConfig, EmbeddingBackend};
use rag_router::ports::{AIProvider, Embedder, ExampleStore};
use rag_router::telemetry;

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "rag-router", version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON); environment variables win
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Corpus file backing the bundled tools
    #[arg(long, global = true, default_value = "data/corpus.yaml")]
    corpus: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every tool's parameter schema
    Tools {
        #[arg(long, value_enum, default_value_t = SchemaFormat::JsonSchema)]
        format: SchemaFormat,
    },
    /// Answer one query
    Ask { query: String },
    /// Run evaluation cases and print the accuracy report
    Eval { cases: PathBuf },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemaFormat {
    JsonSchema,
    Openai,
    Anthropic,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(cli.config.as_deref())?;
    telemetry::init(&config.logging)?;

    let corpus = Arc::new(Corpus::load(&cli.corpus).await?);
    let registry = ToolRegistry::with_tools(corpus_tools(corpus))?;

    match cli.command {
        Command::Tools { format } => {
            config.validate_offline()?;
            print_tools(&registry, format)
        }
        Command::Ask { query } => {
            config.validate()?;
            ask(&config, registry, query).await
        }
        Command::Eval { cases } => {
            config.validate()?;
            eval(&config, registry, &cases).await
        }
    }
}

fn print_tools(registry: &ToolRegistry, format: SchemaFormat) -> Result<(), BoxError> {
    let tools: Vec<_> = registry
        .definitions()
        .into_iter()
        .map(|d| match format {
            SchemaFormat::JsonSchema => json!({
                "name": d.name(),
                "description": d.description(),
                "usage_notes": d.usage_notes(),
                "version": d.version(),
                "specificity": d.specificity(),
                "exclusive_group": d.exclusive_group(),
                "parameters": d.parameters_json_schema(),
            }),
            SchemaFormat::Openai => d.to_openai_format(),
            SchemaFormat::Anthropic => d.to_anthropic_format(),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&tools)?);
    Ok(())
}

async fn ask(config: &AppConfig, registry: ToolRegistry, query: String) -> Result<(), BoxError> {
    let ai = build_ai(&config.ai)?;
    let store = build_store(config).await?;

    let pipeline = QueryPipeline::new(
        Arc::new(QueryRouter::new(ai.clone(), store, config.router.settings())),
        Arc::new(InvocationDispatcher::new(registry, config.dispatch.settings())),
        config.aggregation.aggregator(),
        Arc::new(Synthesizer::new(ai, config.synthesis.settings())),
    );

    // Ctrl-C abandons in-flight tools instead of killing the process mid-write.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let result = pipeline
        .handle_cancellable(AskQueryCommand::new(query), &cancel)
        .await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn eval(config: &AppConfig, registry: ToolRegistry, cases: &Path) -> Result<(), BoxError> {
    let ai = build_ai(&config.ai)?;
    let store = build_store(config).await?;
    let cases = load_evaluation_cases(cases).await?;
    info!(cases = cases.len(), "Loaded evaluation cases");

    let router = QueryRouter::new(ai, store.clone(), config.router.settings());
    let evaluator = RouterEvaluator::new(Arc::new(router), store, registry);
    let report = evaluator.handle(EvaluateRouterCommand { cases }).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn build_ai(config: &AiConfig) -> Result<Arc<dyn AIProvider>, BoxError> {
    let primary = build_provider(config, config.primary_provider)?;
    let mut provider = FailoverAIProvider::new(primary)
        .with_event_callback(Arc::new(TracingEventCallback));
    if let Some(fallback) = config.fallback_provider {
        provider = provider.with_fallback(build_provider(config, fallback)?);
    }
    Ok(Arc::new(provider))
}

fn build_provider(config: &AiConfig, which: AiProvider) -> Result<Arc<dyn AIProvider>, BoxError> {
    let key = config
        .api_key(which)
        .ok_or("missing API key for configured provider")?
        .expose_secret()
        .clone();

    Ok(match which {
        AiProvider::OpenAI => {
            let mut openai = OpenAIConfig::new(key)
                .with_model(config.openai_model.clone())
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries);
            if let Some(url) = &config.openai_base_url {
                openai = openai.with_base_url(url.clone());
            }
            Arc::new(OpenAIProvider::new(openai)?)
        }
        AiProvider::Anthropic => Arc::new(AnthropicProvider::new(
            AnthropicConfig::new(key)
                .with_model(config.anthropic_model.clone())
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries),
        )?),
    })
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn ExampleStore>, BoxError> {
    let embedder: Arc<dyn Embedder> = match config.embeddings.backend {
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.embeddings.hashing_dimensions)),
        EmbeddingBackend::OpenAI => {
            let key = config
                .ai
                .api_key(AiProvider::OpenAI)
                .ok_or("the openai embedding backend needs ai.openai_api_key")?
                .expose_secret()
                .clone();
            let mut embedder_config = OpenAIEmbedderConfig::new(key).with_model(
                config.embeddings.openai_model.clone(),
                config.embeddings.openai_dimensions,
            );
            if let Some(url) = &config.ai.openai_base_url {
                embedder_config = embedder_config.with_base_url(url.clone());
            }
            Arc::new(OpenAIEmbedder::new(embedder_config)?)
        }
    };

    let mut store = InMemoryExampleStore::new(embedder);
    if let Some(radius) = config.example_store.exclusion_radius {
        store = store.with_exclusion_radius(radius);
    }

    match &config.example_store.seed_file {
        Some(path) => {
            let examples = load_seed_examples(path).await?;
            seed_store(&store, examples).await?;
        }
        None => warn!("No seed file configured; routing without few-shot examples"),
    }

    if let Some(path) = &config.example_store.held_out_file {
        let held_out: Vec<String> = load_evaluation_cases(path)
            .await?
            .into_iter()
            .map(|c| c.query)
            .collect();
        store.exclude(&held_out).await?;
    }

    Ok(Arc::new(store))
}
