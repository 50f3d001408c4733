use docqa::cli::{Cli, Commands, ConfigAction, DocsArgs};
use docqa::config::Config;
use docqa::embedding::{EmbeddingPool, OllamaEmbedder};
use docqa::error::{DocqaError, Result};
use docqa::generation::OllamaGenerator;
use docqa::pipeline::{self, IndexReport, Indexer};
use docqa::query::{QueryEngine, QueryLoop};
use docqa::store::{CollectionHandle, StoreAdapter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        None => cmd_chat(cli.config, cli.profile, DocsArgs::default())?,
        Some(Commands::Chat { docs }) => cmd_chat(cli.config, cli.profile, docs)?,
        Some(Commands::Ask {
            question,
            docs,
            top_k,
        }) => cmd_ask(cli.config, cli.profile, docs, &question, top_k)?,
        Some(Commands::Index { docs }) => cmd_index(cli.config, cli.profile, docs)?,
        Some(Commands::Config { action }) => cmd_config(cli.config, action)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if verbose { "docqa=debug" } else { "docqa=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| DocqaError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })
}

/// Long-lived services shared by indexing and querying
struct Services {
    pool: EmbeddingPool,
    store: StoreAdapter,
    generator: OllamaGenerator,
}

impl Services {
    fn from_config(config: &Config) -> Result<Self> {
        let embedder = OllamaEmbedder::new(
            &config.embedding.base_url,
            &config.embedding.model,
            config.embedding.timeout(),
        )?;
        let pool = EmbeddingPool::new(Arc::new(embedder), config.embedding.workers);
        let store = StoreAdapter::new(config.store.index_params(), config.store.duplicate_policy);
        let generator = OllamaGenerator::new(
            &config.generation.base_url,
            &config.generation.model,
            config.generation.timeout(),
        )?;

        Ok(Self {
            pool,
            store,
            generator,
        })
    }

    async fn index_docs(&self, config: &Config, docs_dir: &Path) -> Result<IndexReport> {
        let documents =
            pipeline::load_documents(docs_dir, &config.ingest.source_extensions).await?;
        let indexer = Indexer::new(&self.pool, &self.store, &config.store.collection);
        Ok(indexer.index(&documents).await?)
    }

    fn engine(&self, collection: CollectionHandle, top_k: usize) -> QueryEngine<'_> {
        QueryEngine::new(&self.pool, &self.store, collection, &self.generator).with_top_k(top_k)
    }
}

fn cmd_chat(config_path: Option<PathBuf>, profile: Option<String>, docs: DocsArgs) -> Result<()> {
    let config = load_config(config_path, profile)?;
    let docs_dir = resolve_docs_dir(&config, docs)?;
    let services = Services::from_config(&config)?;

    runtime()?.block_on(async {
        let report = services.index_docs(&config, &docs_dir).await?;
        print_failures(&report);

        let engine = services.engine(report.collection, config.query.top_k);
        let mut query_loop = QueryLoop::new(engine, &config.query.exit_token);

        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let summary = query_loop
            .run(stdin, tokio::io::stdout())
            .await
            .map_err(|e| DocqaError::Io {
                source: e,
                context: "Console IO failed".to_string(),
            })?;

        tracing::info!(
            "Session ended: {} answered, {} failed",
            summary.answered,
            summary.failed
        );
        Ok::<(), DocqaError>(())
    })
}

fn cmd_ask(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    docs: DocsArgs,
    question: &str,
    top_k: Option<usize>,
) -> Result<()> {
    let config = load_config(config_path, profile)?;
    let docs_dir = resolve_docs_dir(&config, docs)?;
    let services = Services::from_config(&config)?;
    let top_k = top_k.unwrap_or(config.query.top_k);

    runtime()?.block_on(async {
        let report = services.index_docs(&config, &docs_dir).await?;
        print_failures(&report);

        let answer = services.engine(report.collection, top_k).answer(question).await?;

        println!("Generated Answer:");
        println!("{}", answer.text);
        println!();
        println!("Context:");
        for chunk in &answer.context {
            println!("  [{}] distance {:.4}", chunk.id, chunk.distance);
        }
        Ok::<(), DocqaError>(())
    })
}

fn cmd_index(config_path: Option<PathBuf>, profile: Option<String>, docs: DocsArgs) -> Result<()> {
    let config = load_config(config_path, profile)?;
    let docs_dir = resolve_docs_dir(&config, docs)?;
    let services = Services::from_config(&config)?;

    let report = runtime()?.block_on(services.index_docs(&config, &docs_dir))?;

    println!("✓ Indexed {}", docs_dir.display());
    println!("  Collection: {}", report.collection.name());
    println!("  Documents: {}", report.indexed_documents());
    println!("  Chunks: {}", report.chunks_indexed());
    println!("  Duration: {}ms", report.duration_ms);
    print_failures(&report);

    Ok(())
}

fn print_failures(report: &IndexReport) {
    if report.failed_documents() == 0 {
        return;
    }

    eprintln!("✗ {} documents failed to index:", report.failed_documents());
    for outcome in &report.outcomes {
        if let pipeline::DocumentOutcome::Failed {
            source_index,
            error,
        } = outcome
        {
            eprintln!("  - document {}: {}", source_index, error);
        }
    }
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { section } => {
            let config = load_config(config_path, None)?;
            let value = serde_json::to_value(&config).map_err(|e| DocqaError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;

            let shown = match section {
                Some(section) => value.get(&section).cloned().ok_or_else(|| {
                    DocqaError::Config(format!("Unknown config section: {}", section))
                })?,
                None => value,
            };

            let json = serde_json::to_string_pretty(&shown).map_err(|e| DocqaError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::debug!(
            "Config file not found, using defaults. Run 'docqa config init' to create one."
        );
    }
    let mut config = Config::load_or_default(&path)?;

    if let Some(profile) = profile {
        config.apply_profile(&profile)?;
    }

    Ok(config)
}

fn resolve_docs_dir(config: &Config, docs: DocsArgs) -> Result<PathBuf> {
    let dir = docs.docs.unwrap_or_else(|| config.ingest.docs_dir.clone());
    expand_path(&dir)
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| DocqaError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| DocqaError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
