use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use lookalike::{config, report, storage, Engine, FusionQuery, Method, Metric};

#[derive(Parser)]
#[command(name = "lookalike")]
#[command(version, about = "Find the catalog faces most similar to a query face")]
struct Cli {
    /// Config file (defaults to the per-user config path)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RankArgs {
    /// Query embeddings: JSON object keyed by method
    #[arg(short, long)]
    query: PathBuf,

    /// Minimum score (exclusive) a match must exceed
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Maximum number of matches to return
    #[arg(short, long)]
    limit: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a per-method player embedding export into the catalog
    Import {
        /// Method the export's descriptors were extracted with
        #[arg(short, long)]
        method: Method,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Replace the catalog with a native JSON catalog
    Load {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Rank catalog entries by one method
    Match {
        #[command(flatten)]
        args: RankArgs,
        #[arg(short, long, default_value = "descriptor")]
        method: Method,
        /// Scoring policy, e.g. cosine-linear or distance-cutoff:0.6
        #[arg(long)]
        metric: Option<Metric>,
    },
    /// Rank catalog entries by fused descriptor and landmark scores
    Fuse {
        #[command(flatten)]
        args: RankArgs,
    },
    /// List catalog entries
    List,
    /// Remove the stored catalog
    Purge,
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cfg = config::load_config(cli.config.as_deref())?;
    let store = cfg.store_prefix().to_path_buf();
    debug!("catalog store: {}", store.display());

    match cli.command {
        Commands::Import { method, file } => import(&store, method, &file),
        Commands::Load { file } => load(&store, &file),
        Commands::Match {
            args,
            method,
            metric,
        } => {
            let metric = metric.unwrap_or_else(|| cfg.single.for_method(method));
            rank_single(&cfg, &store, &args, method, metric, cli.json)
        }
        Commands::Fuse { args } => rank_fused(&cfg, &store, &args, cli.json),
        Commands::List => list(&store),
        Commands::Purge => purge(&store),
        Commands::Config => open_config(cli.config.as_deref()),
    }
}

fn engine(cfg: &config::Config, args: &RankArgs) -> Result<Engine> {
    let mut engine_cfg = cfg.engine_config();
    if let Some(threshold) = args.threshold {
        engine_cfg.threshold = threshold;
    }
    if let Some(limit) = args.limit {
        engine_cfg.limit = limit;
    }
    Engine::new(engine_cfg).context("invalid matching settings")
}

fn load_nonempty_catalog(store: &Path) -> Result<lookalike::Catalog> {
    let catalog = storage::load_catalog(store).context("Failed to load catalog")?;
    if catalog.is_empty() {
        anyhow::bail!("Catalog is empty. Run 'import' or 'load' first.");
    }
    Ok(catalog)
}

fn print_results(ranked: &[lookalike::RankedMatch<'_>], json: bool) -> Result<()> {
    let rows = report::rows(ranked);
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", report::render_text(&rows));
    }
    Ok(())
}

fn import(store: &Path, method: Method, file: &Path) -> Result<()> {
    info!("Importing {} embeddings from {}", method, file.display());

    let mut catalog = storage::load_catalog(store).context("Failed to load catalog")?;
    let merged = storage::import_players_file(&mut catalog, file, method)?;
    if merged == 0 {
        warn!("No usable records in {}", file.display());
    }
    storage::save_catalog(store, &catalog).context("Failed to save catalog")?;

    info!("✓ Catalog now holds {} entries", catalog.len());
    Ok(())
}

fn load(store: &Path, file: &Path) -> Result<()> {
    let catalog = storage::read_json_catalog(file)?;
    storage::save_catalog(store, &catalog).context("Failed to save catalog")?;
    info!("✓ Loaded {} entries from {}", catalog.len(), file.display());
    Ok(())
}

fn rank_single(
    cfg: &config::Config,
    store: &Path,
    args: &RankArgs,
    method: Method,
    metric: Metric,
    json: bool,
) -> Result<()> {
    let engine = engine(cfg, args)?;
    let catalog = load_nonempty_catalog(store)?;
    let query = storage::read_query(&args.query)?;
    let embedding = query.get(method)?;

    info!(
        "Matching {} ({}) against {} entries",
        method,
        metric,
        catalog.len()
    );
    let ranked = engine.match_method(embedding, catalog.entries(), method, metric)?;
    print_results(&ranked, json)
}

fn rank_fused(cfg: &config::Config, store: &Path, args: &RankArgs, json: bool) -> Result<()> {
    let engine = engine(cfg, args)?;
    let catalog = load_nonempty_catalog(store)?;
    let query = FusionQuery::try_from(storage::read_query(&args.query)?)
        .context("fusion needs both descriptor and landmarks in the query")?;

    let coverage = catalog.coverage();
    if coverage.both < coverage.total {
        warn!(
            "{} of {} entries lack one of the methods and are excluded from fusion",
            coverage.total - coverage.both,
            coverage.total
        );
    }

    let ranked = engine.fuse(&query, catalog.entries());
    print_results(&ranked, json)
}

fn list(store: &Path) -> Result<()> {
    let catalog = storage::load_catalog(store).context("Failed to load catalog")?;
    for entry in catalog.entries() {
        let methods: Vec<_> = entry.embeddings.keys().map(Method::as_str).collect();
        println!(
            "{}\t{}\t{}\t[{}]",
            entry.id,
            entry.metadata.name,
            entry.metadata.group.as_deref().unwrap_or("-"),
            methods.join(", ")
        );
    }
    let c = catalog.coverage();
    info!(
        "{} entries: {} descriptor, {} landmarks, {} both",
        c.total, c.descriptor, c.landmarks, c.both
    );
    Ok(())
}

fn purge(store: &Path) -> Result<()> {
    info!("Purging catalog at {}", store.display());

    storage::purge(store).context("Failed to purge catalog")?;

    info!("✓ Catalog purged");
    Ok(())
}

fn open_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.unwrap_or(&config::CONFIG_PATH);
    if !config_path.exists() {
        config::save_config(&config::Config::default(), Some(config_path))
            .context("Failed to write default config")?;
    }
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
