//! cinefind - movie discovery CLI.

/// Search analytics backed by `SQLite`.
mod analytics;
/// Application configuration (TOML).
mod config;
/// Log-line rendering of browse state.
mod output;
/// Interactive browse loop.
mod watch;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use cinefind_browse::detail::DETAIL_ERROR_MESSAGE;
use cinefind_browse::{FetchMode, FetchOutcome, SearchAnalytics, SearchQuery};
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::analytics::SqliteAnalytics;
use crate::config::{AppConfig, resolve_config_path};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List popular movies.
    Popular(PopularArgs),
    /// Search movies by title.
    Search(SearchArgs),
    /// Show the details of one movie.
    Details(DetailsArgs),
    /// Show the most searched terms.
    Trending(TrendingArgs),
    /// Browse interactively: type to search, `:more` loads the next page.
    Watch,
    /// Run the catalog proxy.
    Proxy(ProxyArgs),
    /// Write a default config file.
    Init(InitArgs),
}

/// Arguments for the `popular` subcommand.
#[derive(clap::Args)]
struct PopularArgs {
    /// Result page (1-based).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Title to search for.
    query: String,

    /// Result page (1-based).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
}

/// Arguments for the `details` subcommand.
#[derive(clap::Args)]
struct DetailsArgs {
    /// TMDB movie ID.
    id: u64,
}

/// Arguments for the `trending` subcommand.
#[derive(clap::Args)]
struct TrendingArgs {
    /// Number of terms to show (default: `search.trending_limit`).
    #[arg(long)]
    limit: Option<usize>,
}

/// Arguments for the `proxy` subcommand.
#[derive(clap::Args)]
struct ProxyArgs {
    /// Listen address (default: `proxy.listen`).
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Mount prefix (default: `proxy.prefix`).
    #[arg(long)]
    prefix: Option<String>,
}

/// Arguments for the `init` subcommand.
#[derive(clap::Args)]
struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(long)]
    force: bool,
}

/// Reads the bearer credential from `TMDB_API_TOKEN`.
fn api_token() -> Option<String> {
    std::env::var("TMDB_API_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
}

/// Loads the config file under `dir` (or the default location).
///
/// # Errors
///
/// Returns an error if the config path cannot be resolved or the file cannot be parsed.
fn load_config(dir: Option<&Path>) -> Result<AppConfig> {
    let path = resolve_config_path(dir)?;
    AppConfig::load(&path)
}

/// Fetches one list page and prints it.
///
/// # Errors
///
/// Returns an error if the session cannot be set up or the fetch fails.
#[instrument(skip_all, fields(query = %query, page))]
async fn run_list(dir: Option<&Path>, query: SearchQuery, page: u32) -> Result<()> {
    let config = load_config(dir)?;
    let analytics = Arc::new(SqliteAnalytics::open(dir)?);
    let controller = config
        .browse_config(api_token())?
        .list_controller(analytics)?;

    let outcome = controller.fetch(query, page, FetchMode::Replace).await;
    output::print_list(&controller.snapshot().await);
    controller.drain_reports().await;

    match outcome {
        FetchOutcome::Failed(err) => Err(err).context("movie list request failed"),
        _ => Ok(()),
    }
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the query is blank or the fetch fails.
async fn run_search(args: &SearchArgs, dir: Option<&Path>) -> Result<()> {
    let query = SearchQuery::new(&args.query);
    if query.is_empty() {
        bail!("search query must not be empty; use `cinefind popular` to list popular movies");
    }
    run_list(dir, query, args.page).await
}

/// Runs the `details` subcommand.
///
/// # Errors
///
/// Returns an error if no detail strategy succeeds.
#[instrument(skip_all, fields(movie_id = args.id))]
async fn run_details(args: &DetailsArgs, dir: Option<&Path>) -> Result<()> {
    let fetcher = load_config(dir)?
        .browse_config(api_token())?
        .detail_fetcher()?;

    match fetcher.fetch(args.id).await {
        Ok(detail) => {
            for line in output::detail_lines(&detail) {
                tracing::info!("{line}");
            }
            Ok(())
        }
        Err(err) => {
            tracing::warn!("{DETAIL_ERROR_MESSAGE}");
            Err(err).context(DETAIL_ERROR_MESSAGE)
        }
    }
}

/// Runs the `trending` subcommand.
///
/// # Errors
///
/// Returns an error if the analytics database cannot be read.
#[instrument(skip_all)]
async fn run_trending(args: &TrendingArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let limit = args.limit.unwrap_or(config.search.trending_limit);
    let analytics = SqliteAnalytics::open(dir)?;
    let trending = analytics.trending(limit).await?;
    output::print_trending(&trending);
    Ok(())
}

/// Runs the `watch` subcommand.
///
/// # Errors
///
/// Returns an error if the session cannot be set up or stdin fails.
async fn run_watch(dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let analytics = Arc::new(SqliteAnalytics::open(dir)?);
    watch::run_watch(config.browse_config(api_token())?, analytics).await
}

/// Runs the `proxy` subcommand.
///
/// # Errors
///
/// Returns an error if the settings are invalid or the server fails.
#[instrument(skip_all)]
async fn run_proxy(args: ProxyArgs, dir: Option<&Path>) -> Result<()> {
    let mut settings = load_config(dir)?.proxy_settings(api_token())?;
    if let Some(listen) = args.listen {
        settings.listen = listen;
    }
    if let Some(prefix) = args.prefix {
        settings.prefix = prefix;
    }
    cinefind_proxy::run(settings).await
}

/// Runs the `init` subcommand.
///
/// # Errors
///
/// Returns an error if the file exists without `--force` or cannot be written.
fn run_init(args: &InitArgs, dir: Option<&Path>) -> Result<()> {
    let path = resolve_config_path(dir)?;
    if path.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }
    AppConfig::default().save(&path)?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_deref();
    match cli.command {
        Commands::Popular(args) => run_list(dir, SearchQuery::default(), args.page).await,
        Commands::Search(args) => run_search(&args, dir).await,
        Commands::Details(args) => run_details(&args, dir).await,
        Commands::Trending(args) => run_trending(&args, dir).await,
        Commands::Watch => run_watch(dir).await,
        Commands::Proxy(args) => run_proxy(args, dir).await,
        Commands::Init(args) => run_init(&args, dir),
    }
}
