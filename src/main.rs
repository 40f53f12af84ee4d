use vigil::cli::{Cli, Commands, ConfigAction, FilterArgs, OutputArgs};
use vigil::config::Config;
use vigil::error::{Result, VigilError};
use vigil::search::{
    DeepLink, NormalizedResult, SearchQuery, SearchResponse, SearchStatus, TabCounts,
    ViewProjector,
};
use vigil::sources;

use serde::Serialize;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Search {
            text,
            filters,
            output,
        } => {
            cmd_search(cli.config, &text, &filters, &output)?;
        }
        Commands::Open { link, output } => {
            cmd_open(cli.config, &link, &output)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "vigil=debug" } else { "vigil=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_search(
    config_path: Option<PathBuf>,
    text: &str,
    filters: &FilterArgs,
    output: &OutputArgs,
) -> Result<()> {
    let query = SearchQuery::new(text)
        .with_scope(filters.scope)
        .with_filters(filters.to_filters());

    run_query(config_path, query, output)
}

fn cmd_open(config_path: Option<PathBuf>, link: &str, output: &OutputArgs) -> Result<()> {
    let link = DeepLink::parse(link)?;
    tracing::debug!("Opening search link: {}", link.to_query_string());

    run_query(config_path, link.to_query(), output)
}

fn run_query(config_path: Option<PathBuf>, query: SearchQuery, output: &OutputArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let dispatcher = sources::dispatcher_from_config(&config)?;

    let rt = tokio::runtime::Runtime::new().map_err(|e| VigilError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })?;
    let response = rt.block_on(dispatcher.dispatch(&query));

    let limit = output.limit.unwrap_or(config.search.max_displayed);
    if output.json {
        print_json(&query, &response, limit)
    } else {
        print_text(&query, &response, limit);
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    scope: &'static str,
    link: String,
    tabs: TabCounts,
    stats: &'a vigil::search::SearchStats,
    results: Vec<&'a NormalizedResult>,
}

fn print_json(query: &SearchQuery, response: &SearchResponse, limit: usize) -> Result<()> {
    let projector = ViewProjector::new(query.scope());
    let mut results = projector.project(&response.results);
    results.truncate(limit);

    let report = JsonReport {
        query: query.text(),
        scope: query.scope().as_str(),
        link: DeepLink::from(query).to_query_string(),
        tabs: projector.tab_counts(&response.results),
        stats: &response.stats,
        results,
    };

    let json = serde_json::to_string_pretty(&report).map_err(|e| VigilError::Json {
        source: e,
        context: "Failed to serialize search results".to_string(),
    })?;
    println!("{}", json);
    Ok(())
}

fn print_text(query: &SearchQuery, response: &SearchResponse, limit: usize) {
    let stats = &response.stats;

    if stats.status == SearchStatus::Skipped {
        println!("Type something to search devices, identities and events.");
        return;
    }

    if let Some(notice) = &stats.notice {
        println!("✗ {}", notice);
        return;
    }

    let projector = ViewProjector::new(query.scope());
    let tabs = projector.tab_counts(&response.results);
    let results = projector.project(&response.results);

    println!(
        "Results for \"{}\": {} total (devices {}, identities {}, events {}) in {}ms",
        query.text(),
        tabs.all,
        tabs.devices,
        tabs.identities,
        tabs.events,
        stats.elapsed_ms
    );

    for domain in &stats.degraded_domains {
        println!("⚠ {} could not be searched; results may be incomplete", domain);
    }

    if results.is_empty() {
        println!("\nNo matches in {}.", query.scope());
        return;
    }

    println!();
    for result in results.iter().take(limit) {
        let marker = if result.is_exact_match { "*" } else { " " };
        println!(
            "{} [{:<8}] {}  ({})",
            marker,
            result.domain.as_str(),
            result.title,
            result.sort_timestamp.format("%Y-%m-%d %H:%M")
        );
        if let Some(subtitle) = &result.subtitle {
            println!("             {}", subtitle);
        }
    }

    if results.len() > limit {
        println!("\n… {} more not shown (use --limit)", results.len() - limit);
    }
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let toml = toml::to_string_pretty(&config)?;
            println!("{}", toml);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Source: {}", config.source.kind);
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

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| VigilError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
            println!(
                "  Fixture files are read from: {}",
                config.source.fixtures_dir.display()
            );
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    Config::load_or_default(config_path)
}
