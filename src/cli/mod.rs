//! CLI command definitions and parsing
use crate::search::{DateRange, SearchFilters, SearchScope};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    version,
    author = "neur0map",
    about = "Federated search across cameras, known identities and detection events",
    long_about = "Vigil fans a single free-text query out to the device directory, the identity \
                  directory and the event log concurrently, filters and matches each domain, and \
                  prints one ranked, deduplicated result list with per-domain counts."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/vigil/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search devices, identities and events
    Search {
        /// Free-text query
        text: String,

        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run the search encoded in a shared link (`q` and `type` parameters)
    Open {
        /// Full URL or query string, e.g. "?q=front+door&type=events"
        link: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Restrict the search to one domain
    #[arg(short = 't', long = "type", value_parser = parse_scope, default_value = "all")]
    pub scope: SearchScope,

    /// Only events from this device
    #[arg(long)]
    pub device_id: Option<String>,

    /// Only events of this type (e.g. "unknown_face")
    #[arg(long)]
    pub event_type: Option<String>,

    /// Drop events below this confidence (0.0 - 1.0)
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Only active devices and identities
    #[arg(long)]
    pub active_only: bool,

    /// Only events in this window
    #[arg(long, value_parser = parse_date_range, conflicts_with_all = ["from", "to"])]
    pub date: Option<DateRange>,

    /// Start of a custom window (RFC 3339), requires --to
    #[arg(long, requires = "to")]
    pub from: Option<DateTime<Utc>>,

    /// End of a custom window (RFC 3339), requires --from
    #[arg(long, requires = "from")]
    pub to: Option<DateTime<Utc>>,
}

#[derive(Args, Debug, Default)]
pub struct OutputArgs {
    /// Maximum number of results to print (defaults to search.max_displayed)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Show results in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl FilterArgs {
    pub fn to_filters(&self) -> SearchFilters {
        let mut filters = SearchFilters::new().active_only(self.active_only);

        if let Some(device_id) = &self.device_id {
            filters = filters.with_device_id(device_id.as_str());
        }
        if let Some(event_type) = &self.event_type {
            filters = filters.with_event_type(event_type.as_str());
        }
        if let Some(floor) = self.min_confidence {
            filters = filters.with_min_confidence(floor);
        }

        let range = match (self.date, self.from, self.to) {
            (Some(range), _, _) => Some(range),
            (None, Some(from), Some(to)) => Some(DateRange::Custom { from, to }),
            _ => None,
        };
        if let Some(range) = range {
            filters = filters.with_date_range(range);
        }

        filters
    }
}

fn parse_scope(s: &str) -> Result<SearchScope, String> {
    SearchScope::parse(s)
        .ok_or_else(|| format!("expected one of all, devices, identities, events; got '{}'", s))
}

fn parse_date_range(s: &str) -> Result<DateRange, String> {
    DateRange::parse(s).ok_or_else(|| format!("expected today, 7d or 30d; got '{}'", s))
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
