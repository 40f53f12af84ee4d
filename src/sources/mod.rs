//! Concrete domain collaborators
//!
//! - `FixtureSource`: JSON files on disk
//! - `HttpSource`: the dashboard's REST backend
//! - `InMemorySource`: in-process, with failure and latency injection

mod fixtures;
mod http;
mod memory;

pub use fixtures::{FixtureSource, DEVICES_FILE, EVENTS_FILE, IDENTITIES_FILE};
pub use http::HttpSource;
pub use memory::InMemorySource;

use crate::config::{expand_tilde, Config};
use crate::error::{Result, VigilError};
use crate::search::QueryDispatcher;
use std::sync::Arc;
use std::time::Duration;

/// Build a dispatcher over the source selected in `config`
pub fn dispatcher_from_config(config: &Config) -> Result<QueryDispatcher> {
    let limit = config.search.event_fetch_limit;

    match config.source.kind.as_str() {
        "fixtures" => {
            let dir = expand_tilde(&config.source.fixtures_dir);
            tracing::debug!("Using fixture source at {}", dir.display());
            Ok(QueryDispatcher::from_source(
                Arc::new(FixtureSource::new(dir)),
                limit,
            ))
        }
        "http" => {
            let token = std::env::var(&config.source.token_env)
                .ok()
                .filter(|t| !t.is_empty());
            if token.is_none() {
                tracing::warn!(
                    "{} is not set; requests will be sent without a session token",
                    config.source.token_env
                );
            }

            let source = HttpSource::new(
                &config.source.base_url,
                token,
                Duration::from_secs(config.source.timeout_secs),
            )?;
            tracing::debug!("Using HTTP source {:?}", source);
            Ok(QueryDispatcher::from_source(Arc::new(source), limit))
        }
        other => Err(VigilError::Config(format!("Unknown source kind: {}", other))),
    }
}
