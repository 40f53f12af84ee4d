//! Vigil - Federated search for a face-recognition surveillance dashboard
//!
//! Takes one free-text query, fans it out concurrently to the device, identity
//! and event domains, filters and matches each domain locally, and merges the
//! hits into a single ranked list with per-domain counts for tabbed views.

pub mod cli;
pub mod config;
pub mod error;
pub mod search;
pub mod sources;

pub use error::{Result, VigilError};
