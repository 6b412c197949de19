//! Tracing configuration for debugging compilations.
//!
//! Supports three output formats controlled by `CINDER_LOG_FORMAT`:
//!
//! - `text` (default): standard `tracing-subscriber` flat output
//! - `tree`: hierarchical output via `tracing-tree`, one indented block per pass
//! - `json`: one JSON object per span/event
//!
//! ## Quick start
//!
//! ```bash
//! # Which passes ran, and how long each took
//! CINDER_LOG=info cinderc m.json
//!
//! # Pass-by-pass tree
//! CINDER_LOG=debug CINDER_LOG_FORMAT=tree cinderc m.json
//!
//! # Only the resolver, at trace level
//! CINDER_LOG="cinder_passes::passes::resolve=trace" cinderc m.json
//! ```
//!
//! The subscriber is only initialised when `CINDER_LOG` (or `RUST_LOG`) is
//! set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Tree,
    Json,
}

impl LogFormat {
    /// Parse a `CINDER_LOG_FORMAT` value; anything unrecognised is `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("CINDER_LOG_FORMAT").unwrap_or_default())
    }
}

/// `CINDER_LOG` takes precedence over `RUST_LOG`; both use `RUST_LOG` syntax.
fn build_filter() -> EnvFilter {
    match std::env::var("CINDER_LOG") {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Initialise the global tracing subscriber. Output goes to stderr so it
/// never mixes with `--dump-fragments` on stdout.
pub fn init_tracing() {
    if std::env::var_os("CINDER_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);
            Registry::default().with(filter).with(tree_layer).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
