//! # Lookalike
//!
//! Visual search for product catalogs: show it a photo, get back the
//! products that look like it.
//!
//! ## How It Works
//! Every catalog product carries a 64-bit perceptual fingerprint of its
//! image. A query image is fingerprinted the same way, every product is
//! scored by how few fingerprint bits differ, and the best scores win.
//!
//! ## Architecture
//! - `core` - The search engine (hashing, scoring, matching, ingestion, catalog)
//! - `events` - Event-driven progress reporting
//! - `error` - Typed errors with user-facing hints

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{LookalikeError, Result};

/// Initialize tracing for the library
///
/// Called by the application entry point. `RUST_LOG` wins when set;
/// otherwise `verbose` selects `debug` over `warn`. A second call is a
/// no-op.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
