//! Opt-in tracing setup for embedders without a subscriber of their own.

use std::sync::OnceLock;

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: OnceLock<()> = OnceLock::new();

/// Install a compact fmt subscriber honouring `RUST_LOG`, defaulting to
/// `wavematch=info`. Safe to call repeatedly; later calls are no-ops, as is
/// calling it when the host already installed a global subscriber.
pub fn init() {
    init_with_filter("wavematch=info");
}

/// Like [`init`], with an explicit filter directive used when `RUST_LOG` is
/// unset.
pub fn init_with_filter(default_directive: &str) {
    INIT.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_directive))
            .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::INFO.into()));

        if let Err(err) = fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .try_init()
        {
            eprintln!("failed to initialise tracing subscriber: {err}");
        }
    });
}
