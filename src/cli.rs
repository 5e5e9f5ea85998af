use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::api::DEFAULT_BASE_URL;

/// Command-line interface of the snaps client.
#[derive(Parser, Debug)]
#[command(
    name = "snaps",
    version = env!("CARGO_PKG_VERSION"),
    about = "Track drinks at a snapsecounter event and watch the live chart",
    long_about = None
)]
pub struct Cli {
    /// Base URL of the snapsecounter service
    #[arg(long = "url", env = "SNAPS_URL", default_value = DEFAULT_BASE_URL)]
    pub url: String,

    /// Log in and pick the event with fixed test values (for smoke tests)
    #[arg(long = "test")]
    pub test: bool,

    /// Print the chart without ANSI colours
    #[arg(long = "no-color")]
    pub no_color: bool,
}

/// Send logs to stderr so they stay out of the chart. `RUST_LOG` overrides
/// the default `warn` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
