//! clawkit binary entry point.

use clap::Parser;
use clawkit::cli::Cli;
use clawkit::report::Reporter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("clawkit={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = clawkit::cli::run(cli).await {
        Reporter::terminal().failure(&e);
        std::process::exit(e.exit_code());
    }
}
