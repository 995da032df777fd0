use clap::Parser;
use envconfig::Envconfig;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use hyperglass_hooks::cli::Cli;
use hyperglass_hooks::config::Config;

// Single thread: `on-starting` mutates the process environment.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::init_from_env()?;

    // stdout for `settings`, so logs go to stderr
    let log_layer = {
        let base_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);

        if *config.debug {
            base_layer
                .with_ansi(true)
                .with_filter(EnvFilter::from_default_env())
                .boxed()
        } else {
            base_layer
                .json()
                .with_filter(EnvFilter::from_default_env())
                .boxed()
        }
    };
    tracing_subscriber::registry().with(log_layer).init();

    if let Err(e) = cli.run(config).await {
        tracing::error!(error = %e, "hook failed");
        return Err(e);
    }

    Ok(())
}
