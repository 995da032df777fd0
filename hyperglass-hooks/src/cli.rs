use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::hooks::{Hooks, LifecycleHooks, ServerHandle, WorkerHandle};

#[derive(Parser, Debug)]
#[command(version, about = "hyperglass process lifecycle hooks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Print the supervisor settings as JSON
    Settings,
    /// Build the stylesheet, check the cache and reset the metrics directory.
    /// Prints `prometheus_multiproc_dir=<path>` for the supervisor to export.
    OnStarting,
    /// Retire the live metrics of an exited worker
    WorkerExit {
        /// Process id of the worker that exited
        #[arg(long)]
        pid: u32,
    },
    /// Remove the metrics directory
    OnExit,
}

impl Cli {
    pub async fn run(self, config: Config) -> anyhow::Result<()> {
        if self.command == Commands::Settings {
            println!(
                "{}",
                serde_json::to_string_pretty(&config.supervisor_settings())?
            );
            return Ok(());
        }

        let server = ServerHandle::current(&config);
        let hooks = Hooks::from_config(config)?;

        match self.command {
            Commands::Settings => {}
            Commands::OnStarting => {
                hooks.on_starting(&server).await?;
                // The variable set above dies with this process.
                println!("{}", hooks.metrics_dir().env_assignment());
            }
            Commands::WorkerExit { pid } => {
                hooks.worker_exit(&server, &WorkerHandle { pid }).await?
            }
            Commands::OnExit => hooks.on_exit(&server).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_worker_exit() {
        let cli = Cli::try_parse_from(["hyperglass-hooks", "worker-exit", "--pid", "4242"]).unwrap();
        assert_eq!(cli.command, Commands::WorkerExit { pid: 4242 });
    }

    #[test]
    fn test_worker_exit_requires_pid() {
        assert!(Cli::try_parse_from(["hyperglass-hooks", "worker-exit"]).is_err());
    }

    #[test]
    fn test_parse_lifecycle_commands() {
        let cli = Cli::try_parse_from(["hyperglass-hooks", "on-starting"]).unwrap();
        assert_eq!(cli.command, Commands::OnStarting);
        let cli = Cli::try_parse_from(["hyperglass-hooks", "on-exit"]).unwrap();
        assert_eq!(cli.command, Commands::OnExit);
    }

    #[tokio::test]
    async fn test_on_exit_command_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("prom");
        std::fs::create_dir_all(&dir).unwrap();

        let config = Config {
            prometheus_multiproc_dir: dir.clone(),
            ..Config::default_test_config()
        };
        Cli {
            command: Commands::OnExit,
        }
        .run(config)
        .await
        .unwrap();
        assert!(!dir.exists());
    }
}
