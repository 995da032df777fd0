//! Stylesheet build run before workers start.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum AssetError {
    /// The compiler or its input could not be located. Startup tolerates this.
    #[error("stylesheet compiler unavailable: {0}")]
    Unavailable(String),
    #[error("stylesheet build failed with {status}: {stderr}")]
    Build { status: String, stderr: String },
    #[error("stylesheet build I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AssetError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AssetError::Unavailable(_))
    }
}

#[async_trait]
pub trait StylesheetCompiler {
    /// Builds the deployable stylesheet and returns its path.
    async fn compile(&self) -> Result<PathBuf, AssetError>;
}

/// Compiles a Sass source into compressed CSS with an external `sass` program.
#[derive(Debug, Clone)]
pub struct SassCompiler {
    program: String,
    source: PathBuf,
    output: PathBuf,
}

impl SassCompiler {
    pub fn new(program: impl Into<String>, source: PathBuf, output: PathBuf) -> Self {
        Self {
            program: program.into(),
            source,
            output,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--no-source-map")
            .arg("--style=compressed")
            .arg(&self.source)
            .arg(&self.output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl StylesheetCompiler for SassCompiler {
    async fn compile(&self) -> Result<PathBuf, AssetError> {
        if !tokio::fs::try_exists(&self.source).await? {
            return Err(AssetError::Unavailable(format!(
                "source {} does not exist",
                self.source.display()
            )));
        }
        if let Some(parent) = self.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        debug!(
            program = %self.program,
            source = %self.source.display(),
            output = %self.output.display(),
            "compiling stylesheet"
        );
        let output = match self.command().output().await {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(AssetError::Unavailable(format!(
                    "{} not found: {}",
                    self.program, e
                )))
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            return Err(AssetError::Build {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(output = %self.output.display(), "compiled stylesheet");
        Ok(self.output.clone())
    }
}
