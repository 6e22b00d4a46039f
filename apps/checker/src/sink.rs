//! Destination for warning lines.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
}

/// Where warning lines are appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    /// Opened in append mode for every write and closed again afterwards
    File(PathBuf),
}

impl Sink {
    /// Resolve the output path, creating its parent directory if the file does
    /// not exist yet. `None` or an empty path selects stdout.
    pub fn prepare(path: Option<&Path>) -> Result<Self, SinkError> {
        let Some(path) = path.filter(|path| !path.as_os_str().is_empty()) else {
            return Ok(Self::Stdout);
        };

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| SinkError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        Ok(Self::File(path.to_path_buf()))
    }

    pub async fn write(&self, text: &str) -> io::Result<()> {
        match self {
            Self::Stdout => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(text.as_bytes()).await?;
                stdout.flush().await
            }
            Self::File(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
                file.write_all(text.as_bytes()).await?;
                file.flush().await
            }
        }
    }
}

impl std::fmt::Display for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}
