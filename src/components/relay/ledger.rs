use crate::error::RelayResult;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Append-only record of events already forwarded, one token per line
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every token recorded so far; a missing file is an empty ledger
    pub async fn load(&self) -> RelayResult<HashSet<String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No ledger at {} yet", self.path.display());
                return Ok(HashSet::new());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Append tokens in order and flush them to disk.
    ///
    /// Callers must leave out tokens returned by the last `load`.
    pub async fn append(&self, tokens: &[String]) -> RelayResult<()> {
        if tokens.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut buffer = String::new();
        for token in tokens {
            buffer.push_str(token);
            buffer.push('\n');
        }

        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await?;

        debug!("Appended {} tokens to {}", tokens.len(), self.path.display());
        Ok(())
    }
}
