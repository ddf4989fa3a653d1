pub mod dictionary;
pub mod enumeration;
pub mod fixed;
pub mod list;

use crate::model::Candidate;
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// Something able to produce the candidates of a run.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    fn name(&self) -> String;

    fn description(&self) -> String;

    async fn enumerate(&self) -> Result<Vec<Candidate>>;

    /// Sources whose candidates are already known to be live return `false`.
    fn requires_probe(&self) -> bool {
        true
    }
}

/// Reads a newline-delimited file, tolerating non UTF-8 bytes.
pub(crate) async fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(|line| line.to_string())
        .collect())
}
