use super::{read_lines, CandidateSource};
use crate::model::Candidate;
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// A user supplied file of candidates already known to be live.
#[derive(Debug)]
pub struct ListFile {
    path: PathBuf,
}

impl ListFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CandidateSource for ListFile {
    fn name(&self) -> String {
        "sources/list".to_string()
    }

    fn description(&self) -> String {
        format!("Read candidates from {}", self.path.display())
    }

    #[instrument(name = "enumerate", level = "info", fields(source = %self.name()), skip_all)]
    async fn enumerate(&self) -> Result<Vec<Candidate>> {
        let candidates: Vec<Candidate> = read_lines(&self.path)
            .await?
            .iter()
            .filter_map(|line| Candidate::new(line))
            .collect();

        debug!("{} collected", candidates.len());
        Ok(candidates)
    }

    fn requires_probe(&self) -> bool {
        false
    }
}
