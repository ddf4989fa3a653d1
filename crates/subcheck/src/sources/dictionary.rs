use super::{read_lines, CandidateSource};
use crate::model::Candidate;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

pub const DICTIONARY_FILE: &str = "/usr/share/dict/words";
pub const DEFAULT_SCHEME: &str = "https";

#[derive(Debug, Clone)]
pub struct DictionaryConfig {
    pub host: String,
    pub scheme: String,
    /// Resume cursor, words sorting before it are skipped.
    pub start: Option<String>,
    pub path: PathBuf,
}

impl DictionaryConfig {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            scheme: DEFAULT_SCHEME.to_string(),
            start: None,
            path: PathBuf::from(DICTIONARY_FILE),
        }
    }
}

// region:        --- Source info

/// Turns every dictionary word into a `scheme://host/word` probe URI.
#[derive(Debug)]
pub struct Dictionary {
    config: DictionaryConfig,
}

impl Dictionary {
    pub fn new(config: DictionaryConfig) -> Result<Self> {
        if config.host.trim().is_empty() {
            return Err(Error::configuration("--host required"));
        }
        Ok(Self { config })
    }

    fn candidate_for(&self, word: &str) -> Option<Candidate> {
        Candidate::new(&format!(
            "{}://{}/{}",
            self.config.scheme, self.config.host, word
        ))
    }
}

// endregion:     --- Source info

#[async_trait]
impl CandidateSource for Dictionary {
    fn name(&self) -> String {
        "sources/dictionary".to_string()
    }

    fn description(&self) -> String {
        format!("Probe {} words under {}", self.config.path.display(), self.config.host)
    }

    #[instrument(name = "enumerate", level = "info", fields(source = %self.name()), skip_all)]
    async fn enumerate(&self) -> Result<Vec<Candidate>> {
        info!("Reading words from {}", self.config.path.display());
        let lines = read_lines(&self.config.path).await?;

        let start = self
            .config
            .start
            .as_deref()
            .map(str::to_lowercase)
            .filter(|start| !start.is_empty());

        let mut skipped = 0;
        let candidates: Vec<Candidate> = lines
            .iter()
            .map(|line| line.trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .filter(|word| match &start {
                Some(start) if word < start => {
                    skipped += 1;
                    false
                }
                _ => true,
            })
            .filter_map(|word| self.candidate_for(&word))
            .collect();

        debug!("{} collected, {} before start cursor", candidates.len(), skipped);
        Ok(candidates)
    }
}
