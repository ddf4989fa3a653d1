use super::CandidateSource;
use crate::model::Candidate;
use crate::Result;
use async_trait::async_trait;

/// In-memory candidates, used by `--test` runs.
#[derive(Debug, Clone)]
pub struct Fixed {
    candidates: Vec<Candidate>,
}

impl Fixed {
    pub fn new(names: &[&str]) -> Self {
        Self {
            candidates: names.iter().filter_map(|name| Candidate::new(name)).collect(),
        }
    }

    pub fn test_domains() -> Self {
        Self::new(&["foo.com", "bar.com"])
    }
}

#[async_trait]
impl CandidateSource for Fixed {
    fn name(&self) -> String {
        "sources/fixed".to_string()
    }

    fn description(&self) -> String {
        format!("{} fixed candidates", self.candidates.len())
    }

    async fn enumerate(&self) -> Result<Vec<Candidate>> {
        Ok(self.candidates.clone())
    }
}
