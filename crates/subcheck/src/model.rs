use crate::{Error, Result};
use serde::Serialize;
use serde_json::to_string_pretty;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

// region:        --- Models

/// A hostname or a full probe URI, trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Candidate(String);

impl Candidate {
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Candidate {
    type Error = Error;

    fn try_from(raw: &str) -> Result<Self> {
        Self::new(raw).ok_or_else(|| Error::configuration("empty candidate"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Reachable,
    /// Transport failure, or a response downgraded by body inspection.
    Unreachable(String),
    /// The connection succeeded but reading the body failed.
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub candidate: Candidate,
    pub status: ProbeStatus,
}

impl ProbeOutcome {
    pub fn reachable(candidate: Candidate) -> Self {
        Self {
            candidate,
            status: ProbeStatus::Reachable,
        }
    }

    pub fn unreachable(candidate: Candidate, reason: impl Into<String>) -> Self {
        Self {
            candidate,
            status: ProbeStatus::Unreachable(reason.into()),
        }
    }

    pub fn error(candidate: Candidate, err: impl Into<String>) -> Self {
        Self {
            candidate,
            status: ProbeStatus::Error(err.into()),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.status == ProbeStatus::Reachable
    }
}

/// Final sorted and deduplicated list of live candidates for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    pub host: String,
    pub candidates: Vec<Candidate>,
}

impl ResultSet {
    pub fn new(host: &str, candidates: impl IntoIterator<Item = Candidate>) -> Self {
        let candidates: BTreeSet<Candidate> = candidates.into_iter().collect();
        Self {
            host: host.to_string(),
            candidates: candidates.into_iter().collect(),
        }
    }

    /// Pre-supplied lists are taken as already live.
    pub fn from_listed(host: &str, candidates: Vec<Candidate>) -> Self {
        Self::new(host, candidates)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

// endregion:     --- Models

// region:        --- Exporting utils

pub fn export_to_json(result: &ResultSet, path: &Path) -> Result<()> {
    let json = to_string_pretty(result)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

// endregion:     --- Exporting utils

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(names: &[&str]) -> Vec<Candidate> {
        names.iter().filter_map(|name| Candidate::new(name)).collect()
    }

    #[test]
    fn candidate_is_trimmed_and_non_empty() {
        assert_eq!(
            Some("foo.example.com"),
            Candidate::new("  foo.example.com\t").as_ref().map(Candidate::as_str)
        );
        assert_eq!(None, Candidate::new("   "));
        assert!(Candidate::try_from("").is_err());
    }

    #[test]
    fn result_set_is_sorted_and_deduplicated() {
        let set = ResultSet::new(
            "example.com",
            candidates(&["b.example.com", "a.example.com", "b.example.com"]),
        );

        assert_eq!(candidates(&["a.example.com", "b.example.com"]), set.candidates);
    }

    #[test]
    fn result_set_orders_bytewise() {
        let set = ResultSet::new("example.com", candidates(&["b", "B", "a", "A"]));
        let names: Vec<&str> = set.candidates.iter().map(Candidate::as_str).collect();

        assert_eq!(vec!["A", "B", "a", "b"], names);
    }

    #[test]
    fn json_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        let set = ResultSet::new("example.com", candidates(&["x.example.com"]));

        export_to_json(&set, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!("example.com", value["host"]);
        assert_eq!("x.example.com", value["candidates"][0]);
    }
}
