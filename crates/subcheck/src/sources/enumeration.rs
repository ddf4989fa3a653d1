use super::CandidateSource;
use crate::model::Candidate;
use crate::{Error, Result};
use async_trait::async_trait;
use lazy_regex::regex;
use std::env;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, trace};

pub const SUBLIST3R_ENV: &str = "SUBLIST3R_PY";
pub const DEFAULT_INTERPRETER: &str = "python";

#[derive(Debug, Clone)]
pub struct EnumerationConfig {
    pub domain: String,
    /// Explicit tool path, takes precedence over `SUBLIST3R_PY`.
    pub tool_path: Option<String>,
    pub interpreter: String,
}

impl EnumerationConfig {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            tool_path: None,
            interpreter: DEFAULT_INTERPRETER.to_string(),
        }
    }
}

// region:        --- Source info

/// Runs an external subdomain enumeration tool and parses its output.
#[derive(Debug)]
pub struct ExternalEnumeration {
    domain: String,
    tool_path: String,
    interpreter: String,
}

impl ExternalEnumeration {
    pub fn new(config: EnumerationConfig) -> Result<Self> {
        let tool_path = resolve_tool_path(config.tool_path.as_deref(), env::var(SUBLIST3R_ENV).ok())?;
        Self::with_tool_path(config, tool_path)
    }

    fn with_tool_path(config: EnumerationConfig, tool_path: String) -> Result<Self> {
        if config.domain.trim().is_empty() {
            return Err(Error::configuration("--host required"));
        }
        Ok(Self {
            domain: config.domain,
            tool_path,
            interpreter: config.interpreter,
        })
    }
}

// endregion:     --- Source info

#[async_trait]
impl CandidateSource for ExternalEnumeration {
    fn name(&self) -> String {
        "sources/enumeration".to_string()
    }

    fn description(&self) -> String {
        format!("Enumerate subdomains with {}", self.tool_path)
    }

    #[instrument(name = "enumerate", level = "info", fields(source = %self.name()), skip_all)]
    async fn enumerate(&self) -> Result<Vec<Candidate>> {
        info!("Finding subdomains for http://{}", self.domain);

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&self.tool_path)
            .arg("-d")
            .arg(&self.domain)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        debug!(
            "{:12} - {} {} -d {}",
            "COMMAND LINE", self.interpreter, self.tool_path, self.domain
        );

        let output = cmd.output().await.map_err(|err| {
            Error::execution(format!("unable to start {}: {}", self.interpreter, err))
        })?;

        if !output.status.success() {
            return Err(Error::execution(format!(
                "{} {} exited with {}",
                self.interpreter, self.tool_path, output.status
            )));
        }

        let candidates = parse_output(&String::from_utf8_lossy(&output.stdout));
        debug!("{} collected", candidates.len());
        Ok(candidates)
    }
}

// region:        --- Helpers

/// Explicit parameter first, then the environment fallback. Empty values count as unset.
pub fn resolve_tool_path(explicit: Option<&str>, env_value: Option<String>) -> Result<String> {
    explicit
        .map(str::to_string)
        .filter(|path| !path.trim().is_empty())
        .or_else(|| env_value.filter(|path| !path.trim().is_empty()))
        .ok_or_else(|| {
            Error::configuration(format!(
                "set either --sublist3r or the {} env variable",
                SUBLIST3R_ENV
            ))
        })
}

/// Keeps only the lines shaped like a hostname, once colors are stripped.
pub fn parse_output(stdout: &str) -> Vec<Candidate> {
    let color_regex = regex!(r"\x1B\[([0-9]{1,3}(;[0-9]{1,2})?)?[mGK]");
    let host_regex = regex!(r"^[a-zA-Z0-9_-]+(?:\.[a-zA-Z0-9_-]+)+$");

    stdout
        .lines()
        .map(|line| color_regex.replace_all(line, "").trim().to_string())
        .filter(|line| host_regex.is_match(line))
        .filter_map(|line| Candidate::new(&line))
        .inspect(|candidate| trace!("Collecting: {:?}", candidate.as_str()))
        .collect()
}

// endregion:     --- Helpers
