use crate::model::{Candidate, ProbeOutcome};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, trace};

/// Error page marker some targets serve with a success status.
pub const BAD_REQUEST_MARKER: &str = "400 Bad Request";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTarget {
    /// Candidate is a bare hostname, probed over `http://`.
    Host,
    /// Candidate is already a full URI.
    Uri,
}

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, candidate: Candidate) -> ProbeOutcome;
}

// region:        --- HTTP prober

#[derive(Debug, Clone)]
pub struct HttpProber {
    http_client: Client,
    target: ProbeTarget,
    inspect_body: bool,
}

impl HttpProber {
    pub fn new(timeout: Duration, target: ProbeTarget, inspect_body: bool) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        debug!("HTTP Client created: {:?}", http_client);

        Ok(Self {
            http_client,
            target,
            inspect_body,
        })
    }

    /// Subdomain mode: any response at all means the host is live.
    pub fn for_hosts(timeout: Duration) -> Result<Self> {
        Self::new(timeout, ProbeTarget::Host, false)
    }

    /// Dictionary mode: the body is checked for the bad request marker.
    pub fn for_uris(timeout: Duration) -> Result<Self> {
        Self::new(timeout, ProbeTarget::Uri, true)
    }

    pub fn url_for(&self, candidate: &Candidate) -> String {
        probe_url(self.target, candidate)
    }
}

#[async_trait]
impl Prober for HttpProber {
    #[instrument(name = "probe", level = "trace", fields(candidate = %candidate), skip_all)]
    async fn probe(&self, candidate: Candidate) -> ProbeOutcome {
        let url = self.url_for(&candidate);

        let res = match self.http_client.get(&url).send().await {
            Ok(res) => res,
            Err(err) => {
                trace!("Transport failure: {}", err);
                return ProbeOutcome::unreachable(candidate, err.to_string());
            }
        };
        trace!("Receive with status: {}", res.status());

        if !self.inspect_body {
            return ProbeOutcome::reachable(candidate);
        }

        match res.text().await {
            Ok(body) if is_bad_request(&body) => {
                ProbeOutcome::unreachable(candidate, BAD_REQUEST_MARKER)
            }
            Ok(_) => ProbeOutcome::reachable(candidate),
            Err(err) => ProbeOutcome::error(candidate, err.to_string()),
        }
    }
}

// endregion:     --- HTTP prober

pub fn probe_url(target: ProbeTarget, candidate: &Candidate) -> String {
    match target {
        ProbeTarget::Host => format!("http://{}", candidate),
        ProbeTarget::Uri => candidate.to_string(),
    }
}

pub fn is_bad_request(body: &str) -> bool {
    body.contains(BAD_REQUEST_MARKER)
}
