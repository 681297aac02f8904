use reqwest::Url;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::config::AuthPolicy;
use crate::error::{Error, Result};

/// Recorded result of the credential probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProbeOutcome {
    Passed,
    /// Non-200 response.
    Rejected(u16),
    /// The probe never reached the service.
    Unreachable(String),
}

const EDL_HOST_SUFFIX: &str = "urs.earthdata.nasa.gov";

/// Earthdata Login hosts, e.g. `urs.earthdata.nasa.gov` or `uat.urs.earthdata.nasa.gov`.
pub(crate) fn is_edl_host(host: &str) -> bool {
    host.to_ascii_lowercase().ends_with(EDL_HOST_SUFFIX)
}

/// Whether a redirect from `from` to `to` may carry the `Authorization` header.
pub(crate) fn keeps_credentials(from: &Url, to: &Url) -> bool {
    let same_host = from.host_str() == to.host_str()
        && from.port_or_known_default() == to.port_or_known_default();
    same_host || to.host_str().is_some_and(is_edl_host)
}

/// Runs the credential probe at most once, shared by every clone of a client.
///
/// The lock is held while the probe is in flight, so a concurrent first caller
/// waits and then sees the recorded outcome instead of probing again.
#[derive(Debug, Clone)]
pub(crate) struct AuthGate {
    enabled: bool,
    policy: AuthPolicy,
    outcome: Arc<Mutex<Option<ProbeOutcome>>>,
}

impl AuthGate {
    pub(crate) fn new(enabled: bool, policy: AuthPolicy) -> Self {
        Self {
            enabled,
            policy,
            outcome: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn policy(&self) -> AuthPolicy {
        self.policy
    }

    /// Probes on first use, then applies the policy to the recorded outcome.
    pub(crate) fn ensure<F>(&self, probe: F) -> Result<()>
    where
        F: FnOnce() -> ProbeOutcome,
    {
        if !self.enabled {
            return Ok(());
        }

        let outcome = {
            let mut slot = self.outcome.lock().unwrap_or_else(|e| e.into_inner());
            match slot.as_ref() {
                Some(o) => o.clone(),
                None => {
                    let o = probe();
                    debug!(outcome = ?o, "credential probe finished");
                    if o != ProbeOutcome::Passed {
                        warn!(outcome = ?o, policy = ?self.policy, "credential verification failed");
                    }
                    *slot = Some(o.clone());
                    o
                }
            }
        };

        match (self.policy, outcome) {
            (_, ProbeOutcome::Passed) | (AuthPolicy::BestEffort, _) => Ok(()),
            (AuthPolicy::Strict, ProbeOutcome::Rejected(401)) => Err(Error::Authentication(
                "incorrect or missing credentials during credential verification".to_string(),
            )),
            (AuthPolicy::Strict, ProbeOutcome::Rejected(code)) => Err(Error::Authentication(
                format!(
                    "an unknown error occurred during credential verification: HTTP {}",
                    code
                ),
            )),
            (AuthPolicy::Strict, ProbeOutcome::Unreachable(msg)) => Err(Error::Authentication(
                format!("credential verification could not reach the service: {}", msg),
            )),
        }
    }

    #[cfg(test)]
    fn outcome(&self) -> Option<ProbeOutcome> {
        self.outcome.lock().unwrap().clone()
    }
}
