use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, LOCATION, USER_AGENT};
use reqwest::{StatusCode, Url, redirect};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use crate::auth::{AuthGate, ProbeOutcome, keeps_credentials};
use crate::config::{AuthPolicy, ClientConfig, load_config};
use crate::error::{Error, Result, status_error};
use crate::job::{JobStatus, StatusView, SubmittedJob, parse_job_status};
use crate::request::Request;
use crate::util::{encode_segment, urljoin};

const MAX_REDIRECTS: usize = 10;

/// Blocking Harmony client.
///
/// Cheap to clone; clones share the HTTP connection pool and the credential check.
#[derive(Clone)]
pub struct Client {
    url: String,
    username: Option<String>,
    password: Option<String>,
    verify: bool,

    gate: AuthGate,
    http: HttpClient,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("verify", &self.verify)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client from environment variables, falling back to the UAT host.
    ///
    /// This is equivalent to `Client::new(None, None, None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None, None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit arguments
    /// - environment variables `HARMONY_URL`, `EDL_USERNAME`, `EDL_PASSWORD`, `HARMONY_VERIFY`
    /// - the UAT host, anonymous, TLS verification on
    pub fn new(
        url: Option<String>,
        username: Option<String>,
        password: Option<String>,
        verify: Option<bool>,
    ) -> Result<Self> {
        Self::with_config(load_config(url, username, password, verify)?)
    }

    pub fn with_config(cfg: ClientConfig) -> Result<Self> {
        cfg.validate()?;
        let http = build_http(cfg.timeout, cfg.verify)?;

        Ok(Self {
            url: cfg.url.trim_end_matches('/').to_string(),
            username: cfg.username,
            password: cfg.password,
            verify: cfg.verify,
            gate: AuthGate::new(cfg.validate_auth, cfg.auth_policy),
            http,
        })
    }

    /// Turns the one-time credential probe on or off. Resets the probe state.
    pub fn with_validate_auth(mut self, validate: bool) -> Self {
        self.gate = AuthGate::new(validate, self.gate.policy());
        self
    }

    /// Sets what a failed credential probe means. Resets the probe state.
    pub fn with_auth_policy(mut self, policy: AuthPolicy) -> Self {
        self.gate = AuthGate::new(self.gate.enabled(), policy);
        self
    }

    /// Rebuilds the HTTP client with a new per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = build_http(timeout, self.verify)?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Submits `request` and returns the id of the job the service created.
    ///
    /// Verifies credentials first if this is the client's first submission.
    pub fn submit(&self, request: &Request) -> Result<String> {
        self.gate.ensure(|| self.probe())?;

        let url = request.submit_url(&self.url);
        let text = self.get_text(&url)?;
        let job: SubmittedJob = serde_json::from_str(&text)
            .map_err(|source| Error::Malformed { url: url.clone(), source })?;

        info!(job_id = %job.job_id, collection = request.collection().id(), "job submitted");
        Ok(job.job_id)
    }

    /// Fetches the current state of a job, or only its progress when `progress_only` is set.
    ///
    /// This is a single request; poll by calling it repeatedly.
    pub fn status(&self, job_id: &str, progress_only: bool) -> Result<StatusView> {
        let status = self.job_status(job_id)?;
        Ok(if progress_only {
            StatusView::Progress(status.progress)
        } else {
            StatusView::Record(status)
        })
    }

    pub fn job_status(&self, job_id: &str) -> Result<JobStatus> {
        let url = self.status_url(job_id);
        let text = self.get_text(&url)?;
        parse_job_status(&text).map_err(|source| Error::Malformed { url, source })
    }

    /// Percentage complete, 0 to 100.
    pub fn progress(&self, job_id: &str) -> Result<u8> {
        Ok(self.job_status(job_id)?.progress)
    }

    pub fn status_url(&self, job_id: &str) -> String {
        urljoin(&self.url, &format!("jobs/{}", encode_segment(job_id)))
    }

    fn probe(&self) -> ProbeOutcome {
        let url = urljoin(&self.url, "jobs");
        debug!(%url, "verifying credentials");
        match self.send_get(&url) {
            Ok(resp) if resp.status() == StatusCode::OK => ProbeOutcome::Passed,
            Ok(resp) => ProbeOutcome::Rejected(resp.status().as_u16()),
            Err(e) => ProbeOutcome::Unreachable(e.to_string()),
        }
    }

    fn apply_auth(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(u) => req.basic_auth(u, self.password.as_deref()),
            None => req,
        }
    }

    /// GETs `url`, following redirects by hand.
    ///
    /// Credentials stay on the request only while each hop targets the same host
    /// or an Earthdata Login host; once dropped they are not re-added. Login
    /// cookies set along the way are kept by the client's cookie store.
    fn send_get(&self, url: &str) -> reqwest::Result<Response> {
        let mut with_auth = true;
        let mut resp = self.apply_auth(self.http.get(url)).send()?;

        for _ in 0..MAX_REDIRECTS {
            if !resp.status().is_redirection() {
                break;
            }
            let Some(next) = redirect_target(&resp) else {
                break;
            };
            with_auth = with_auth && keeps_credentials(resp.url(), &next);
            debug!(from = %resp.url(), to = %next, with_auth, "following redirect");

            let req = self.http.get(next);
            let req = if with_auth { self.apply_auth(req) } else { req };
            resp = req.send()?;
        }
        Ok(resp)
    }

    /// GETs `url` and returns the body of a 200 response.
    fn get_text(&self, url: &str) -> Result<String> {
        debug!(%url, "GET");
        let resp = self
            .send_get(url)
            .map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        let text = resp.text().map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;
        if status != StatusCode::OK {
            return Err(status_error(status, url, &text));
        }
        Ok(text)
    }
}

fn redirect_target(resp: &Response) -> Option<Url> {
    let location = resp.headers().get(LOCATION)?.to_str().ok()?;
    resp.url().join(location).ok()
}

fn build_http(timeout: Duration, verify: bool) -> Result<HttpClient> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("harmony-client-rs/{}", env!("CARGO_PKG_VERSION")))
            .unwrap_or(HeaderValue::from_static("harmony-client-rs")),
    );

    let mut builder = HttpClient::builder()
        .default_headers(default_headers)
        .redirect(redirect::Policy::none())
        .cookie_store(true)
        .timeout(timeout);

    if !verify {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))
}
