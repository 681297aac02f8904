use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the Harmony client.
#[derive(Debug, Error)]
pub enum Error {
    /// A request could not be built from the given arguments.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// The service was never reached (DNS, connect, TLS, timeout).
    #[error("could not reach {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success HTTP status.
    #[error("request failed: HTTP {status} for url ({url})\n{message}")]
    Status {
        status: StatusCode,
        url: String,
        message: String,
    },

    /// The service answered 200 but the body did not match the expected schema.
    #[error("malformed response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Credential verification failed and the client is configured to stop on it.
    #[error("authentication: {0}")]
    Authentication(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    /// Reached the service, but it rejected the request or misbehaved.
    Protocol,
    Authentication,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Status { .. } | Error::Malformed { .. } => ErrorKind::Protocol,
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct HarmonyErrorResponse {
    #[serde(default)]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    // Some endpoints respond with {"message": ...}
    #[serde(default)]
    pub(crate) message: Option<String>,
}

/// Builds the error for a non-success response, preferring the service's own error payload.
pub(crate) fn status_error(status: StatusCode, url: &str, body: &str) -> Error {
    let message = match serde_json::from_str::<HarmonyErrorResponse>(body) {
        Ok(e) if e.description.is_some() || e.message.is_some() => {
            let text = e.description.or(e.message).unwrap_or_default();
            match e.code {
                Some(code) if !code.is_empty() => format!("{}: {}", code, text),
                _ => text,
            }
        }
        _ => body.trim().to_string(),
    };

    let message = if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        format!(
            "Harmony authentication/authorization failed.\n- Check the Earthdata Login username and password (EDL_USERNAME / EDL_PASSWORD)\n- Ensure the collection's EULA has been accepted\n\nServer message: {}",
            message
        )
    } else {
        message
    };

    Error::Status {
        status,
        url: url.to_string(),
        message,
    }
}
