use reqwest::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Which side of the pipeline an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Geolocation or forecast service unreachable, or its answer unusable.
    Upstream,
    /// Broker unreachable or the publish failed.
    Broker,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to reach {service}: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} request failed with status {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to parse {service} response: {source}")]
    Malformed {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("location has no coordinates")]
    MissingCoordinates,

    #[error("{service} returned an empty report")]
    EmptyReport { service: &'static str },

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("broker error: {0}")]
    Broker(#[from] lapin::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Request { .. }
            | Error::Status { .. }
            | Error::Malformed { .. }
            | Error::MissingCoordinates
            | Error::EmptyReport { .. } => ErrorKind::Upstream,
            Error::Encode(_) | Error::Broker(_) => ErrorKind::Broker,
        }
    }
}

/// Keeps error messages readable when an upstream answers with a large body.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
