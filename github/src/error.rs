use thiserror::Error;

/// Failures surfaced by the GitHub collaborator.
///
/// Transport, authentication and rate-limit problems all end up here; they
/// are never swallowed and never reach the engine, which operates only on
/// fully-assembled snapshots.
#[derive(Debug, Error)]
pub enum GithubError {
    /// Connection, TLS or body-decoding failure from the HTTP stack.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response from the API.
    #[error("github api returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The configured base URL does not parse.
    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),

    /// The supplied token cannot be carried in an HTTP header.
    #[error("token is not a valid header value")]
    InvalidToken,
}
