use shared::error::ExamIdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    InvalidExamId(#[from] ExamIdError),
    #[error("event stream is not connected")]
    NotConnected,
    /// Non-success HTTP response; `detail` is what the server said (or a fallback).
    #[error("{detail}")]
    Request { status: u16, detail: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("event stream transport failed: {0}")]
    Transport(String),
    #[error("unsupported server url scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("no results available to download")]
    NothingToDownload,
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
