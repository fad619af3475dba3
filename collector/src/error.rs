use std::{path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Usage: collector -f <domains.txt> | -d <domain>")]
    NoTarget,
    #[error("reading domain list {path}: {source}")]
    DomainList {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("missing scan output {path}: {source}")]
    ScanOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("missing report asset {path}: {source}")]
    Asset {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("spawning {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{0} timed out after {1:?}")]
    ToolTimeout(String, Duration),
    #[error("dns: {0}")]
    Resolve(#[from] trust_dns_resolver::error::ResolveError),
    #[error("{0}: no address found")]
    NoAddress(String),
    #[error("Reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("{0}: Invalid HTTP response")]
    InvalidHttpResponse(String),
    #[error("url: {0}")]
    Url(#[from] url::ParseError),
    #[error("concurrency pool closed: {0}")]
    PoolClosed(#[from] tokio::sync::AcquireError),
    #[error("tokio join error: {0}")]
    TokioJoinError(#[from] tokio::task::JoinError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}
