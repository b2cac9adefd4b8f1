// Error kinds shared across the loader, the service client and the dispatcher.
use std::path::PathBuf;

use thiserror::Error;

use crate::nlp::Capability;

/// Problems with the input file or the user's selection. Reported before any
/// remote call is made.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("the file has no 'Text' column")]
    MissingTextColumn,

    #[error("row {index} does not exist, the file has {len} rows")]
    RowOutOfRange { index: usize, len: usize },

    #[error("the selected text is empty")]
    EmptyText,

    #[error("select at least one capability to run")]
    NoCapabilities,

    #[error("unsupported file type '{0}', expected csv, xlsx, xls, ods or json")]
    UnsupportedFormat(String),

    #[error("could not parse {format} file: {message}")]
    Parse { format: &'static str, message: String },

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a single remote call, as classified by the service client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    #[error("request rejected: {0}")]
    Request(String),

    #[error("credentials rejected: {0}")]
    Credential(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Contained failure of one capability. The run carries on without its data.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{capability} failed: {message}")]
pub struct CapabilityFailure {
    pub capability: Capability,
    pub message: String,
}

/// Fatal failures that abort the whole run with no partial results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("{capability} was refused because of the credentials: {message}")]
    Credential {
        capability: Capability,
        message: String,
    },

    #[error("{capability} could not reach the service: {message}")]
    Transport {
        capability: Capability,
        message: String,
    },
}

impl DispatchError {
    pub fn is_credential(&self) -> bool {
        matches!(self, DispatchError::Credential { .. })
    }
}
