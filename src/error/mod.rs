use std::path::PathBuf;

use thiserror::Error;

use crate::config::Environment;

pub mod remote;

pub use remote::{CallerAction, ErrorCode, StructuredError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while turning certificate material into a client identity.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode PKCS#12 container: {0}")]
    Pkcs12(String),
    #[error("failed to decode PEM data: {0}")]
    Pem(String),
    #[error("failed to decrypt private key: {0}")]
    Decrypt(String),
    #[error("no private key found in certificate material")]
    MissingPrivateKey,
    #[error("no client certificate found in certificate material")]
    MissingCertificate,
    #[error("root certificate could not be parsed: {0}")]
    RootCa(String),
    #[error("no root certificate supplied and no default registered for the {0} environment")]
    MissingRoot(Environment),
}

/// Every failure the client can surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error("certificate error: {0}")]
    Certificate(#[from] CertificateError),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("required input is missing: {0}")]
    RequiredInputMissing(String),
    #[error("invalid input: {0}")]
    InputInvalid(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("{0}")]
    Remote(StructuredError),
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// Whether the caller may retry the same call without changing it.
    /// Transport failures are left to the caller's own retry policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Remote(remote) => remote.is_retryable(),
            _ => false,
        }
    }

    /// Whether the failure is meant to be communicated to the end user.
    pub fn should_inform_user(&self) -> bool {
        match self {
            Error::Remote(remote) => remote.should_inform_user(),
            Error::Unknown(_) => true,
            _ => false,
        }
    }

    /// Whether the failure points at a defect in the calling code or its setup.
    pub fn is_caller_fault(&self) -> bool {
        match self {
            Error::RequiredInputMissing(_)
            | Error::InputInvalid(_)
            | Error::Configuration(_)
            | Error::Certificate(_) => true,
            Error::Remote(remote) => remote.is_caller_fault(),
            _ => false,
        }
    }

    pub fn remote(&self) -> Option<&StructuredError> {
        match self {
            Error::Remote(remote) => Some(remote),
            _ => None,
        }
    }
}

impl From<StructuredError> for Error {
    fn from(value: StructuredError) -> Self {
        Error::Remote(value)
    }
}
