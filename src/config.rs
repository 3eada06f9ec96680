use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::certs::CertificateBundle;
use crate::error::{Error, Result};

pub const PRODUCTION_URL: &str = "https://appapi2.bankid.com/rp/v6.0";
pub const TEST_URL: &str = "https://appapi2.test.bankid.com/rp/v6.0";
/// Passphrase of the publicly distributed RP test certificate.
pub const TEST_PASSPHRASE: &str = "qwerty123";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const TEST_HOST: &str = "appapi2.test.bankid.com";

/// Which BankID installation the client talks to. Production and test differ
/// only in host and in the root CA that signs the server certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Test,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_URL,
            Environment::Test => TEST_URL,
        }
    }

    /// Infers the environment from a base URL; anything that is not the test
    /// host is treated as production.
    pub fn from_url(url: &str) -> Self {
        match reqwest::Url::parse(url) {
            Ok(parsed) if parsed.host_str() == Some(TEST_HOST) => Environment::Test,
            _ => Environment::Production,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => f.write_str("production"),
            Environment::Test => f.write_str("test"),
        }
    }
}

/// Root certificates used when a bundle carries no explicit root CA.
///
/// The crate ships no certificates of its own; whoever packages the client
/// registers the published BankID roots here.
#[derive(Clone, Default)]
pub struct DefaultRoots {
    pub production: Option<Vec<u8>>,
    pub test: Option<Vec<u8>>,
}

impl DefaultRoots {
    pub fn for_environment(&self, environment: Environment) -> Option<&[u8]> {
        match environment {
            Environment::Production => self.production.as_deref(),
            Environment::Test => self.test.as_deref(),
        }
    }
}

impl fmt::Debug for DefaultRoots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultRoots")
            .field("production", &self.production.is_some())
            .field("test", &self.test.is_some())
            .finish()
    }
}

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub environment: Environment,
    pub timeout: Duration,
    pub certificate: CertificateBundle,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    url: Option<String>,
    environment: Option<Environment>,
    timeout: Option<Duration>,
    certificate: Option<CertificateBundle>,
    default_roots: DefaultRoots,
}

impl ClientConfigBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Selects an environment. Without an explicit URL this also selects the
    /// environment's base URL.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout(Duration::from_secs(secs))
    }

    pub fn certificate(mut self, certificate: CertificateBundle) -> Self {
        self.certificate = Some(certificate);
        self
    }

    pub fn default_roots(mut self, roots: DefaultRoots) -> Self {
        self.default_roots = roots;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let explicit_url = self
            .url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let environment = match (self.environment, explicit_url.as_deref()) {
            (Some(environment), _) => environment,
            (None, Some(url)) => Environment::from_url(url),
            (None, None) => Environment::Production,
        };
        let base_url = explicit_url.unwrap_or_else(|| environment.base_url().to_string());

        let parsed = reqwest::Url::parse(&base_url)
            .map_err(|err| Error::Configuration(format!("invalid base URL {base_url}: {err}")))?;
        if parsed.scheme() != "https" {
            return Err(Error::Configuration(format!(
                "base URL must use https, got {}",
                parsed.scheme()
            )));
        }

        let timeout = match self.timeout {
            None => DEFAULT_TIMEOUT,
            Some(timeout) if timeout.is_zero() => {
                warn!("[bankid-config] zero timeout requested; using default");
                DEFAULT_TIMEOUT
            }
            Some(timeout) => timeout,
        };

        let mut certificate = self.certificate.ok_or_else(|| {
            Error::Configuration("a client certificate bundle is required".to_string())
        })?;
        if certificate.root_ca().is_none()
            && let Some(root) = self.default_roots.for_environment(environment)
        {
            certificate = certificate.with_root_ca(root.to_vec());
        }

        Ok(ClientConfig {
            base_url,
            environment,
            timeout,
            certificate,
        })
    }
}

/// File-based configuration, shaped for loading from JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    #[serde(default)]
    pub url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    pub passphrase: String,
    pub ssl_certificate_path: PathBuf,
    #[serde(default)]
    pub ca_certificate_path: Option<PathBuf>,
}

impl ClientSettings {
    /// Reads the referenced certificate files and returns a builder seeded
    /// with these settings.
    pub fn into_builder(self) -> Result<ClientConfigBuilder> {
        let certificate = CertificateBundle::from_paths(
            &self.ssl_certificate_path,
            self.passphrase,
            self.ca_certificate_path.as_deref(),
        )?;
        let mut builder = ClientConfig::builder().certificate(certificate);
        if let Some(url) = self.url {
            builder = builder.url(url);
        }
        if let Some(secs) = self.timeout {
            builder = builder.timeout_secs(secs);
        }
        Ok(builder)
    }
}
