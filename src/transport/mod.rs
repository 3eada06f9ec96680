use std::time::Duration;

use log::{debug, warn};
use reqwest::redirect::Policy;
use reqwest::tls::Version;
use reqwest::{Certificate, Client, Identity};

use crate::certs::ClientIdentity;
use crate::error::{Error, Result};

mod exchange;

pub use exchange::{Exchanger, Operation};

/// Builds the mutually authenticated HTTPS client. Only the roots carried by
/// `identity` are trusted; the platform trust store is never consulted.
/// Redirects are not followed, so a 3xx answer reaches the error classifier.
pub fn build_transport(identity: &ClientIdentity, timeout: Duration) -> Result<Client> {
    if identity.roots.is_empty() {
        return Err(Error::Configuration(
            "no root certificate to verify the server against".to_string(),
        ));
    }

    let leaf_key = identity
        .leaf
        .public_key()
        .map_err(|err| Error::Configuration(format!("client certificate has no public key: {err}")))?;
    if !leaf_key.public_eq(&identity.private_key) {
        return Err(Error::Configuration(
            "private key does not match the client certificate".to_string(),
        ));
    }
    if identity.is_expired() {
        warn!(
            "[bankid-http] client certificate expired at {}; the server will likely refuse it",
            identity.not_after
        );
    }

    let (certs_pem, key_pem) = identity.to_pem_pair()?;
    let client_identity = Identity::from_pkcs8_pem(&certs_pem, &key_pem)
        .map_err(|err| Error::Configuration(format!("failed to build TLS identity: {err}")))?;

    let mut builder = Client::builder()
        .use_native_tls()
        .tls_built_in_root_certs(false)
        .min_tls_version(Version::TLS_1_2)
        .identity(client_identity)
        .http1_only()
        .redirect(Policy::none())
        .timeout(timeout);

    for root in &identity.roots {
        let der = root
            .to_der()
            .map_err(|err| Error::Configuration(format!("failed to encode root certificate: {err}")))?;
        let certificate = Certificate::from_der(&der)
            .map_err(|err| Error::Configuration(format!("invalid root certificate: {err}")))?;
        builder = builder.add_root_certificate(certificate);
    }

    debug!(
        "[bankid-http] transport ready with {} trusted root(s), timeout {}s",
        identity.roots.len(),
        timeout.as_secs()
    );
    builder
        .build()
        .map_err(|err| Error::Configuration(format!("failed to build HTTP client: {err}")))
}
