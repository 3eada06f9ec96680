use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};
use openssl::ec::EcKey;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::X509;
use pem::Pem;
use x509_parser::parse_x509_certificate;
use zeroize::Zeroizing;

use super::{CertificateBundle, KeyMaterial};
use crate::config::Environment;
use crate::error::CertificateError;

const CERTIFICATE_TAG: &str = "CERTIFICATE";
const PKCS8_TAG: &str = "PRIVATE KEY";
const ENCRYPTED_PKCS8_TAG: &str = "ENCRYPTED PRIVATE KEY";
const EC_KEY_TAG: &str = "EC PRIVATE KEY";
const RSA_KEY_TAG: &str = "RSA PRIVATE KEY";

/// Decoded client identity ready to be handed to the TLS layer.
pub struct ClientIdentity {
    pub private_key: PKey<Private>,
    pub leaf: X509,
    /// Intermediates shipped alongside the leaf.
    pub chain: Vec<X509>,
    /// Trust anchors for the server certificate.
    pub roots: Vec<X509>,
    pub not_after: DateTime<Utc>,
}

impl ClientIdentity {
    /// Leaf plus chain as PEM, and the private key as PKCS#8 PEM.
    pub fn to_pem_pair(&self) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>), CertificateError> {
        let mut certs = self
            .leaf
            .to_pem()
            .map_err(|err| CertificateError::Pem(err.to_string()))?;
        for cert in &self.chain {
            let pem = cert
                .to_pem()
                .map_err(|err| CertificateError::Pem(err.to_string()))?;
            certs.extend_from_slice(&pem);
        }
        let key = self
            .private_key
            .private_key_to_pem_pkcs8()
            .map_err(|err| CertificateError::Pem(err.to_string()))?;
        Ok((certs, Zeroizing::new(key)))
    }

    pub fn is_expired(&self) -> bool {
        self.not_after <= Utc::now()
    }
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("chain", &self.chain.len())
            .field("roots", &self.roots.len())
            .field("not_after", &self.not_after)
            .finish_non_exhaustive()
    }
}

pub(super) fn load(
    bundle: &CertificateBundle,
    environment: Environment,
) -> Result<ClientIdentity, CertificateError> {
    let (private_key, leaf, chain) = match bundle.key_material() {
        KeyMaterial::Pkcs12(der) => from_pkcs12(der, bundle.passphrase())?,
        KeyMaterial::Pem(pem) => from_pem(pem, bundle.passphrase())?,
    };

    let root_ca = bundle
        .root_ca()
        .ok_or(CertificateError::MissingRoot(environment))?;
    let roots = parse_roots(root_ca)?;

    let not_after = check_validity(&leaf)?;
    debug!(
        "[bankid-certs] loaded client identity with {} chain and {} root certificates",
        chain.len(),
        roots.len()
    );

    Ok(ClientIdentity {
        private_key,
        leaf,
        chain,
        roots,
        not_after,
    })
}

type Parts = (PKey<Private>, X509, Vec<X509>);

fn from_pkcs12(der: &[u8], passphrase: &str) -> Result<Parts, CertificateError> {
    let parsed = Pkcs12::from_der(der)
        .and_then(|container| container.parse2(passphrase))
        .map_err(|err| CertificateError::Pkcs12(err.to_string()))?;
    let private_key = parsed.pkey.ok_or(CertificateError::MissingPrivateKey)?;
    let leaf = parsed.cert.ok_or(CertificateError::MissingCertificate)?;
    let chain = parsed
        .ca
        .map(|stack| stack.into_iter().collect())
        .unwrap_or_default();
    Ok((private_key, leaf, chain))
}

fn from_pem(raw: &[u8], passphrase: &str) -> Result<Parts, CertificateError> {
    let blocks = pem::parse_many(raw).map_err(|err| CertificateError::Pem(err.to_string()))?;

    let mut certificates = Vec::new();
    let mut private_key = None;
    for block in &blocks {
        match block.tag() {
            CERTIFICATE_TAG => certificates.push(
                X509::from_der(block.contents())
                    .map_err(|err| CertificateError::Pem(err.to_string()))?,
            ),
            _ if private_key.is_some() => {}
            tag => private_key = decode_key(tag, block, raw, passphrase)?,
        }
    }

    let private_key = private_key.ok_or(CertificateError::MissingPrivateKey)?;
    let mut certificates = certificates.into_iter();
    let leaf = certificates
        .next()
        .ok_or(CertificateError::MissingCertificate)?;
    Ok((private_key, leaf, certificates.collect()))
}

fn decode_key(
    tag: &str,
    block: &Pem,
    raw: &[u8],
    passphrase: &str,
) -> Result<Option<PKey<Private>>, CertificateError> {
    let key = match tag {
        ENCRYPTED_PKCS8_TAG => {
            PKey::private_key_from_pkcs8_passphrase(block.contents(), passphrase.as_bytes())
                .map_err(|err| CertificateError::Decrypt(err.to_string()))?
        }
        PKCS8_TAG => PKey::private_key_from_pkcs8(block.contents())
            .map_err(|err| CertificateError::Pem(err.to_string()))?,
        EC_KEY_TAG | RSA_KEY_TAG if is_legacy_encrypted(block) => {
            // OpenSSL skips the certificate blocks and decrypts the first key it finds.
            PKey::private_key_from_pem_passphrase(raw, passphrase.as_bytes())
                .map_err(|err| CertificateError::Decrypt(err.to_string()))?
        }
        EC_KEY_TAG => EcKey::private_key_from_der(block.contents())
            .and_then(PKey::from_ec_key)
            .map_err(|err| CertificateError::Pem(err.to_string()))?,
        RSA_KEY_TAG => Rsa::private_key_from_der(block.contents())
            .and_then(PKey::from_rsa)
            .map_err(|err| CertificateError::Pem(err.to_string()))?,
        other => {
            debug!("[bankid-certs] ignoring PEM block {other}");
            return Ok(None);
        }
    };
    Ok(Some(key))
}

fn is_legacy_encrypted(block: &Pem) -> bool {
    block
        .headers()
        .get("Proc-Type")
        .is_some_and(|value| value.contains("ENCRYPTED"))
}

fn parse_roots(raw: &[u8]) -> Result<Vec<X509>, CertificateError> {
    let blocks = pem::parse_many(raw).unwrap_or_default();
    let mut roots = Vec::new();
    for block in blocks.iter().filter(|block| block.tag() == CERTIFICATE_TAG) {
        roots.push(
            X509::from_der(block.contents())
                .map_err(|err| CertificateError::RootCa(err.to_string()))?,
        );
    }
    if roots.is_empty() {
        // Not PEM; accept a single DER certificate.
        let root = X509::from_der(raw).map_err(|_| {
            CertificateError::RootCa("no certificate found in root CA material".to_string())
        })?;
        roots.push(root);
    }
    Ok(roots)
}

fn check_validity(leaf: &X509) -> Result<DateTime<Utc>, CertificateError> {
    let der = leaf
        .to_der()
        .map_err(|err| CertificateError::Pem(err.to_string()))?;
    let (_, cert) = parse_x509_certificate(&der)
        .map_err(|err| CertificateError::Pem(format!("failed to parse client certificate: {err}")))?;
    let validity = cert.validity();
    let not_after = Utc
        .timestamp_opt(validity.not_after.timestamp(), 0)
        .single()
        .unwrap_or_else(Utc::now);
    if !validity.is_valid() {
        warn!(
            "[bankid-certs] client certificate {} is outside its validity period (not after {not_after})",
            cert.subject()
        );
    }
    Ok(not_after)
}
