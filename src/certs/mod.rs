use std::fmt;
use std::path::Path;

use zeroize::Zeroizing;

use crate::config::Environment;
use crate::error::CertificateError;

mod files;
mod loader;

#[cfg(test)]
pub(crate) mod fixtures;

pub use loader::ClientIdentity;

/// The encoding the client key and certificate arrive in.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// A PKCS#12 (`.p12`/`.pfx`) container.
    Pkcs12(Vec<u8>),
    /// One or more PEM blocks holding the certificate and its private key.
    Pem(Vec<u8>),
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Pkcs12(der) => write!(f, "Pkcs12({} bytes)", der.len()),
            KeyMaterial::Pem(pem) => write!(f, "Pem({} bytes)", pem.len()),
        }
    }
}

/// Client certificate material plus the root CA that must sign the server.
/// Immutable once built; the passphrase is wiped from memory on drop.
#[derive(Clone)]
pub struct CertificateBundle {
    key_material: KeyMaterial,
    passphrase: Zeroizing<String>,
    root_ca: Option<Vec<u8>>,
}

impl CertificateBundle {
    pub fn pkcs12(der: impl Into<Vec<u8>>, passphrase: impl Into<String>) -> Self {
        Self::new(KeyMaterial::Pkcs12(der.into()), passphrase)
    }

    /// PEM material with the certificate and key in a single buffer.
    pub fn pem(pem: impl Into<Vec<u8>>, passphrase: impl Into<String>) -> Self {
        Self::new(KeyMaterial::Pem(pem.into()), passphrase)
    }

    /// PEM material supplied as separate certificate and key buffers.
    pub fn pem_pair(
        certificate: impl AsRef<[u8]>,
        private_key: impl AsRef<[u8]>,
        passphrase: impl Into<String>,
    ) -> Self {
        let mut joined = certificate.as_ref().to_vec();
        if !joined.ends_with(b"\n") {
            joined.push(b'\n');
        }
        joined.extend_from_slice(private_key.as_ref());
        Self::pem(joined, passphrase)
    }

    /// Reads certificate material (and optionally a root CA) from disk.
    /// PEM is recognised by its armour; anything else is treated as PKCS#12.
    pub fn from_paths(
        certificate_path: impl AsRef<Path>,
        passphrase: impl Into<String>,
        root_ca_path: Option<&Path>,
    ) -> Result<Self, CertificateError> {
        let bytes = files::read_file(certificate_path.as_ref())?;
        let material = files::detect_material(bytes);
        let mut bundle = Self::new(material, passphrase);
        if let Some(path) = root_ca_path {
            bundle.root_ca = Some(files::read_file(path)?);
        }
        Ok(bundle)
    }

    fn new(key_material: KeyMaterial, passphrase: impl Into<String>) -> Self {
        Self {
            key_material,
            passphrase: Zeroizing::new(passphrase.into()),
            root_ca: None,
        }
    }

    pub fn with_root_ca(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.root_ca = Some(pem.into());
        self
    }

    pub fn key_material(&self) -> &KeyMaterial {
        &self.key_material
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn root_ca(&self) -> Option<&[u8]> {
        self.root_ca.as_deref()
    }

    /// Decodes the bundle into a usable key, leaf certificate and trust roots.
    /// `environment` only names the endpoint in the error when no root is set.
    pub fn load(&self, environment: Environment) -> Result<ClientIdentity, CertificateError> {
        loader::load(self, environment)
    }
}

impl fmt::Debug for CertificateBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateBundle")
            .field("key_material", &self.key_material)
            .field("passphrase", &"<redacted>")
            .field("root_ca", &self.root_ca.as_ref().map(Vec::len))
            .finish()
    }
}
