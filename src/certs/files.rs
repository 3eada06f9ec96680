use std::fs;
use std::path::Path;

use log::debug;

use super::KeyMaterial;
use crate::error::CertificateError;

const PEM_ARMOUR: &[u8] = b"-----BEGIN ";

pub(super) fn read_file(path: &Path) -> Result<Vec<u8>, CertificateError> {
    debug!("[bankid-certs] reading {}", path.display());
    fs::read(path).map_err(|source| CertificateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn detect_material(bytes: Vec<u8>) -> KeyMaterial {
    if bytes.windows(PEM_ARMOUR.len()).any(|window| window == PEM_ARMOUR) {
        KeyMaterial::Pem(bytes)
    } else {
        KeyMaterial::Pkcs12(bytes)
    }
}
