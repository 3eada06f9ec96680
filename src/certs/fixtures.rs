//! Throwaway PKI for certificate and transport tests.

use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::symm::Cipher;
use openssl::x509::X509;
use rcgen::{BasicConstraints, CertificateParams, IsCa, KeyPair};

pub(crate) const PASSPHRASE: &str = "qwerty123";

pub(crate) struct SamplePki {
    ca: X509,
    leaf: X509,
    key: PKey<Private>,
}

pub(crate) fn sample_pki() -> SamplePki {
    let mut ca_params =
        CertificateParams::new(vec!["bankid-test-root".to_string()]).expect("ca params");
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let ca_key = KeyPair::generate().expect("ca key");
    let ca = ca_params.self_signed(&ca_key).expect("create ca cert");

    let mut leaf_params =
        CertificateParams::new(vec!["rp.example.com".to_string()]).expect("leaf params");
    leaf_params.is_ca = IsCa::NoCa;
    let leaf_key = KeyPair::generate().expect("leaf key");
    let leaf = leaf_params
        .signed_by(&leaf_key, &ca, &ca_key)
        .expect("create leaf cert");

    SamplePki {
        ca: X509::from_pem(ca.pem().as_bytes()).expect("ca to openssl"),
        leaf: X509::from_pem(leaf.pem().as_bytes()).expect("leaf to openssl"),
        key: PKey::private_key_from_pem(leaf_key.serialize_pem().as_bytes())
            .expect("key to openssl"),
    }
}

impl SamplePki {
    pub(crate) fn ca_pem(&self) -> Vec<u8> {
        self.ca.to_pem().expect("ca pem")
    }

    pub(crate) fn ca_der(&self) -> Vec<u8> {
        self.ca.to_der().expect("ca der")
    }

    pub(crate) fn leaf_pem(&self) -> Vec<u8> {
        self.leaf.to_pem().expect("leaf pem")
    }

    pub(crate) fn pkcs8_pem(&self) -> Vec<u8> {
        self.key.private_key_to_pem_pkcs8().expect("pkcs8 pem")
    }

    pub(crate) fn encrypted_pkcs8_pem(&self, passphrase: &str) -> Vec<u8> {
        self.key
            .private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), passphrase.as_bytes())
            .expect("encrypted pkcs8 pem")
    }

    pub(crate) fn ec_pem(&self) -> Vec<u8> {
        self.key
            .ec_key()
            .expect("ec key")
            .private_key_to_pem()
            .expect("ec pem")
    }

    pub(crate) fn legacy_encrypted_ec_pem(&self, passphrase: &str) -> Vec<u8> {
        self.key
            .ec_key()
            .expect("ec key")
            .private_key_to_pem_passphrase(Cipher::aes_128_cbc(), passphrase.as_bytes())
            .expect("legacy encrypted ec pem")
    }

    pub(crate) fn pkcs12(&self, passphrase: &str) -> Vec<u8> {
        Pkcs12::builder()
            .name("rp")
            .pkey(&self.key)
            .cert(&self.leaf)
            .build2(passphrase)
            .expect("build pkcs12")
            .to_der()
            .expect("pkcs12 der")
    }
}
