//! Relying-party client for the BankID RP API (v6).
//!
//! Builds a mutual-TLS transport from the RP certificate, validates and
//! sends auth/sign orders, polls them to completion and derives the
//! animated QR code payloads.

pub mod certs;
pub mod client;
pub mod config;
pub mod error;
pub mod orders;
pub mod qr;
pub mod transport;

pub use certs::{CertificateBundle, ClientIdentity, KeyMaterial};
pub use client::BankIdClient;
pub use config::{
    ClientConfig, ClientConfigBuilder, ClientSettings, DEFAULT_TIMEOUT, DefaultRoots, Environment,
    PRODUCTION_URL, TEST_PASSPHRASE, TEST_URL,
};
pub use error::{CallerAction, CertificateError, Error, ErrorCode, Result, StructuredError};
pub use orders::{
    AuthRequest, CollectResponse, CompletionData, DisplayText, HintCode, OrderHandle,
    OrderRequest, OrderResponse, OrderUpdates, PhoneAuthRequest, PhoneSignRequest, Requirement,
    SignRequest, Status,
};
pub use qr::{QrSession, generate_qr_payload};
pub use tokio_util::sync::CancellationToken;
