//! Runs against the public BankID test environment. Needs an RP test
//! certificate and the test root CA on disk.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use bankid_rp::{
    AuthRequest, BankIdClient, CertificateBundle, ClientConfig, Environment, ErrorCode,
    OrderHandle, Status, TEST_PASSPHRASE,
};

struct LiveConfig {
    certificate: PathBuf,
    root_ca: PathBuf,
    passphrase: String,
}

fn load_live_config() -> Result<LiveConfig> {
    let certificate = env::var("BANKID_TEST_CERT_PATH").context("BANKID_TEST_CERT_PATH not set")?;
    let root_ca = env::var("BANKID_TEST_CA_PATH").context("BANKID_TEST_CA_PATH not set")?;
    let passphrase =
        env::var("BANKID_TEST_PASSPHRASE").unwrap_or_else(|_| TEST_PASSPHRASE.to_string());
    Ok(LiveConfig {
        certificate: certificate.into(),
        root_ca: root_ca.into(),
        passphrase,
    })
}

fn live_client() -> Result<BankIdClient> {
    let config = load_live_config()?;
    let bundle = CertificateBundle::from_paths(
        &config.certificate,
        config.passphrase,
        Some(config.root_ca.as_path()),
    )?;
    let client_config = ClientConfig::builder()
        .environment(Environment::Test)
        .certificate(bundle)
        .build()?;
    Ok(BankIdClient::new(client_config)?)
}

#[tokio::test]
async fn live_auth_collect_and_cancel() -> Result<()> {
    let client = live_client()?;
    let order = client.auth(AuthRequest::new("127.0.0.1")).await?;
    if order.order_ref.is_empty() || order.qr_start_token.is_empty() {
        return Err(anyhow!("auth response is missing order fields"));
    }
    let payload = order
        .qr_session()
        .ok_or_else(|| anyhow!("expected QR start tokens"))?
        .payload_now();
    if !payload.starts_with("bankid.") {
        return Err(anyhow!("unexpected QR payload {payload}"));
    }

    let handle = order.handle();
    let state = client.collect(&handle).await?;
    if state.status != Status::Pending {
        return Err(anyhow!("expected a pending order, got {}", state.status));
    }

    client.cancel(&handle).await?;
    Ok(())
}

#[tokio::test]
async fn live_collect_unknown_order_is_invalid_parameters() -> Result<()> {
    let client = live_client()?;
    let err = client
        .collect(&OrderHandle::new("00000000-0000-0000-0000-000000000000"))
        .await
        .err()
        .ok_or_else(|| anyhow!("collect on an unknown order succeeded"))?;
    let code = err.remote().map(|remote| remote.code);
    if code != Some(ErrorCode::InvalidParameters) {
        return Err(anyhow!("expected invalidParameters, got {err}"));
    }
    Ok(())
}
