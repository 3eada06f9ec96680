//! Animated QR code payloads.
//!
//! Every second the QR code shown to the user must change to
//! `bankid.<qrStartToken>.<seconds>.<hex(HMAC-SHA256(qrStartSecret, seconds))>`,
//! where `seconds` counts from the moment the order was issued.

use std::fmt;
use std::time::Duration;

use hmac::{Hmac, Mac};
use log::debug;
use sha2::Sha256;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

pub const QR_PREFIX: &str = "bankid";
pub const QR_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

type HmacSha256 = Hmac<Sha256>;

/// Computes the payload for a given number of elapsed seconds.
pub fn generate_qr_payload(qr_start_secret: &str, qr_start_token: &str, elapsed_secs: u64) -> String {
    let mut mac = HmacSha256::new_from_slice(qr_start_secret.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    let elapsed = elapsed_secs.to_string();
    mac.update(elapsed.as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    format!("{QR_PREFIX}.{qr_start_token}.{elapsed}.{digest}")
}

/// QR start token and secret of one order together with its start instant.
#[derive(Clone)]
pub struct QrSession {
    start_token: String,
    start_secret: Zeroizing<String>,
    started_at: Instant,
}

impl QrSession {
    pub fn new(start_token: impl Into<String>, start_secret: impl Into<String>) -> Self {
        Self::starting_at(start_token, start_secret, Instant::now())
    }

    pub fn starting_at(
        start_token: impl Into<String>,
        start_secret: impl Into<String>,
        started_at: Instant,
    ) -> Self {
        Self {
            start_token: start_token.into(),
            start_secret: Zeroizing::new(start_secret.into()),
            started_at,
        }
    }

    pub fn start_token(&self) -> &str {
        &self.start_token
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn payload_at(&self, elapsed_secs: u64) -> String {
        generate_qr_payload(&self.start_secret, &self.start_token, elapsed_secs)
    }

    pub fn payload_now(&self) -> String {
        self.payload_at(self.elapsed_secs())
    }

    /// Streams one payload per second, starting immediately, until `cancel`
    /// fires or the receiver is dropped. Missed ticks are skipped rather
    /// than replayed.
    pub fn ticker(&self, cancel: CancellationToken) -> ReceiverStream<String> {
        let (tx, rx) = mpsc::channel(1);
        let session = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now(), QR_REFRESH_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tx.closed() => break,
                    _ = interval.tick() => {}
                }
                let payload = session.payload_now();
                if cancel.is_cancelled() || tx.send(payload).await.is_err() {
                    break;
                }
            }
            debug!("[bankid-qr] ticker for {} stopped", session.start_token);
        });
        ReceiverStream::new(rx)
    }
}

impl fmt::Debug for QrSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QrSession")
            .field("start_token", &self.start_token)
            .field("start_secret", &"<redacted>")
            .field("started_at", &self.started_at)
            .finish()
    }
}
