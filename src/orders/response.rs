use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::remote::{RFA1, RFA3, RFA6, RFA8, RFA9, RFA13, RFA15, RFA16, RFA17, RFA22, RFA23};
use crate::qr::QrSession;

/// Reference to one outstanding order, used for collect and cancel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderHandle(String);

impl OrderHandle {
    pub fn new(order_ref: impl Into<String>) -> Self {
        Self(order_ref.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OrderHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OrderHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Answer to auth, sign, phone/auth and phone/sign. Phone orders only carry
/// `order_ref`; the start tokens are then empty.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_ref: String,
    #[serde(default)]
    pub auto_start_token: String,
    #[serde(default)]
    pub qr_start_token: String,
    #[serde(default)]
    pub qr_start_secret: String,
    #[serde(skip)]
    pub(crate) received_at: Option<Instant>,
}

impl OrderResponse {
    pub fn handle(&self) -> OrderHandle {
        OrderHandle::new(self.order_ref.clone())
    }

    /// Rotating QR code state for this order, counted from when the response
    /// arrived. `None` for orders without QR start tokens.
    pub fn qr_session(&self) -> Option<QrSession> {
        if self.qr_start_token.is_empty() || self.qr_start_secret.is_empty() {
            return None;
        }
        Some(QrSession::starting_at(
            self.qr_start_token.clone(),
            self.qr_start_secret.clone(),
            self.received_at.unwrap_or_else(Instant::now),
        ))
    }
}

impl fmt::Debug for OrderResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderResponse")
            .field("order_ref", &self.order_ref)
            .field("auto_start_token", &self.auto_start_token)
            .field("qr_start_token", &self.qr_start_token)
            .field("qr_start_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Failed,
    Complete,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Pending => "pending",
            Status::Failed => "failed",
            Status::Complete => "complete",
        })
    }
}

/// Why an order is pending, or why it failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HintCode {
    OutstandingTransaction,
    NoClient,
    Started,
    UserMrtd,
    UserCallConfirm,
    UserSign,
    ExpiredTransaction,
    CertificateErr,
    UserCancel,
    Cancelled,
    StartFailed,
    /// A code introduced after this client was written.
    Other(String),
}

impl HintCode {
    pub fn as_str(&self) -> &str {
        match self {
            HintCode::OutstandingTransaction => "outstandingTransaction",
            HintCode::NoClient => "noClient",
            HintCode::Started => "started",
            HintCode::UserMrtd => "userMrtd",
            HintCode::UserCallConfirm => "userCallConfirm",
            HintCode::UserSign => "userSign",
            HintCode::ExpiredTransaction => "expiredTransaction",
            HintCode::CertificateErr => "certificateErr",
            HintCode::UserCancel => "userCancel",
            HintCode::Cancelled => "cancelled",
            HintCode::StartFailed => "startFailed",
            HintCode::Other(raw) => raw,
        }
    }

    /// Recommended text for the end user while the order carries this hint.
    /// `status` separates a pending unknown hint from a failed one.
    pub fn user_message(&self, status: Status) -> Option<&'static str> {
        match self {
            HintCode::OutstandingTransaction => Some(RFA13),
            HintCode::NoClient => Some(RFA1),
            HintCode::Started => Some(RFA15),
            HintCode::UserMrtd => Some(RFA23),
            HintCode::UserCallConfirm => None,
            HintCode::UserSign => Some(RFA9),
            HintCode::ExpiredTransaction => Some(RFA8),
            HintCode::CertificateErr => Some(RFA16),
            HintCode::UserCancel => Some(RFA6),
            HintCode::Cancelled => Some(RFA3),
            HintCode::StartFailed => Some(RFA17),
            HintCode::Other(_) if status == Status::Failed => Some(RFA22),
            HintCode::Other(_) => Some(RFA1),
        }
    }
}

impl From<String> for HintCode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "outstandingTransaction" => HintCode::OutstandingTransaction,
            "noClient" => HintCode::NoClient,
            "started" => HintCode::Started,
            "userMrtd" => HintCode::UserMrtd,
            "userCallConfirm" => HintCode::UserCallConfirm,
            "userSign" => HintCode::UserSign,
            "expiredTransaction" => HintCode::ExpiredTransaction,
            "certificateErr" => HintCode::CertificateErr,
            "userCancel" => HintCode::UserCancel,
            "cancelled" => HintCode::Cancelled,
            "startFailed" => HintCode::StartFailed,
            _ => HintCode::Other(value),
        }
    }
}

impl From<HintCode> for String {
    fn from(value: HintCode) -> Self {
        match value {
            HintCode::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for HintCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectResponse {
    pub order_ref: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint_code: Option<HintCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_data: Option<CompletionData>,
}

impl CollectResponse {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn user_message(&self) -> Option<&'static str> {
        self.hint_code
            .as_ref()
            .and_then(|hint| hint.user_message(self.status))
    }
}

/// Present only on a `complete` collect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionData {
    pub user: User,
    #[serde(default)]
    pub device: Device,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_id_issue_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_up: Option<StepUp>,
    /// Base64 encoded XML signature.
    #[serde(default)]
    pub signature: String,
    /// Base64 encoded OCSP response.
    #[serde(default)]
    pub ocsp_response: String,
    /// `low`, `moderate` or `high`, when risk was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub personal_number: String,
    pub name: String,
    pub given_name: String,
    pub surname: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub ip_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uhi: Option<String>,
}

/// Older API revisions send a flag, newer ones an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepUp {
    Flag(bool),
    Detail { mrtd: bool },
}

/// Successful cancel answers with an empty object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CancelResponse {}
