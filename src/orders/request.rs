use serde::Serialize;

use crate::error::Result;
use crate::transport::Operation;

use super::validate;

/// Format tag telling the app that the visible text carries simple markdown.
pub const SIMPLE_MARKDOWN_V1: &str = "simpleMarkdownV1";
pub const CALL_INITIATOR_USER: &str = "user";
pub const CALL_INITIATOR_RP: &str = "RP";
pub const CARD_READER_CLASS1: &str = "class1";
pub const CARD_READER_CLASS2: &str = "class2";

/// Text fields shared by every order type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayText {
    /// Shown to the user in the app. Plain UTF-8 or already base64 encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_visible_data: Option<String>,
    /// Never shown to the user. Plain UTF-8 or already base64 encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_non_visible_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_visible_data_format: Option<String>,
}

impl DisplayText {
    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            user_visible_data: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_non_visible(mut self, data: impl Into<String>) -> Self {
        self.user_non_visible_data = Some(data.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.user_visible_data_format = Some(format.into());
        self
    }
}

/// Constraints on how the order may be completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    #[serde(skip_serializing_if = "is_false")]
    pub pin_code: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub mrtd: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_reader: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub certificate_policies: Vec<String>,
    /// Only a BankID issued to this personal number may complete the order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_number: Option<String>,
    /// `low` or `moderate`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
}

impl Requirement {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub end_user_ip: String,
    #[serde(skip_serializing_if = "Requirement::is_empty")]
    pub requirement: Requirement,
    #[serde(flatten)]
    pub text: DisplayText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_risk: Option<bool>,
}

impl AuthRequest {
    pub fn new(end_user_ip: impl Into<String>) -> Self {
        Self {
            end_user_ip: end_user_ip.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: DisplayText) -> Self {
        self.text = text;
        self
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    pub end_user_ip: String,
    #[serde(skip_serializing_if = "Requirement::is_empty")]
    pub requirement: Requirement,
    #[serde(flatten)]
    pub text: DisplayText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

impl SignRequest {
    pub fn new(end_user_ip: impl Into<String>, visible_text: impl Into<String>) -> Self {
        Self {
            end_user_ip: end_user_ip.into(),
            text: DisplayText::visible(visible_text),
            ..Self::default()
        }
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneAuthRequest {
    pub personal_number: String,
    /// [`CALL_INITIATOR_USER`] or [`CALL_INITIATOR_RP`].
    pub call_initiator: String,
    #[serde(skip_serializing_if = "Requirement::is_empty")]
    pub requirement: Requirement,
    #[serde(flatten)]
    pub text: DisplayText,
}

impl PhoneAuthRequest {
    pub fn new(personal_number: impl Into<String>, call_initiator: impl Into<String>) -> Self {
        Self {
            personal_number: personal_number.into(),
            call_initiator: call_initiator.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneSignRequest {
    pub personal_number: String,
    pub call_initiator: String,
    #[serde(skip_serializing_if = "Requirement::is_empty")]
    pub requirement: Requirement,
    #[serde(flatten)]
    pub text: DisplayText,
}

impl PhoneSignRequest {
    pub fn new(
        personal_number: impl Into<String>,
        call_initiator: impl Into<String>,
        visible_text: impl Into<String>,
    ) -> Self {
        Self {
            personal_number: personal_number.into(),
            call_initiator: call_initiator.into(),
            text: DisplayText::visible(visible_text),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectRequest {
    pub order_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub order_ref: String,
}

/// Any request that starts a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OrderRequest {
    Auth(AuthRequest),
    Sign(SignRequest),
    PhoneAuth(PhoneAuthRequest),
    PhoneSign(PhoneSignRequest),
}

impl OrderRequest {
    pub fn operation(&self) -> Operation {
        match self {
            OrderRequest::Auth(_) => Operation::Auth,
            OrderRequest::Sign(_) => Operation::Sign,
            OrderRequest::PhoneAuth(_) => Operation::PhoneAuth,
            OrderRequest::PhoneSign(_) => Operation::PhoneSign,
        }
    }

    /// Validates the request and returns it in wire form.
    pub fn prepare(self) -> Result<Self> {
        validate::prepare(self)
    }
}

impl From<AuthRequest> for OrderRequest {
    fn from(value: AuthRequest) -> Self {
        OrderRequest::Auth(value)
    }
}

impl From<SignRequest> for OrderRequest {
    fn from(value: SignRequest) -> Self {
        OrderRequest::Sign(value)
    }
}

impl From<PhoneAuthRequest> for OrderRequest {
    fn from(value: PhoneAuthRequest) -> Self {
        OrderRequest::PhoneAuth(value)
    }
}

impl From<PhoneSignRequest> for OrderRequest {
    fn from(value: PhoneSignRequest) -> Self {
        OrderRequest::PhoneSign(value)
    }
}
