use std::fmt;

use serde::{Deserialize, Serialize};

/// Recommended end-user messages, named after the RFA codes used by the
/// BankID messaging guidelines.
pub const RFA1: &str = "Start your BankID app.";
pub const RFA3: &str = "Action cancelled. Please try again.";
pub const RFA4: &str =
    "An identification or signing for this personal number is already started. Please try again.";
pub const RFA5: &str = "Internal error. Please try again.";
pub const RFA6: &str = "Action cancelled.";
pub const RFA8: &str = "The BankID app is not responding. Please check that it's started and that you have internet access. If you don't have a valid BankID you can get one from your bank. Try again.";
pub const RFA9: &str = "Enter your security code in the BankID app and select Identify or Sign.";
pub const RFA13: &str = "Trying to start your BankID app.";
pub const RFA15: &str = "Searching for BankID, it may take a little while. If a few seconds have passed and still no BankID has been found, you probably don't have a BankID which can be used for this identification or signing on this device.";
pub const RFA16: &str = "The BankID you are trying to use is blocked or too old. Please use another BankID or get a new one from your bank.";
pub const RFA17: &str = "The BankID app couldn't be found on your computer or mobile device. Please install it and get a BankID from your bank.";
pub const RFA22: &str = "Unknown error. Please try again.";
pub const RFA23: &str = "Process your machine-readable travel document using the BankID app.";

/// Closed set of `errorCode` values the RP API documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    AlreadyInProgress,
    RequestTimeout,
    InternalError,
    Maintenance,
    InvalidParameters,
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    UnsupportedMediaType,
    UnknownErrorCode,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 10] = [
        ErrorCode::AlreadyInProgress,
        ErrorCode::RequestTimeout,
        ErrorCode::InternalError,
        ErrorCode::Maintenance,
        ErrorCode::InvalidParameters,
        ErrorCode::Unauthorized,
        ErrorCode::NotFound,
        ErrorCode::MethodNotAllowed,
        ErrorCode::UnsupportedMediaType,
        ErrorCode::UnknownErrorCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AlreadyInProgress => "alreadyInProgress",
            ErrorCode::RequestTimeout => "requestTimeout",
            ErrorCode::InternalError => "internalError",
            ErrorCode::Maintenance => "maintenance",
            ErrorCode::InvalidParameters => "invalidParameters",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::NotFound => "notFound",
            ErrorCode::MethodNotAllowed => "methodNotAllowed",
            ErrorCode::UnsupportedMediaType => "unsupportedMediaType",
            ErrorCode::UnknownErrorCode => "unknownErrorCode",
        }
    }

    /// Maps a raw wire code onto the enumeration. Anything unrecognised lands
    /// on [`ErrorCode::UnknownErrorCode`].
    pub fn from_wire(raw: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == raw.trim())
            .unwrap_or(ErrorCode::UnknownErrorCode)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the relying party is expected to do with a remote error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerAction {
    /// Tell the end user; never retry automatically.
    InformUser,
    /// Retry without telling the end user; escalate to them if it repeats.
    RetryThenInform,
    /// Bug in the caller's request, credentials or routing. Never retry unchanged.
    FixRequest,
    /// Caller violated the transport contract (method or media type).
    FixTransport,
}

/// Wire shape of an error body returned with HTTP status >= 300.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteErrorBody {
    #[serde(default)]
    pub status_code: Option<u16>,
    pub error_code: String,
    #[serde(default)]
    pub details: Option<String>,
}

/// A classified remote failure.
///
/// `status` is the documented HTTP-equivalent status for the code and is
/// informational only; several API revisions disagree on it, so dispatch
/// should always go through [`StructuredError::code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredError {
    pub code: ErrorCode,
    /// The code exactly as the remote sent it.
    pub raw_code: String,
    pub status: u16,
    pub details: String,
    /// HTTP status actually observed on the wire, when known.
    pub observed_status: Option<u16>,
    /// Free-text `details` from the remote body, when present.
    pub remote_details: Option<String>,
}

impl StructuredError {
    pub fn action(&self) -> CallerAction {
        match self.code {
            ErrorCode::AlreadyInProgress
            | ErrorCode::RequestTimeout
            | ErrorCode::InternalError
            | ErrorCode::UnknownErrorCode => CallerAction::InformUser,
            ErrorCode::Maintenance => CallerAction::RetryThenInform,
            ErrorCode::InvalidParameters | ErrorCode::Unauthorized | ErrorCode::NotFound => {
                CallerAction::FixRequest
            }
            ErrorCode::MethodNotAllowed | ErrorCode::UnsupportedMediaType => {
                CallerAction::FixTransport
            }
        }
    }

    /// Only `maintenance` may be retried automatically.
    pub fn is_retryable(&self) -> bool {
        self.action() == CallerAction::RetryThenInform
    }

    pub fn should_inform_user(&self) -> bool {
        matches!(
            self.action(),
            CallerAction::InformUser | CallerAction::RetryThenInform
        )
    }

    /// Caller-side defects must not be presented to the end user as their fault.
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self.action(),
            CallerAction::FixRequest | CallerAction::FixTransport
        )
    }

    pub fn user_message(&self) -> Option<&'static str> {
        match self.code {
            ErrorCode::AlreadyInProgress => Some(RFA4),
            ErrorCode::RequestTimeout | ErrorCode::InternalError | ErrorCode::Maintenance => {
                Some(RFA5)
            }
            ErrorCode::UnknownErrorCode => Some(RFA22),
            _ => None,
        }
    }

    pub(crate) fn observed(mut self, status: u16, remote_details: Option<String>) -> Self {
        self.observed_status = Some(status);
        self.remote_details = remote_details.filter(|details| !details.trim().is_empty());
        self
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BankID error {} ({}): {}", self.code, self.status, self.details)?;
        if let Some(remote) = &self.remote_details {
            write!(f, " [{remote}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for StructuredError {}

/// Maps a remote `errorCode` to its structured error. Never fails: unknown
/// codes classify as `unknownErrorCode`.
pub fn classify(raw_code: &str) -> StructuredError {
    let code = ErrorCode::from_wire(raw_code);
    let (status, details) = match code {
        ErrorCode::AlreadyInProgress => (400, RFA4),
        ErrorCode::RequestTimeout => (408, RFA5),
        ErrorCode::InternalError => (500, RFA5),
        ErrorCode::Maintenance => (503, RFA5),
        ErrorCode::InvalidParameters => (
            400,
            "Invalid parameter. Invalid use of method. Potential causes include using an orderRef that previously resulted in a completed or failed order, an orderRef that is too old, the wrong certificate, oversized content or a non-JSON body.",
        ),
        ErrorCode::Unauthorized => (403, "RP does not have access to the service."),
        ErrorCode::NotFound => (404, "An erroneous URL path was used."),
        ErrorCode::MethodNotAllowed => (405, "Only http method POST is allowed."),
        ErrorCode::UnsupportedMediaType => (
            415,
            "Adding a 'charset' parameter after 'application/json' is not allowed.",
        ),
        ErrorCode::UnknownErrorCode => (501, RFA22),
    };
    StructuredError {
        code,
        raw_code: raw_code.to_string(),
        status,
        details: details.to_string(),
        observed_status: None,
        remote_details: None,
    }
}
