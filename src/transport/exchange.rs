use std::fmt;

use log::{debug, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::remote::{RemoteErrorBody, classify};
use crate::error::{Error, Result};

// The service rejects any charset parameter on the media type.
const JSON: &str = "application/json";
const MAX_LOGGED_BODY: usize = 256;

/// RP API endpoints, relative to the configured base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Auth,
    Sign,
    PhoneAuth,
    PhoneSign,
    Collect,
    Cancel,
}

impl Operation {
    pub fn path(&self) -> &'static str {
        match self {
            Operation::Auth => "/auth",
            Operation::Sign => "/sign",
            Operation::PhoneAuth => "/phone/auth",
            Operation::PhoneSign => "/phone/sign",
            Operation::Collect => "/collect",
            Operation::Cancel => "/cancel",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// JSON-over-POST request/response exchange with the RP API.
#[derive(Debug, Clone)]
pub struct Exchanger {
    http: Client,
    base_url: String,
}

impl Exchanger {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn exchange<B, R>(&self, operation: Operation, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)
            .map_err(|err| Error::Protocol(format!("failed to encode {operation} request: {err}")))?;
        let url = format!("{}{}", self.base_url, operation.path());
        debug!("[bankid-http] POST {operation}");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .body(payload)
            .send()
            .await
            .map_err(|err| {
                warn!("[bankid-http] {operation} request failed: {err}");
                Error::Transport(err)
            })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        debug!("[bankid-http] {operation} answered {status}");

        if status.as_u16() >= 300 {
            return Err(remote_error(operation, status, &bytes));
        }

        serde_json::from_slice(&bytes).map_err(|err| {
            Error::Protocol(format!("undecodable {operation} response: {err}"))
        })
    }
}

fn remote_error(operation: Operation, status: StatusCode, body: &[u8]) -> Error {
    match serde_json::from_slice::<RemoteErrorBody>(body) {
        Ok(parsed) => {
            let structured = classify(&parsed.error_code).observed(status.as_u16(), parsed.details);
            if parsed
                .status_code
                .is_some_and(|declared| declared != status.as_u16())
            {
                debug!(
                    "[bankid-http] {operation} body declares status {:?}, wire status {status}",
                    parsed.status_code
                );
            }
            warn!("[bankid-http] {operation} rejected: {}", structured.code);
            Error::Remote(structured)
        }
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            let snippet: String = text.chars().take(MAX_LOGGED_BODY).collect();
            warn!("[bankid-http] {operation} failed with {status} and no error code");
            Error::Unknown(format!("{operation} failed with HTTP {status}: {snippet}"))
        }
    }
}
