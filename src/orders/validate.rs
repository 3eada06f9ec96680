use std::net::IpAddr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::request::{
    CALL_INITIATOR_RP, CALL_INITIATOR_USER, CARD_READER_CLASS1, CARD_READER_CLASS2, DisplayText,
    OrderRequest, Requirement, SIMPLE_MARKDOWN_V1,
};
use crate::error::{Error, Result};

/// Maximum visible text length for auth orders, after base64 encoding.
pub const AUTH_VISIBLE_TEXT_LIMIT: usize = 1_500;
/// Maximum visible text length for sign orders, after base64 encoding.
pub const SIGN_VISIBLE_TEXT_LIMIT: usize = 40_000;
pub const NON_VISIBLE_TEXT_LIMIT: usize = 1_500;

pub const PRODUCTION_POLICIES: [&str; 4] = [
    "1.2.752.78.1.1",
    "1.2.752.78.1.2",
    "1.2.752.78.1.5",
    "1.2.752.71.1.3",
];
pub const TEST_POLICIES: [&str; 5] = [
    "1.2.3.4.5",
    "1.2.3.4.10",
    "1.2.3.4.25",
    "1.2.752.60.1.6",
    "1.2.752.71.1.3",
];

const RISK_LEVELS: [&str; 2] = ["low", "moderate"];
const WILDCARD_MIN_POSITION: usize = 5;

/// Checks every rule for the request and returns it in wire form: identifiers
/// trimmed, text fields base64 encoded.
pub(crate) fn prepare(request: OrderRequest) -> Result<OrderRequest> {
    match request {
        OrderRequest::Auth(mut auth) => {
            trim_in_place(&mut auth.end_user_ip);
            end_user_ip(&auth.end_user_ip)?;
            prepare_requirement(&mut auth.requirement)?;
            normalize_text(&mut auth.text, false, AUTH_VISIBLE_TEXT_LIMIT)?;
            Ok(OrderRequest::Auth(auth))
        }
        OrderRequest::Sign(mut sign) => {
            trim_in_place(&mut sign.end_user_ip);
            end_user_ip(&sign.end_user_ip)?;
            prepare_requirement(&mut sign.requirement)?;
            normalize_text(&mut sign.text, true, SIGN_VISIBLE_TEXT_LIMIT)?;
            Ok(OrderRequest::Sign(sign))
        }
        OrderRequest::PhoneAuth(mut phone) => {
            trim_in_place(&mut phone.personal_number);
            required_personal_number(&phone.personal_number)?;
            call_initiator(&phone.call_initiator)?;
            prepare_requirement(&mut phone.requirement)?;
            normalize_text(&mut phone.text, false, AUTH_VISIBLE_TEXT_LIMIT)?;
            Ok(OrderRequest::PhoneAuth(phone))
        }
        OrderRequest::PhoneSign(mut phone) => {
            trim_in_place(&mut phone.personal_number);
            required_personal_number(&phone.personal_number)?;
            call_initiator(&phone.call_initiator)?;
            prepare_requirement(&mut phone.requirement)?;
            normalize_text(&mut phone.text, true, SIGN_VISIBLE_TEXT_LIMIT)?;
            Ok(OrderRequest::PhoneSign(phone))
        }
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn prepare_requirement(value: &mut Requirement) -> Result<()> {
    if let Some(number) = value.personal_number.as_mut() {
        trim_in_place(number);
    }
    requirement(value)
}

/// Syntax check only; reachability is never tested.
pub fn end_user_ip(raw: &str) -> Result<()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InputInvalid(
            "endUserIp must be an IPv4 or IPv6 address, got an empty value".to_string(),
        ));
    }
    trimmed
        .parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| Error::InputInvalid(format!("endUserIp is not an IP address: {trimmed}")))
}

fn required_personal_number(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(Error::RequiredInputMissing("personalNumber".to_string()));
    }
    personal_number(raw)
}

/// Accepts `YYMMDDNNNC` or `YYYYMMDDNNNC`; the check digit covers the last ten digits.
pub fn personal_number(raw: &str) -> Result<()> {
    let digits = raw.trim();
    if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(Error::InputInvalid(
            "personalNumber must contain digits only".to_string(),
        ));
    }
    let checked = match digits.len() {
        10 => digits,
        12 => &digits[2..],
        other => {
            return Err(Error::InputInvalid(format!(
                "personalNumber must have 10 or 12 digits, got {other}"
            )));
        }
    };
    if !luhn_valid(checked) {
        return Err(Error::InputInvalid(
            "personalNumber has an invalid check digit".to_string(),
        ));
    }
    Ok(())
}

/// Mod-10 checksum. Returns false for empty input or any non-digit.
pub fn luhn_valid(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (index, ch) in digits.chars().rev().enumerate() {
        let Some(mut digit) = ch.to_digit(10) else {
            return false;
        };
        if index % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}

pub fn call_initiator(raw: &str) -> Result<()> {
    match raw {
        "" => Err(Error::RequiredInputMissing("callInitiator".to_string())),
        CALL_INITIATOR_USER | CALL_INITIATOR_RP => Ok(()),
        other => Err(Error::InputInvalid(format!(
            "callInitiator must be \"{CALL_INITIATOR_USER}\" or \"{CALL_INITIATOR_RP}\", got \"{other}\""
        ))),
    }
}

pub fn requirement(requirement: &Requirement) -> Result<()> {
    if let Some(reader) = requirement.card_reader.as_deref()
        && reader != CARD_READER_CLASS1
        && reader != CARD_READER_CLASS2
    {
        return Err(Error::InputInvalid(format!(
            "cardReader must be \"{CARD_READER_CLASS1}\" or \"{CARD_READER_CLASS2}\", got \"{reader}\""
        )));
    }

    for policy in &requirement.certificate_policies {
        if !policy_allowed(policy) {
            return Err(Error::InputInvalid(format!(
                "certificate policy {policy} is not a known BankID policy"
            )));
        }
    }

    if let Some(number) = requirement.personal_number.as_deref() {
        personal_number(number)?;
    }

    if let Some(risk) = requirement.risk.as_deref()
        && !RISK_LEVELS.contains(&risk)
    {
        return Err(Error::InputInvalid(format!(
            "risk must be \"low\" or \"moderate\", got \"{risk}\""
        )));
    }
    Ok(())
}

/// Exact match against the known policies, or a `*` wildcard in the fifth
/// arc or later that covers at least one of them.
fn policy_allowed(policy: &str) -> bool {
    let known = || PRODUCTION_POLICIES.iter().chain(TEST_POLICIES.iter());
    if known().any(|candidate| *candidate == policy) {
        return true;
    }
    let Some(prefix) = policy.strip_suffix(".*") else {
        return false;
    };
    if prefix.contains('*') || prefix.split('.').count() < WILDCARD_MIN_POSITION - 1 {
        return false;
    }
    let prefix = format!("{prefix}.");
    known().any(|candidate| candidate.starts_with(&prefix))
}

fn normalize_text(text: &mut DisplayText, visible_required: bool, visible_limit: usize) -> Result<()> {
    let visible = text.user_visible_data.take().filter(|value| !value.is_empty());
    match visible {
        Some(value) => {
            let encoded = encode_text(&value);
            check_length("userVisibleData", &encoded, visible_limit)?;
            text.user_visible_data = Some(encoded);
        }
        None if visible_required => {
            return Err(Error::RequiredInputMissing("userVisibleData".to_string()));
        }
        None => {}
    }

    if let Some(value) = text
        .user_non_visible_data
        .take()
        .filter(|value| !value.is_empty())
    {
        let encoded = encode_data(&value);
        check_length("userNonVisibleData", &encoded, NON_VISIBLE_TEXT_LIMIT)?;
        text.user_non_visible_data = Some(encoded);
    }

    if text
        .user_visible_data_format
        .as_deref()
        .is_none_or(|format| format.trim().is_empty())
    {
        text.user_visible_data_format = Some(SIMPLE_MARKDOWN_V1.to_string());
    }
    Ok(())
}

fn check_length(field: &str, encoded: &str, limit: usize) -> Result<()> {
    if encoded.len() > limit {
        return Err(Error::InputInvalid(format!(
            "{field} is {} characters after base64 encoding; the limit is {limit}",
            encoded.len()
        )));
    }
    Ok(())
}

/// Base64 encodes visible `text` unless it already is base64 of UTF-8 text.
pub fn encode_text(text: &str) -> String {
    let encoded_utf8 = STANDARD
        .decode(text)
        .is_ok_and(|bytes| std::str::from_utf8(&bytes).is_ok());
    if encoded_utf8 {
        return text.to_string();
    }
    STANDARD.encode(text.as_bytes())
}

/// Base64 encodes non-visible `data` unless it already decodes as base64.
/// The payload may be binary, so the decoded bytes are not inspected.
pub fn encode_data(data: &str) -> String {
    if STANDARD.decode(data).is_ok() {
        return data.to_string();
    }
    STANDARD.encode(data.as_bytes())
}
