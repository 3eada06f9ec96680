use bankid_rp::BankIdClient;
use serde_json::{Value, json};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn client_for(server: &MockServer) -> BankIdClient {
    BankIdClient::with_http_client(reqwest::Client::new(), server.uri())
}

pub fn order_body() -> Value {
    json!({
        "orderRef": Uuid::new_v4().to_string(),
        "autoStartToken": Uuid::new_v4().to_string(),
        "qrStartToken": Uuid::new_v4().to_string(),
        "qrStartSecret": Uuid::new_v4().to_string(),
    })
}

pub fn collect_body(order_ref: &str, status: &str, hint: Option<&str>) -> Value {
    let mut body = json!({"orderRef": order_ref, "status": status});
    if let Some(hint) = hint {
        body["hintCode"] = json!(hint);
    }
    if status == "complete" {
        body["completionData"] = json!({
            "user": {
                "personalNumber": "190000000000",
                "name": "Karl Karlsson",
                "givenName": "Karl",
                "surname": "Karlsson"
            },
            "device": {"ipAddress": "192.168.0.1"},
            "bankIdIssueDate": "2020-02-01",
            "signature": "PD94bWwgdmVyc2lvbj0iMS4wIj8+",
            "ocspResponse": "MIIHfgoBAKCCB3cw"
        });
    }
    body
}

pub fn error_body(code: &str, details: &str) -> Value {
    json!({"errorCode": code, "details": details})
}

/// Mounts a collect mock answering with `body` at most `times` times.
pub async fn mount_collect(server: &MockServer, body: Value, times: u64) {
    Mock::given(method("POST"))
        .and(path("/collect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

pub async fn request_count(server: &MockServer, endpoint: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == endpoint)
        .count()
}
