use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bankid_rp::orders::CALL_INITIATOR_USER;
use bankid_rp::{
    AuthRequest, BankIdClient, CallerAction, Error, ErrorCode, OrderHandle, PhoneAuthRequest,
    SignRequest, Status,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::test_utils::{client_for, collect_body, error_body, init_logging, order_body, request_count};

#[tokio::test]
async fn auth_with_empty_ip_fails_before_any_request() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_body()))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .auth(AuthRequest::new(""))
        .await
        .expect_err("empty ip must be rejected");
    assert!(matches!(err, Error::InputInvalid(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn auth_returns_handle_and_qr_inputs() {
    init_logging();
    let server = MockServer::start().await;
    let body = order_body();
    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "endUserIp": "192.168.1.20",
            "userVisibleDataFormat": "simpleMarkdownV1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let order = client_for(&server)
        .auth(AuthRequest::new("192.168.1.20"))
        .await
        .expect("auth order");
    assert_eq!(order.handle().as_str(), body["orderRef"].as_str().expect("orderRef"));
    assert!(!order.auto_start_token.is_empty());

    let session = order.qr_session().expect("qr session");
    let payload = session.payload_at(0);
    let token = body["qrStartToken"].as_str().expect("qrStartToken");
    assert!(payload.starts_with(&format!("bankid.{token}.0.")));
}

#[tokio::test]
async fn sign_sends_encoded_visible_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sign"))
        .and(body_partial_json(json!({
            "endUserIp": "2001:db8::1",
            "userVisibleData": STANDARD.encode("Sign the **contract**"),
            "userVisibleDataFormat": "simpleMarkdownV1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_body()))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .sign(SignRequest::new("2001:db8::1", "Sign the **contract**"))
        .await
        .expect("sign order");
}

#[tokio::test]
async fn phone_auth_targets_phone_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/phone/auth"))
        .and(body_partial_json(json!({
            "personalNumber": "3810260632",
            "callInitiator": "user"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orderRef": "phone-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let order = client_for(&server)
        .phone_auth(PhoneAuthRequest::new("3810260632", CALL_INITIATOR_USER))
        .await
        .expect("phone auth order");
    assert_eq!(order.order_ref, "phone-1");
    assert!(order.qr_session().is_none());
}

#[tokio::test]
async fn collect_on_unknown_order_is_non_retryable() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collect"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(error_body("invalidParameters", "No such order")),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .collect(&OrderHandle::new("does-not-exist"))
        .await
        .expect_err("unknown order");
    let remote = err.remote().expect("remote error");
    assert_eq!(remote.code, ErrorCode::InvalidParameters);
    assert_eq!(remote.action(), CallerAction::FixRequest);
    assert!(!err.is_retryable());
    assert!(err.is_caller_fault());
    assert!(!err.should_inform_user());
}

#[tokio::test]
async fn collect_decodes_pending_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collect"))
        .and(body_json(json!({"orderRef": "ref-1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(collect_body("ref-1", "pending", Some("userSign"))),
        )
        .mount(&server)
        .await;

    let response = client_for(&server)
        .collect(&OrderHandle::new("ref-1"))
        .await
        .expect("collect");
    assert_eq!(response.status, Status::Pending);
    assert_eq!(response.hint_code.map(|hint| hint.to_string()).as_deref(), Some("userSign"));
}

#[tokio::test]
async fn cancel_accepts_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cancel"))
        .and(body_json(json!({"orderRef": "ref-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .cancel(&OrderHandle::new("ref-1"))
        .await
        .expect("cancel");
}

#[tokio::test]
async fn maintenance_is_retryable_and_user_facing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(error_body("maintenance", "")))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .auth(AuthRequest::new("10.0.0.1"))
        .await
        .expect_err("maintenance");
    assert!(err.is_retryable());
    assert!(err.should_inform_user());
    assert_eq!(err.remote().map(|remote| remote.observed_status), Some(Some(503)));
}

#[tokio::test]
async fn undecodable_bodies_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sign"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .auth(AuthRequest::new("10.0.0.1"))
        .await
        .expect_err("bad success body");
    assert!(matches!(err, Error::Protocol(_)));

    let err = client
        .sign(SignRequest::new("10.0.0.1", "text"))
        .await
        .expect_err("bad error body");
    assert!(matches!(err, Error::Unknown(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("local addr");
    drop(listener);

    let client = BankIdClient::with_http_client(reqwest::Client::new(), format!("http://{address}"));
    let err = client
        .collect(&OrderHandle::new("ref-1"))
        .await
        .expect_err("server is gone");
    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn invalid_requirement_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_body()))
        .expect(0)
        .mount(&server)
        .await;

    let request = AuthRequest::new("10.0.0.1").with_requirement(bankid_rp::Requirement {
        certificate_policies: vec!["9.9.9.9".into()],
        ..Default::default()
    });
    let err = client_for(&server).auth(request).await.expect_err("bad policy");
    assert!(matches!(err, Error::InputInvalid(_)));
    assert_eq!(request_count(&server, "/auth").await, 0);
}
