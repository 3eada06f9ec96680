use log::{debug, info};
use tokio::time::Instant;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::orders::{
    AuthRequest, CancelRequest, CancelResponse, CollectRequest, CollectResponse, OrderHandle,
    OrderPoller, OrderRequest, OrderResponse, OrderUpdates, PhoneAuthRequest, PhoneSignRequest,
    SignRequest,
};
use crate::transport::{Exchanger, Operation, build_transport};

/// Relying-party client. Cheap to clone; clones share one transport.
#[derive(Debug, Clone)]
pub struct BankIdClient {
    exchanger: Exchanger,
}

impl BankIdClient {
    /// Loads the certificate bundle and builds the mutual-TLS transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let identity = config.certificate.load(config.environment)?;
        let http = build_transport(&identity, config.timeout)?;
        info!(
            "[bankid-http] client ready for {} environment at {}",
            config.environment, config.base_url
        );
        Ok(Self {
            exchanger: Exchanger::new(http, config.base_url),
        })
    }

    /// Uses a caller-built HTTP client as is. No certificate handling happens here.
    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            exchanger: Exchanger::new(http, base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        self.exchanger.base_url()
    }

    pub async fn auth(&self, request: AuthRequest) -> Result<OrderResponse> {
        self.issue(request.into()).await
    }

    pub async fn sign(&self, request: SignRequest) -> Result<OrderResponse> {
        self.issue(request.into()).await
    }

    pub async fn phone_auth(&self, request: PhoneAuthRequest) -> Result<OrderResponse> {
        self.issue(request.into()).await
    }

    pub async fn phone_sign(&self, request: PhoneSignRequest) -> Result<OrderResponse> {
        self.issue(request.into()).await
    }

    /// Validates and sends any order-starting request. Nothing reaches the
    /// network when validation fails.
    pub async fn issue(&self, request: OrderRequest) -> Result<OrderResponse> {
        let operation = request.operation();
        let prepared = request.prepare()?;
        let mut response: OrderResponse = self.exchanger.exchange(operation, &prepared).await?;
        response.received_at = Some(Instant::now());
        if response.order_ref.trim().is_empty() {
            return Err(Error::Protocol(format!(
                "{operation} response did not contain an orderRef"
            )));
        }
        info!(
            "[bankid-http] {operation} order {} started",
            response.order_ref
        );
        Ok(response)
    }

    /// One status check. Callers polling by hand must wait two seconds
    /// between calls; [`BankIdClient::poll`] does that for them.
    pub async fn collect(&self, handle: &OrderHandle) -> Result<CollectResponse> {
        let order_ref = required_order_ref(handle)?;
        self.exchanger
            .exchange(Operation::Collect, &CollectRequest { order_ref })
            .await
    }

    pub async fn cancel(&self, handle: &OrderHandle) -> Result<()> {
        let order_ref = required_order_ref(handle)?;
        let _: CancelResponse = self
            .exchanger
            .exchange(Operation::Cancel, &CancelRequest { order_ref })
            .await?;
        info!("[bankid-http] order {handle} cancelled");
        Ok(())
    }

    /// Polls the order in the background every two seconds and streams
    /// each state until it completes, fails, errors or `cancel` fires.
    pub fn poll(&self, handle: OrderHandle, cancel: CancellationToken) -> OrderUpdates {
        OrderPoller::new(self.exchanger.clone()).spawn(handle, cancel)
    }

    /// Drives [`BankIdClient::poll`] to the end. Returns `None` when
    /// cancelled before the order reached a terminal state.
    pub async fn wait_for_completion(
        &self,
        handle: OrderHandle,
        cancel: CancellationToken,
    ) -> Result<Option<CollectResponse>> {
        let mut updates = self.poll(handle, cancel);
        let mut last = None;
        while let Some(update) = updates.next().await {
            let response = update?;
            debug!(
                "[bankid-collect] order {} reported {}",
                response.order_ref, response.status
            );
            last = Some(response);
        }
        Ok(last.filter(CollectResponse::is_terminal))
    }
}

fn required_order_ref(handle: &OrderHandle) -> Result<String> {
    let order_ref = handle.as_str().trim();
    if order_ref.is_empty() {
        return Err(Error::RequiredInputMissing("orderRef".to_string()));
    }
    Ok(order_ref.to_string())
}
