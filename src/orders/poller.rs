use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::request::CollectRequest;
use super::response::{CollectResponse, OrderHandle};
use crate::error::{Error, Result};
use crate::transport::{Exchanger, Operation};

/// Fixed collect cadence required by the RP API. Faster polling is penalised.
pub const COLLECT_INTERVAL: Duration = Duration::from_secs(2);

/// Every collect result for one order, in order. Ends after a terminal
/// state, after the first error, or on cancellation.
pub type OrderUpdates = ReceiverStream<Result<CollectResponse>>;

/// Background collect loop for a single order.
#[derive(Debug, Clone)]
pub struct OrderPoller {
    exchanger: Exchanger,
    interval: Duration,
}

impl OrderPoller {
    pub fn new(exchanger: Exchanger) -> Self {
        Self {
            exchanger,
            interval: COLLECT_INTERVAL,
        }
    }

    #[cfg(test)]
    fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawns the loop on the current tokio runtime. Dropping the returned
    /// stream stops the loop as well.
    pub fn spawn(self, handle: OrderHandle, cancel: CancellationToken) -> OrderUpdates {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            self.run(handle, cancel, tx).await;
        });
        ReceiverStream::new(rx)
    }

    async fn run(
        self,
        handle: OrderHandle,
        cancel: CancellationToken,
        tx: mpsc::Sender<Result<CollectResponse>>,
    ) {
        if handle.as_str().trim().is_empty() {
            let _ = tx
                .send(Err(Error::RequiredInputMissing("orderRef".to_string())))
                .await;
            return;
        }

        let request = CollectRequest {
            order_ref: handle.as_str().to_string(),
        };
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                break;
            }
            attempt += 1;
            debug!("[bankid-collect] collect attempt {attempt} for order {handle}");

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tx.closed() => break,
                result = self.exchanger.exchange::<_, CollectResponse>(Operation::Collect, &request) => result,
            };

            let finished = match &result {
                Ok(response) if response.is_terminal() => {
                    info!(
                        "[bankid-collect] order {handle} is {} after {attempt} attempt(s)",
                        response.status
                    );
                    true
                }
                Ok(response) => {
                    debug!(
                        "[bankid-collect] order {handle} pending ({})",
                        response
                            .hint_code
                            .as_ref()
                            .map(|hint| hint.as_str())
                            .unwrap_or("no hint")
                    );
                    false
                }
                Err(err) => {
                    warn!("[bankid-collect] collect failed for order {handle}: {err}");
                    true
                }
            };

            let delivered = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                sent = tx.send(result) => sent.is_ok(),
            };
            if !delivered || finished {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tx.closed() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        debug!("[bankid-collect] polling stopped for order {handle}");
    }
}
