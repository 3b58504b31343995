//! Chain worker task and the channel-backed submitter.
//!
//! The session never touches the chain directly: built transactions travel
//! to the worker as [`ChainRequest`]s and results come back as
//! [`ChainUpdate`]s.

use async_trait::async_trait;
use stkbond_chain::{ChainClient, ChainError, UnsignedPayload};
use stkbond_core::{Balance, BondCall, BondTransaction, SessionEvent, SubmitError, TxSubmitter};
use tokio::sync::mpsc;

/// Request sent to the chain worker.
#[derive(Debug)]
pub enum ChainRequest {
    EstimateFee(BondCall),
    BuildPayload {
        tx: BondTransaction,
        use_mortal_era: bool,
    },
}

/// Result reported back by the chain worker.
#[derive(Debug)]
pub enum ChainUpdate {
    Fee(Option<Balance>),
    PayloadReady(UnsignedPayload),
    Failed(String),
}

impl ChainUpdate {
    /// Session event for this update, if any.
    ///
    /// A ready payload has left the form for the external signer, which is
    /// the broadcast step from the session's point of view.
    pub fn session_event(&self) -> Option<SessionEvent> {
        match self {
            ChainUpdate::Fee(fee) => Some(SessionEvent::FeeEstimated(*fee)),
            ChainUpdate::PayloadReady(_) => Some(SessionEvent::Broadcast),
            ChainUpdate::Failed(reason) => Some(SessionEvent::SubmissionFailed(reason.clone())),
        }
    }
}

/// Chain operations the worker performs.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    async fn estimate_fee(&self, call: &BondCall) -> Result<Balance, ChainError>;
    async fn create_bond_payload(
        &self,
        tx: &BondTransaction,
        use_mortal_era: bool,
    ) -> Result<UnsignedPayload, ChainError>;
}

#[async_trait]
impl ChainBackend for ChainClient {
    async fn estimate_fee(&self, call: &BondCall) -> Result<Balance, ChainError> {
        ChainClient::estimate_fee(self, call).await
    }

    async fn create_bond_payload(
        &self,
        tx: &BondTransaction,
        use_mortal_era: bool,
    ) -> Result<UnsignedPayload, ChainError> {
        ChainClient::create_bond_payload(self, tx, use_mortal_era).await
    }
}

/// Serve requests until the request channel closes.
pub async fn chain_task<B: ChainBackend>(
    backend: B,
    mut request_rx: mpsc::Receiver<ChainRequest>,
    update_tx: mpsc::Sender<ChainUpdate>,
) {
    while let Some(request) = request_rx.recv().await {
        let update = match request {
            ChainRequest::EstimateFee(call) => match backend.estimate_fee(&call).await {
                Ok(fee) => ChainUpdate::Fee(Some(fee)),
                Err(e) => {
                    tracing::warn!("Fee estimation failed: {}", e);
                    ChainUpdate::Fee(None)
                }
            },
            ChainRequest::BuildPayload { tx, use_mortal_era } => {
                tracing::info!("Processing {}", tx.call.description());
                match backend.create_bond_payload(&tx, use_mortal_era).await {
                    Ok(payload) => ChainUpdate::PayloadReady(payload),
                    Err(e) => {
                        tracing::error!("Failed to generate payload: {}", e);
                        ChainUpdate::Failed(e.to_string())
                    }
                }
            }
        };

        if update_tx.send(update).await.is_err() {
            tracing::debug!("Update receiver dropped, stopping chain worker");
            break;
        }
    }
}

/// [`TxSubmitter`] that queues transactions for the chain worker.
#[derive(Debug, Clone)]
pub struct ChannelSubmitter {
    request_tx: mpsc::Sender<ChainRequest>,
    use_mortal_era: bool,
}

impl ChannelSubmitter {
    pub fn new(request_tx: mpsc::Sender<ChainRequest>, use_mortal_era: bool) -> Self {
        Self {
            request_tx,
            use_mortal_era,
        }
    }
}

impl TxSubmitter for ChannelSubmitter {
    fn submit(&mut self, tx: BondTransaction) -> Result<(), SubmitError> {
        self.request_tx
            .try_send(ChainRequest::BuildPayload {
                tx,
                use_mortal_era: self.use_mortal_era,
            })
            .map_err(|e| SubmitError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stkbond_chain::Era;
    use stkbond_core::SignerRole;

    fn tx() -> BondTransaction {
        BondTransaction {
            call: BondCall::BondExtra { amount: 10 },
            signer: [1u8; 32],
            signer_role: SignerRole::Active,
        }
    }

    struct FakeBackend {
        fail: bool,
    }

    #[async_trait]
    impl ChainBackend for FakeBackend {
        async fn estimate_fee(&self, call: &BondCall) -> Result<Balance, ChainError> {
            if self.fail {
                return Err(ChainError::Connection("offline".into()));
            }
            Ok(call.amount() / 10)
        }

        async fn create_bond_payload(
            &self,
            tx: &BondTransaction,
            use_mortal_era: bool,
        ) -> Result<UnsignedPayload, ChainError> {
            if self.fail {
                return Err(ChainError::Connection("offline".into()));
            }
            Ok(UnsignedPayload {
                call_data: vec![0x59],
                description: tx.call.description(),
                signer: tx.signer,
                genesis_hash: [0u8; 32],
                block_hash: [0u8; 32],
                spec_version: 1,
                tx_version: 1,
                nonce: 0,
                era: if use_mortal_era {
                    Era::mortal(128, 0)
                } else {
                    Era::Immortal
                },
                include_metadata_hash: false,
                use_asset_payment: false,
            })
        }
    }

    #[tokio::test]
    async fn test_channel_submitter_queues_request() {
        let (request_tx, mut request_rx) = mpsc::channel(4);
        let mut submitter = ChannelSubmitter::new(request_tx, false);

        submitter.submit(tx()).unwrap();

        match request_rx.recv().await {
            Some(ChainRequest::BuildPayload {
                tx: sent,
                use_mortal_era,
            }) => {
                assert_eq!(sent, tx());
                assert!(!use_mortal_era);
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_channel_submitter_closed_channel() {
        let (request_tx, request_rx) = mpsc::channel(1);
        drop(request_rx);
        let mut submitter = ChannelSubmitter::new(request_tx, true);
        assert!(submitter.submit(tx()).is_err());
    }

    #[tokio::test]
    async fn test_chain_task_round_trip() {
        let (request_tx, request_rx) = mpsc::channel(4);
        let (update_tx, mut update_rx) = mpsc::channel(4);
        let worker = tokio::spawn(chain_task(
            FakeBackend { fail: false },
            request_rx,
            update_tx,
        ));

        request_tx
            .send(ChainRequest::EstimateFee(BondCall::Unbond { amount: 100 }))
            .await
            .unwrap();
        assert!(matches!(update_rx.recv().await, Some(ChainUpdate::Fee(Some(10)))));

        ChannelSubmitter::new(request_tx.clone(), true)
            .submit(tx())
            .unwrap();
        match update_rx.recv().await {
            Some(ChainUpdate::PayloadReady(payload)) => {
                assert_eq!(payload.description, "Staking::bond_extra(10)");
                assert!(matches!(payload.era, Era::Mortal { period: 128, .. }));
            }
            other => panic!("unexpected update: {:?}", other),
        }

        drop(request_tx);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_chain_task_reports_failures() {
        let (request_tx, request_rx) = mpsc::channel(4);
        let (update_tx, mut update_rx) = mpsc::channel(4);
        tokio::spawn(chain_task(
            FakeBackend { fail: true },
            request_rx,
            update_tx,
        ));

        request_tx
            .send(ChainRequest::EstimateFee(BondCall::Unbond { amount: 100 }))
            .await
            .unwrap();
        assert!(matches!(update_rx.recv().await, Some(ChainUpdate::Fee(None))));

        let mut submitter = ChannelSubmitter::new(request_tx, true);
        submitter.submit(tx()).unwrap();
        let update = update_rx.recv().await.unwrap();
        assert_eq!(
            update.session_event(),
            Some(SessionEvent::SubmissionFailed(
                "Failed to connect to chain: offline".to_string()
            ))
        );
    }

    #[test]
    fn test_fee_update_maps_to_session_event() {
        let update = ChainUpdate::Fee(Some(5));
        assert_eq!(
            update.session_event(),
            Some(SessionEvent::FeeEstimated(Some(5)))
        );
    }
}
