//! Chain client over WebSocket RPC.

use crate::config::endpoints_for;
use crate::error::ChainError;
use stkbond_core::{ConnectionStatus, Network};

use subxt::backend::rpc::RpcClient;
use subxt::{OnlineClient, PolkadotConfig};
use tokio::sync::mpsc;

/// Connected Asset Hub client.
pub struct ChainClient {
    network: Network,
    client: OnlineClient<PolkadotConfig>,
}

impl ChainClient {
    /// Connect to the network's Asset Hub, trying each endpoint in turn.
    ///
    /// `endpoint` replaces the default list when set.
    pub async fn connect_rpc(
        network: Network,
        endpoint: Option<&str>,
        status_tx: mpsc::Sender<ConnectionStatus>,
    ) -> Result<Self, ChainError> {
        let _ = status_tx.send(ConnectionStatus::Connecting).await;

        let endpoints = endpoints_for(network, endpoint);
        if endpoints.is_empty() {
            let _ = status_tx
                .send(ConnectionStatus::Error("No RPC endpoints configured".into()))
                .await;
            return Err(ChainError::Connection(
                "No RPC endpoints configured".to_string(),
            ));
        }

        let mut last_error = None;
        for endpoint in endpoints {
            tracing::info!("Trying {} Asset Hub via {}", network, endpoint);

            match RpcClient::from_url(endpoint).await {
                Ok(rpc_client) => {
                    match OnlineClient::<PolkadotConfig>::from_rpc_client(rpc_client).await {
                        Ok(client) => {
                            tracing::info!("Connected to {} Asset Hub via {}", network, endpoint);
                            let _ = status_tx.send(ConnectionStatus::Connected).await;
                            return Ok(Self { network, client });
                        }
                        Err(e) => {
                            tracing::warn!("Failed to create client from {}: {}", endpoint, e);
                            last_error = Some(e.to_string());
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to connect to {}: {}", endpoint, e);
                    last_error = Some(e.to_string());
                }
            }
        }

        let message = last_error.unwrap_or_else(|| "All endpoints failed".to_string());
        let _ = status_tx
            .send(ConnectionStatus::Error(message.clone()))
            .await;
        Err(ChainError::Connection(message))
    }

    /// Network this client is connected to.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Get the underlying subxt client.
    pub fn client(&self) -> &OnlineClient<PolkadotConfig> {
        &self.client
    }

    pub fn genesis_hash(&self) -> [u8; 32] {
        self.client.genesis_hash().0
    }

    /// Latest block number and hash.
    pub async fn get_latest_block(&self) -> Result<(u32, [u8; 32]), ChainError> {
        let block = self.client.blocks().at_latest().await?;
        Ok((block.number(), block.hash().0))
    }
}
