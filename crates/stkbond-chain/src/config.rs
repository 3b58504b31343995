//! Network endpoints.
//!
//! Staking and nomination pools live on Asset Hub, so both queries and bond
//! transactions use the Asset Hub endpoints.

use stkbond_core::Network;

/// Default Asset Hub RPC endpoints, tried in order.
pub fn get_asset_hub_endpoints(network: Network) -> &'static [&'static str] {
    match network {
        Network::Polkadot => &[
            "wss://polkadot-asset-hub-rpc.polkadot.io",
            "wss://rpc-asset-hub-polkadot.luckyfriday.io",
            "wss://sys.ibp.network/asset-hub-polkadot",
            "wss://asset-hub-polkadot-rpc.dwellir.com",
        ],
        Network::Kusama => &[
            "wss://kusama-asset-hub-rpc.polkadot.io",
            "wss://rpc-asset-hub-kusama.luckyfriday.io",
            "wss://sys.ibp.network/asset-hub-kusama",
        ],
        Network::Westend => &[
            "wss://westend-asset-hub-rpc.polkadot.io",
            "wss://sys.ibp.network/asset-hub-westend",
        ],
        Network::Paseo => &[
            "wss://sys.ibp.network/asset-hub-paseo",
            "wss://asset-hub-paseo-rpc.dwellir.com",
        ],
    }
}

/// Endpoints to try: the override alone if given, otherwise the defaults.
pub fn endpoints_for(network: Network, custom: Option<&str>) -> Vec<&str> {
    match custom {
        Some(endpoint) => vec![endpoint],
        None => get_asset_hub_endpoints(network).to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_network_has_endpoints() {
        for network in Network::all() {
            let endpoints = get_asset_hub_endpoints(*network);
            assert!(!endpoints.is_empty());
            assert!(endpoints.iter().all(|e| e.starts_with("wss://")));
        }
    }

    #[test]
    fn test_custom_endpoint_replaces_defaults() {
        let endpoints = endpoints_for(Network::Kusama, Some("ws://127.0.0.1:9944"));
        assert_eq!(endpoints, vec!["ws://127.0.0.1:9944"]);
    }

    #[test]
    fn test_defaults_without_override() {
        assert_eq!(
            endpoints_for(Network::Westend, None),
            get_asset_hub_endpoints(Network::Westend).to_vec()
        );
    }
}
