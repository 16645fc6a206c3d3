//! Blocking HTTP client for the fiber node API.

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use fiber_core::address::Address;
use fiber_core::coin::CoinConfig;
use fiber_core::error::GatewayError;
use fiber_core::traits::Gateway;
use fiber_core::types::{BalancePair, OutputSet, TransactionInfo};

use crate::config::GatewayConfig;
use crate::wire::{parse_txid, BalanceResult, InjectRequest, ReadableOutputSet, TransactionResult};

/// [`Gateway`] backed by a node's JSON HTTP API.
///
/// Endpoints: `GET /outputs?addrs=`, `GET /balance?addrs=`,
/// `GET /transaction?txid=`, `POST /injectTransaction`.
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Unreachable {
                node: config.node_addr.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn unreachable(&self, e: reqwest::Error) -> GatewayError {
        GatewayError::Unreachable {
            node: self.config.node_addr.clone(),
            reason: e.to_string(),
        }
    }

    /// Read the body, mapping non-success statuses to [`GatewayError::Status`].
    fn read_body(&self, resp: Response) -> Result<String, GatewayError> {
        let status = resp.status();
        let body = resp.text().map_err(|e| self.unreachable(e))?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        Ok(body)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, GatewayError> {
        let url = self.config.url(path);
        tracing::debug!(%url, "node request");
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| self.unreachable(e))?;
        let body = self.read_body(resp)?;
        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(format!("{path}: {e}")))
    }

    fn join_addresses(addresses: &[Address]) -> String {
        addresses
            .iter()
            .map(Address::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Gateway for HttpGateway {
    fn coin(&self) -> &CoinConfig {
        &self.config.coin
    }

    fn get_outputs(&self, addresses: &[Address]) -> Result<OutputSet, GatewayError> {
        if addresses.is_empty() {
            return Ok(OutputSet::default());
        }
        let addrs = Self::join_addresses(addresses);
        let set: ReadableOutputSet = self.get_json("/outputs", &[("addrs", &addrs)])?;
        set.into_output_set(&self.config.coin)
    }

    fn get_transaction(&self, txid: &str) -> Result<TransactionInfo, GatewayError> {
        let raw: serde_json::Value = self.get_json("/transaction", &[("txid", txid)])?;
        let result: TransactionResult = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::Decode(format!("/transaction: {e}")))?;
        Ok(TransactionInfo {
            txid: txid.to_string(),
            confirmed: result.status.confirmed,
            height: result.status.confirmed.then_some(result.status.height),
            raw,
        })
    }

    fn broadcast(&self, raw_tx_hex: &str) -> Result<String, GatewayError> {
        let url = self.config.url("/injectTransaction");
        let resp = self
            .client
            .post(&url)
            .json(&InjectRequest { rawtx: raw_tx_hex })
            .send()
            .map_err(|e| self.unreachable(e))?;
        let body = match self.read_body(resp) {
            Err(GatewayError::Status { status, body }) if (400..500).contains(&status) => {
                tracing::warn!(coin = %self.config.coin.name, status, "transaction rejected");
                return Err(GatewayError::Rejected(body));
            }
            other => other?,
        };
        let txid = parse_txid(&body)?;
        tracing::info!(coin = %self.config.coin.name, %txid, "transaction broadcast");
        Ok(txid)
    }

    fn get_balance(&self, addresses: &[Address]) -> Result<BalancePair, GatewayError> {
        if addresses.is_empty() {
            return Ok(BalancePair::default());
        }
        let addrs = Self::join_addresses(addresses);
        let balance: BalanceResult = self.get_json("/balance", &[("addrs", &addrs)])?;
        Ok(balance.into())
    }
}
