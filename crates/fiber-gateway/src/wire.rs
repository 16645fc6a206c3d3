//! JSON shapes returned by the node API and their conversion to core types.

use serde::{Deserialize, Serialize};

use fiber_core::address::Address;
use fiber_core::coin::CoinConfig;
use fiber_core::error::GatewayError;
use fiber_core::types::{Balance, BalancePair, Hash256, OutputSet, UnspentOutput};

/// One output as the node renders it. `coins` is a decimal string.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReadableOutput {
    pub hash: String,
    pub src_tx: String,
    pub address: String,
    pub coins: String,
    pub hours: u64,
}

impl ReadableOutput {
    fn into_unspent(self, coin: &CoinConfig) -> Result<UnspentOutput, GatewayError> {
        Ok(UnspentOutput {
            hash: Hash256::from_hex(&self.hash)
                .map_err(|e| GatewayError::Decode(format!("output hash: {e}")))?,
            src_tx: Hash256::from_hex(&self.src_tx)
                .map_err(|e| GatewayError::Decode(format!("output src_tx: {e}")))?,
            address: Address::decode(&self.address)
                .map_err(|e| GatewayError::Decode(format!("output address: {e}")))?,
            coins: coin
                .parse_amount(&self.coins)
                .map_err(|e| GatewayError::Decode(format!("output coins {:?}: {e}", self.coins)))?,
            hours: self.hours,
        })
    }
}

/// Response of `GET /outputs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ReadableOutputSet {
    #[serde(default)]
    pub head_outputs: Vec<ReadableOutput>,
    #[serde(default)]
    pub outgoing_outputs: Vec<ReadableOutput>,
    #[serde(default)]
    pub incoming_outputs: Vec<ReadableOutput>,
}

impl ReadableOutputSet {
    pub fn into_output_set(self, coin: &CoinConfig) -> Result<OutputSet, GatewayError> {
        let convert = |outs: Vec<ReadableOutput>| -> Result<Vec<UnspentOutput>, GatewayError> {
            outs.into_iter().map(|o| o.into_unspent(coin)).collect()
        };
        Ok(OutputSet {
            head_outputs: convert(self.head_outputs)?,
            outgoing_outputs: convert(self.outgoing_outputs)?,
            incoming_outputs: convert(self.incoming_outputs)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct ReadableBalance {
    pub coins: u64,
    pub hours: u64,
}

/// Response of `GET /balance`. Coins are droplets here.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct BalanceResult {
    pub confirmed: ReadableBalance,
    pub predicted: ReadableBalance,
}

impl From<BalanceResult> for BalancePair {
    fn from(b: BalanceResult) -> Self {
        BalancePair {
            confirmed: Balance {
                coins: b.confirmed.coins,
                hours: b.confirmed.hours,
            },
            predicted: Balance {
                coins: b.predicted.coins,
                hours: b.predicted.hours,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct TransactionStatus {
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub height: u64,
}

/// The `status` part of `GET /transaction`; the rest is kept as raw JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TransactionResult {
    #[serde(default)]
    pub status: TransactionStatus,
}

/// Body of `POST /injectTransaction`.
#[derive(Debug, Serialize)]
pub(crate) struct InjectRequest<'a> {
    pub rawtx: &'a str,
}

/// The node answers an injection with the txid as a JSON string; some
/// builds send it bare.
pub(crate) fn parse_txid(body: &str) -> Result<String, GatewayError> {
    let txid = match serde_json::from_str::<String>(body) {
        Ok(s) => s,
        Err(_) => body.trim().trim_matches('"').to_string(),
    };
    Hash256::from_hex(&txid).map_err(|e| GatewayError::Decode(format!("txid {txid:?}: {e}")))?;
    Ok(txid)
}
