//! Trait interfaces for the fiber wallet engine.
//!
//! - [`Gateway`]: access to a ledger node for one coin network
//!   (fiber-gateway implements it over HTTP)

use crate::address::Address;
use crate::coin::CoinConfig;
use crate::error::{AddressError, GatewayError};
use crate::types::{Balance, BalancePair, OutputSet, TransactionInfo, UnspentOutput};

/// Node access for one network in the fiber family.
///
/// Implementations perform blocking network I/O. Callers must not hold
/// wallet locks across these calls. Errors are returned as-is; the engine
/// never retries.
pub trait Gateway: Send + Sync {
    /// Constants of the network this gateway talks to.
    fn coin(&self) -> &CoinConfig;

    /// Unspent outputs owned by `addresses`, split by confirmation state.
    fn get_outputs(&self, addresses: &[Address]) -> Result<OutputSet, GatewayError>;

    /// Look up a transaction by hex id.
    fn get_transaction(&self, txid: &str) -> Result<TransactionInfo, GatewayError>;

    /// Whether a transaction has been included in a block.
    ///
    /// Default implementation delegates to [`get_transaction`](Self::get_transaction).
    fn is_confirmed(&self, txid: &str) -> Result<bool, GatewayError> {
        Ok(self.get_transaction(txid)?.confirmed)
    }

    /// Submit a hex-encoded signed transaction. Returns the node's txid.
    fn broadcast(&self, raw_tx_hex: &str) -> Result<String, GatewayError>;

    /// Decode and checksum an address string.
    fn validate_address(&self, address: &str) -> Result<Address, AddressError> {
        Address::decode(address)
    }

    /// Confirmed and predicted balance of `addresses`.
    ///
    /// Default implementation sums [`get_outputs`](Self::get_outputs):
    /// confirmed counts every head output, predicted drops outputs
    /// reserved by pending spends and adds incoming ones.
    fn get_balance(&self, addresses: &[Address]) -> Result<BalancePair, GatewayError> {
        let outputs = self.get_outputs(addresses)?;
        Ok(BalancePair {
            confirmed: sum_outputs(&outputs.head_outputs)?,
            predicted: sum_outputs(&outputs.expected())?,
        })
    }
}

fn sum_outputs(outputs: &[UnspentOutput]) -> Result<Balance, GatewayError> {
    outputs.iter().try_fold(Balance::default(), |acc, o| {
        Ok(Balance {
            coins: acc
                .coins
                .checked_add(o.coins)
                .ok_or_else(|| GatewayError::Decode("balance overflow".into()))?,
            hours: acc
                .hours
                .checked_add(o.hours)
                .ok_or_else(|| GatewayError::Decode("balance overflow".into()))?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hash256;

    struct FixedGateway {
        coin: CoinConfig,
        outputs: OutputSet,
    }

    impl Gateway for FixedGateway {
        fn coin(&self) -> &CoinConfig {
            &self.coin
        }

        fn get_outputs(&self, _addresses: &[Address]) -> Result<OutputSet, GatewayError> {
            Ok(self.outputs.clone())
        }

        fn get_transaction(&self, txid: &str) -> Result<TransactionInfo, GatewayError> {
            Ok(TransactionInfo {
                txid: txid.to_string(),
                confirmed: txid == "done",
                height: None,
                raw: serde_json::Value::Null,
            })
        }

        fn broadcast(&self, _raw_tx_hex: &str) -> Result<String, GatewayError> {
            Err(GatewayError::Rejected("read-only".into()))
        }
    }

    fn out(n: u8, coins: u64, hours: u64) -> UnspentOutput {
        UnspentOutput {
            hash: Hash256([n; 32]),
            src_tx: Hash256::ZERO,
            address: Address::from_key_hash([1; 20]),
            coins,
            hours,
        }
    }

    fn gateway() -> FixedGateway {
        FixedGateway {
            coin: CoinConfig::new("skycoin", "SKY"),
            outputs: OutputSet {
                head_outputs: vec![out(1, 5_000_000, 10), out(2, 2_000_000, 4)],
                outgoing_outputs: vec![out(2, 2_000_000, 4)],
                incoming_outputs: vec![out(3, 1_000_000, 1)],
            },
        }
    }

    #[test]
    fn default_balance_from_outputs() {
        let balance = gateway().get_balance(&[]).unwrap();
        assert_eq!(balance.confirmed, Balance { coins: 7_000_000, hours: 14 });
        assert_eq!(balance.predicted, Balance { coins: 6_000_000, hours: 11 });
    }

    #[test]
    fn default_is_confirmed() {
        let gw = gateway();
        assert!(gw.is_confirmed("done").unwrap());
        assert!(!gw.is_confirmed("pending").unwrap());
    }

    #[test]
    fn default_validate_address() {
        let gw = gateway();
        let addr = Address::from_key_hash([4; 20]);
        assert_eq!(gw.validate_address(&addr.to_string()).unwrap(), addr);
        assert!(gw.validate_address("garbage").is_err());
    }
}
