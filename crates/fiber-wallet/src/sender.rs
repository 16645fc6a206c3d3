//! The send pipeline.
//!
//! Validates the request, fetches outputs from the coin's gateway, selects
//! and assembles the transaction, signs it with keys from the registry and
//! optionally broadcasts it. Network calls never run under the registry
//! lock, and nothing here mutates a wallet or its file.

use std::sync::Arc;

use fiber_core::types::BalancePair;

use crate::builder::TransactionBuilder;
use crate::coin_selection::CoinSelector;
use crate::error::WalletError;
use crate::registry::WalletRegistry;

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    /// Hex of the canonical encoding.
    pub hex: String,
    /// Locally computed transaction id.
    pub txid: String,
}

/// Builds, signs and broadcasts spends for wallets in a registry.
#[derive(Debug, Clone)]
pub struct Sender {
    registry: Arc<WalletRegistry>,
}

impl Sender {
    pub fn new(registry: Arc<WalletRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<WalletRegistry> {
        &self.registry
    }

    /// Build and sign a transaction sending `amount` (decimal coins) to `to`.
    pub fn create_raw_transaction(
        &self,
        coin_type: &str,
        wallet_id: &str,
        to: &str,
        amount: &str,
        password: &str,
    ) -> Result<RawTransaction, WalletError> {
        let gateway = self.registry.gateway(coin_type)?;
        let wallet = self.registry.wallet(wallet_id)?;
        if wallet.coin_type() != coin_type {
            return Err(WalletError::WalletCoinMismatch {
                wallet: wallet_id.to_string(),
                coin: coin_type.to_string(),
            });
        }

        let destination = gateway.validate_address(to)?;
        let coin = gateway.coin();
        let droplets = coin.parse_amount(amount)?;
        if droplets == 0 {
            return Err(WalletError::ZeroAmountSend);
        }
        coin.check_precision(droplets)?;
        self.registry.verify_wallet_password(wallet_id, password)?;

        let outputs = gateway.get_outputs(&wallet.addresses())?;
        let selection = CoinSelector::select(&outputs, droplets)?;
        let unsigned = TransactionBuilder::build(&selection, destination, droplets)?;
        let keys = self
            .registry
            .keypairs_for(wallet_id, &unsigned.input_addresses(), password)?;
        let tx = TransactionBuilder::sign(unsigned, &keys)?;

        let raw = RawTransaction {
            hex: tx.to_hex()?,
            txid: tx.txid()?.to_hex(),
        };
        tracing::info!(
            coin = coin_type,
            wallet = wallet_id,
            txid = %raw.txid,
            inputs = tx.inputs.len(),
            amount = %coin.format_amount(droplets),
            "transaction signed"
        );
        Ok(raw)
    }

    /// Build, sign and broadcast. Returns the txid reported by the node.
    pub fn send(
        &self,
        coin_type: &str,
        wallet_id: &str,
        to: &str,
        amount: &str,
        password: &str,
    ) -> Result<String, WalletError> {
        let raw = self.create_raw_transaction(coin_type, wallet_id, to, amount, password)?;
        let gateway = self.registry.gateway(coin_type)?;
        let txid = gateway.broadcast(&raw.hex)?;
        if txid != raw.txid {
            tracing::warn!(local = %raw.txid, node = %txid, "node reported a different txid");
        }
        tracing::info!(coin = coin_type, wallet = wallet_id, txid = %txid, "transaction broadcast");
        Ok(txid)
    }

    /// Confirmed and predicted balance across all of a wallet's addresses.
    pub fn wallet_balance(&self, coin_type: &str, wallet_id: &str) -> Result<BalancePair, WalletError> {
        let gateway = self.registry.gateway(coin_type)?;
        let wallet = self.registry.wallet(wallet_id)?;
        if wallet.coin_type() != coin_type {
            return Err(WalletError::WalletCoinMismatch {
                wallet: wallet_id.to_string(),
                coin: coin_type.to_string(),
            });
        }
        Ok(gateway.get_balance(&wallet.addresses())?)
    }
}
