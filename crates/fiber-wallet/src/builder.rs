//! Transaction assembly and signing.
//!
//! 1. Build an unsigned transaction from a coin selection (fee and hours split)
//! 2. Sign every input with the keypair owning its address

use fiber_core::address::Address;
use fiber_core::crypto::{sign_inputs, KeyPair};
use fiber_core::error::CryptoError;
use fiber_core::types::{Transaction, TxIn, TxOut, MAX_TX_OUTPUTS};

use crate::coin_selection::CoinSelection;
use crate::error::WalletError;
use crate::fees::{distribute_hours, HoursSplit};

/// An unsigned transaction ready for signing.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    /// The transaction with no signatures.
    pub tx: Transaction,
    /// Inputs with their owning addresses, in transaction order.
    pub inputs: Vec<TxIn>,
    /// How input hours were split.
    pub hours: HoursSplit,
}

impl UnsignedTransaction {
    /// Owning address of each input, for signing key lookup.
    pub fn input_addresses(&self) -> Vec<Address> {
        self.inputs.iter().map(|i| i.address).collect()
    }
}

/// Builds spend transactions: one destination and an optional change output.
pub struct TransactionBuilder;

impl TransactionBuilder {
    /// Build an unsigned transaction sending `amount` droplets to `destination`.
    ///
    /// Change, if any, returns to the address of the first selected output.
    pub fn build(
        selection: &CoinSelection,
        destination: Address,
        amount: u64,
    ) -> Result<UnsignedTransaction, WalletError> {
        if amount == 0 {
            return Err(WalletError::ZeroAmountSend);
        }
        let change = selection
            .total_coins
            .checked_sub(amount)
            .ok_or(WalletError::InsufficientBalance {
                have: selection.total_coins,
                need: amount,
            })?;
        let hours = distribute_hours(selection.total_hours, change > 0)?;

        let inputs: Vec<TxIn> = selection
            .selected
            .iter()
            .map(|o| TxIn {
                output_id: o.hash,
                address: o.address,
            })
            .collect();

        let mut outputs = Vec::with_capacity(MAX_TX_OUTPUTS);
        outputs.push(TxOut {
            address: destination,
            coins: amount,
            hours: hours.dest_hours,
        });
        if change > 0 {
            let change_address = inputs.first().map(|i| i.address).ok_or(WalletError::NoChangeAddress)?;
            outputs.push(TxOut {
                address: change_address,
                coins: change,
                hours: hours.change_hours,
            });
        }
        if outputs.len() > MAX_TX_OUTPUTS {
            return Err(WalletError::TooManyOutputs(outputs.len()));
        }

        let tx = Transaction::new(&inputs, outputs)?;
        Ok(UnsignedTransaction { tx, inputs, hours })
    }

    /// Sign all inputs. `keys[i]` must own input `i`'s address.
    pub fn sign(unsigned: UnsignedTransaction, keys: &[KeyPair]) -> Result<Transaction, WalletError> {
        if keys.len() != unsigned.inputs.len() {
            return Err(CryptoError::InputIndexOutOfBounds {
                index: keys.len(),
                len: unsigned.inputs.len(),
            }
            .into());
        }
        for (input, kp) in unsigned.inputs.iter().zip(keys) {
            if kp.address() != input.address {
                return Err(CryptoError::AddressMismatch(input.address.to_string()).into());
            }
        }

        let mut tx = unsigned.tx;
        sign_inputs(&mut tx, keys)?;
        Ok(tx)
    }
}
