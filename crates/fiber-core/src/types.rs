//! Core ledger types: hashes, transaction inputs/outputs, unspent outputs.
//!
//! All coin amounts are in droplets (the indivisible unit, see
//! [`amount`](crate::amount)). Hours are plain integers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::address::Address;
use crate::error::TransactionError;

/// Hard protocol limit on the number of outputs a wallet transaction carries:
/// the destination plus an optional change output.
pub const MAX_TX_OUTPUTS: usize = 2;

/// A 32-byte hash value.
///
/// Used for output ids, transaction ids and inner hashes (all BLAKE3).
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// BLAKE3 of arbitrary bytes.
    pub fn digest(data: &[u8]) -> Self {
        Self(blake3::hash(data).into())
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(s).map_err(|e| TransactionError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| TransactionError::InvalidHex(format!("expected 32 bytes, got {}", v.len())))?;
        Ok(Self(arr))
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An input to be spent: the unspent output id and the address owning it.
///
/// The address is carried so the signer can look up the right key without
/// another round trip to the node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxIn {
    pub output_id: Hash256,
    pub address: Address,
}

/// A transaction output.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct TxOut {
    /// Recipient address.
    pub address: Address,
    /// Amount in droplets.
    pub coins: u64,
    /// Coin-hours transferred with the output.
    pub hours: u64,
}

/// Signature over one input's sighash, with the key that produced it.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct InputSignature {
    /// Ed25519 public key (32 bytes).
    pub public_key: [u8; 32],
    /// Ed25519 signature (64 bytes).
    pub signature: Vec<u8>,
}

/// A spend transaction in the fiber wire format.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Transaction {
    /// BLAKE3 over the encoded inputs and outputs.
    pub inner_hash: Hash256,
    /// Ids of the unspent outputs consumed.
    pub inputs: Vec<Hash256>,
    /// New outputs: destination first, then optional change.
    pub outputs: Vec<TxOut>,
    /// One signature per input, in input order. Empty until signed.
    pub signatures: Vec<InputSignature>,
}

impl Transaction {
    /// Build an unsigned transaction and compute its inner hash.
    pub fn new(inputs: &[TxIn], outputs: Vec<TxOut>) -> Result<Self, TransactionError> {
        if inputs.is_empty() {
            return Err(TransactionError::NoInputs);
        }
        if outputs.is_empty() || outputs.len() > MAX_TX_OUTPUTS {
            return Err(TransactionError::OutputCount(outputs.len()));
        }
        let mut tx = Self {
            inner_hash: Hash256::ZERO,
            inputs: inputs.iter().map(|i| i.output_id).collect(),
            outputs,
            signatures: Vec::new(),
        };
        tx.inner_hash = tx.compute_inner_hash()?;
        Ok(tx)
    }

    /// Hash of the inputs and outputs, excluding signatures.
    pub fn compute_inner_hash(&self) -> Result<Hash256, TransactionError> {
        let config = bincode::config::standard();
        let mut data = bincode::encode_to_vec(&self.inputs, config)
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        let outputs = bincode::encode_to_vec(&self.outputs, config)
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        data.extend_from_slice(&outputs);
        Ok(Hash256::digest(&data))
    }

    /// Transaction id: BLAKE3 of the full canonical encoding.
    pub fn txid(&self) -> Result<Hash256, TransactionError> {
        Ok(Hash256::digest(&self.serialize()?))
    }

    /// Canonical binary encoding (bincode, standard config).
    pub fn serialize(&self) -> Result<Vec<u8>, TransactionError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))
    }

    /// Decode the canonical binary encoding.
    ///
    /// Rejects trailing bytes, a stale inner hash, and a signature list that
    /// is neither empty nor one per input.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, TransactionError> {
        let (tx, read): (Self, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        if read != bytes.len() {
            return Err(TransactionError::Serialization(format!(
                "{} trailing bytes",
                bytes.len() - read
            )));
        }
        if tx.inner_hash != tx.compute_inner_hash()? {
            return Err(TransactionError::InnerHashMismatch);
        }
        if !tx.signatures.is_empty() && tx.signatures.len() != tx.inputs.len() {
            return Err(TransactionError::SignatureCount {
                sigs: tx.signatures.len(),
                inputs: tx.inputs.len(),
            });
        }
        Ok(tx)
    }

    /// Hex of the canonical encoding, the form nodes accept for injection.
    pub fn to_hex(&self) -> Result<String, TransactionError> {
        Ok(hex::encode(self.serialize()?))
    }

    /// Parse a hex-encoded raw transaction.
    pub fn from_hex(raw: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(raw.trim()).map_err(|e| TransactionError::InvalidHex(e.to_string()))?;
        Self::deserialize(&bytes)
    }

    /// Sum of output coins. Returns an error on overflow.
    pub fn total_coins(&self) -> Result<u64, TransactionError> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.coins))
            .ok_or(TransactionError::ValueOverflow)
    }

    /// Sum of output hours. Returns an error on overflow.
    pub fn total_hours(&self) -> Result<u64, TransactionError> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.hours))
            .ok_or(TransactionError::ValueOverflow)
    }
}

/// An unspent output as reported by a node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UnspentOutput {
    /// Output id.
    pub hash: Hash256,
    /// Transaction that created the output.
    pub src_tx: Hash256,
    /// Owning address.
    pub address: Address,
    /// Amount in droplets.
    pub coins: u64,
    /// Coin-hours currently attached.
    pub hours: u64,
}

/// Unspent outputs for a set of addresses, split by confirmation state.
///
/// `head_outputs` are confirmed. `outgoing_outputs` are confirmed outputs
/// already consumed by an unconfirmed spend. `incoming_outputs` are created
/// by unconfirmed transactions.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputSet {
    pub head_outputs: Vec<UnspentOutput>,
    pub outgoing_outputs: Vec<UnspentOutput>,
    pub incoming_outputs: Vec<UnspentOutput>,
}

impl OutputSet {
    /// Confirmed outputs not reserved by a pending spend.
    pub fn spendable(&self) -> Vec<UnspentOutput> {
        let outgoing: HashSet<Hash256> = self.outgoing_outputs.iter().map(|o| o.hash).collect();
        self.head_outputs
            .iter()
            .filter(|o| !outgoing.contains(&o.hash))
            .cloned()
            .collect()
    }

    /// Spendable outputs plus those expected once pending transactions confirm.
    pub fn expected(&self) -> Vec<UnspentOutput> {
        let mut outs = self.spendable();
        outs.extend(self.incoming_outputs.iter().cloned());
        outs
    }
}

/// Coins and hours held by a set of addresses.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Balance {
    /// Droplets.
    pub coins: u64,
    pub hours: u64,
}

/// Confirmed balance alongside the balance predicted after pending spends.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BalancePair {
    pub confirmed: Balance,
    pub predicted: Balance,
}

/// Status of a transaction as reported by a node.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionInfo {
    pub txid: String,
    pub confirmed: bool,
    /// Block height once confirmed.
    pub height: Option<u64>,
    /// The node's full response, for callers that need more detail.
    pub raw: serde_json::Value,
}
