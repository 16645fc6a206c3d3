//! Error types for the fiber core primitives.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58 encoding")] InvalidBase58,
    #[error("invalid length: {0}")] InvalidLength(usize),
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid version: {0}")] InvalidVersion(u8),
    #[error("empty address")] Empty,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid secret key bytes")] InvalidSecretKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("signature verification failed")] VerificationFailed,
    #[error("public key does not match address {0}")] AddressMismatch(String),
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount")] Empty,
    #[error("invalid character in amount: {0:?}")] InvalidCharacter(char),
    #[error("too many decimal places: {got} > {max}")] TooManyDecimals { got: u32, max: u32 },
    #[error("amount overflow")] Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("no inputs")] NoInputs,
    #[error("output count {0} outside 1..=2")] OutputCount(usize),
    #[error("signature count {sigs} does not match input count {inputs}")] SignatureCount { sigs: usize, inputs: usize },
    #[error("inner hash mismatch")] InnerHashMismatch,
    #[error("value overflow")] ValueOverflow,
    #[error("serialization: {0}")] Serialization(String),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

/// Failures talking to a ledger node. Never retried by the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("node {node} unreachable: {reason}")] Unreachable { node: String, reason: String },
    #[error("node returned HTTP {status}: {body}")] Status { status: u16, body: String },
    #[error("malformed node response: {0}")] Decode(String),
    #[error("transaction rejected: {0}")] Rejected(String),
}
