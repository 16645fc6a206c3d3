//! Wallet error types.

use fiber_core::error::{AddressError, AmountError, CryptoError, GatewayError, TransactionError};
use thiserror::Error;

/// Errors that can occur in wallet, registry and send operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Authenticated decryption failed, or the password was empty.
    #[error("wrong password")]
    WrongPassword,

    /// A wallet with this id is already registered.
    #[error("wallet {0} already exists")]
    DuplicateWallet(String),

    #[error("wallet {0} not found")]
    WalletNotFound(String),

    /// No gateway is registered for the coin type.
    #[error("coin type {0} is not registered")]
    CoinTypeNotRegistered(String),

    #[error("coin type {0} is already registered")]
    CoinAlreadyRegistered(String),

    /// Coin type is not in the configured coin table.
    #[error("unsupported coin type: {0}")]
    UnsupportedCoinType(String),

    /// Wallet belongs to a different network than the one requested.
    #[error("wallet {wallet} does not belong to coin {coin}")]
    WalletCoinMismatch {
        wallet: String,
        coin: String,
    },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("address {0} is not in the wallet")]
    AddressNotInWallet(String),

    #[error("cannot send zero coins")]
    ZeroAmountSend,

    /// Amount uses finer precision than the network allows.
    #[error("amount has too many decimal places (max {max})")]
    TooManyDecimalPlaces {
        max: u32,
    },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// More addresses requested in one call than a single derivation allows.
    #[error("cannot derive {requested} addresses at once (max {max})")]
    TooManyAddresses {
        requested: usize,
        max: usize,
    },

    /// Spendable plus expected outputs cannot cover the amount.
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Spendable droplets.
        have: u64,
        /// Requested droplets.
        need: u64,
    },

    /// Funds exist but are reserved by or pending in unconfirmed transactions.
    #[error("balance is not yet confirmed: spendable {spendable}, need {need}")]
    BalanceNotYetConfirmed {
        spendable: u64,
        need: u64,
    },

    /// The selected outputs carry no coin-hours to burn.
    #[error("transaction has zero coinhour fee")]
    ZeroFee,

    /// Internal invariant: change is due but no output supplied an address.
    #[error("no change address to receive balance")]
    NoChangeAddress,

    /// Internal invariant: more outputs than the protocol allows.
    #[error("too many outputs: {0}")]
    TooManyOutputs(usize),

    /// Secret material is not loaded.
    #[error("wallet {0} is locked")]
    WalletLocked(String),

    #[error("serialization failure: {0}")]
    SerializationFailure(String),

    #[error("encryption: {0}")]
    Encryption(String),

    /// Wallet file is corrupted or has invalid format.
    #[error("corrupted file: {0}")]
    CorruptedFile(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// Node communication failed. Not retried.
    #[error("gateway unavailable: {0}")]
    GatewayUnavailable(#[from] GatewayError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl From<AmountError> for WalletError {
    fn from(e: AmountError) -> Self {
        match e {
            AmountError::TooManyDecimals { max, .. } => WalletError::TooManyDecimalPlaces { max },
            other => WalletError::InvalidAmount(other.to_string()),
        }
    }
}

impl From<AddressError> for WalletError {
    fn from(e: AddressError) -> Self {
        WalletError::InvalidAddress(e.to_string())
    }
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        WalletError::Io(e.to_string())
    }
}
