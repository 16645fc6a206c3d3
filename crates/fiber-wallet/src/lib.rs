//! # fiber-wallet: multi-coin deterministic wallets and spend construction.
//!
//! Manages encrypted deterministic wallets for several networks of the fiber
//! family, keeps them in a shared registry backed by crash-safe files, and
//! builds, fees and signs spend transactions against outputs reported by a
//! [`Gateway`](fiber_core::traits::Gateway).
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum
//! - [`encryption`]: Argon2id + AES-256-GCM secret blobs
//! - [`keys`]: BLAKE3 seed chain
//! - [`mnemonic`]: fresh 12-word seeds
//! - [`wallet`]: wallet entity, lock/unlock, file format
//! - [`store`]: temp/backup/rename persistence
//! - [`config`]: registry configuration
//! - [`registry`]: process-wide wallet registry
//! - [`coin_selection`]: minimize-output-count selection
//! - [`fees`]: coin-hour burn and split
//! - [`builder`]: transaction assembly and signing
//! - [`sender`]: the validate/select/sign/broadcast pipeline

pub mod builder;
pub mod coin_selection;
pub mod config;
pub mod encryption;
pub mod error;
pub mod fees;
pub mod keys;
pub mod mnemonic;
pub mod registry;
pub mod sender;
pub mod store;
pub mod wallet;

pub use builder::{TransactionBuilder, UnsignedTransaction};
pub use coin_selection::{CoinSelection, CoinSelector};
pub use config::RegistryConfig;
pub use encryption::KdfParams;
pub use error::WalletError;
pub use fees::{distribute_hours, required_fee, HoursSplit, BURN_FACTOR};
pub use mnemonic::new_seed;
pub use registry::WalletRegistry;
pub use sender::{RawTransaction, Sender};
pub use wallet::{make_wallet_id, Unlocked, Wallet, MAX_DERIVE_BATCH};
