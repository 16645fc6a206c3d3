//! # fiber-core
//! Foundation types and traits shared by the fiber wallet engine.

pub mod address;
pub mod amount;
pub mod coin;
pub mod crypto;
pub mod error;
pub mod traits;
pub mod types;
