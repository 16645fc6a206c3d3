//! Coin-hour fee and output split.

use crate::error::WalletError;

/// At least `1 / BURN_FACTOR` of spent coin-hours are burned as the fee.
pub const BURN_FACTOR: u64 = 2;

/// How a transaction's input hours are divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoursSplit {
    /// Hours burned.
    pub fee: u64,
    /// Hours attached to the change output. Zero without change.
    pub change_hours: u64,
    /// Hours attached to the destination output.
    pub dest_hours: u64,
}

/// Hours that must be burned when spending `hours`: `ceil(hours / BURN_FACTOR)`.
pub fn required_fee(hours: u64) -> u64 {
    hours.div_ceil(BURN_FACTOR)
}

/// Burn the required fee and split the remaining hours.
///
/// With change, the change output takes the larger half of an odd remainder.
pub fn distribute_hours(total_hours: u64, has_change: bool) -> Result<HoursSplit, WalletError> {
    let fee = required_fee(total_hours);
    if fee == 0 {
        return Err(WalletError::ZeroFee);
    }
    let remaining = total_hours - fee;
    let (change_hours, dest_hours) = if has_change {
        let change = remaining.div_ceil(2);
        (change, remaining - change)
    } else {
        (0, remaining)
    };
    Ok(HoursSplit {
        fee,
        change_hours,
        dest_hours,
    })
}
