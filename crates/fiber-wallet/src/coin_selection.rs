//! Spendable-output selection.
//!
//! Picks as few outputs as possible: spendable outputs are sorted by coins
//! descending (output id breaks ties) and taken greedily until the target is
//! covered. When the spendable set falls short, the expected set decides
//! whether the funds are merely pending or truly missing.

use std::cmp::Reverse;

use fiber_core::error::TransactionError;
use fiber_core::types::{OutputSet, UnspentOutput};

use crate::error::WalletError;

/// Result of coin selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSelection {
    /// Outputs to spend, in selection order.
    pub selected: Vec<UnspentOutput>,
    /// Sum of selected coins in droplets.
    pub total_coins: u64,
    /// Sum of selected coin-hours.
    pub total_hours: u64,
}

/// Minimize-output-count selector.
pub struct CoinSelector;

impl CoinSelector {
    /// Select spendable outputs covering `target` droplets.
    ///
    /// If the chosen outputs carry no hours, the unselected spendable output
    /// with the most hours is added so the transaction can burn a fee.
    pub fn select(outputs: &OutputSet, target: u64) -> Result<CoinSelection, WalletError> {
        if target == 0 {
            return Err(WalletError::ZeroAmountSend);
        }

        let mut candidates: Vec<UnspentOutput> = outputs.spendable();
        candidates.sort_by_key(|o| (Reverse(o.coins), o.hash));

        let mut selected = Vec::new();
        let mut total_coins: u64 = 0;
        let mut rest = candidates.into_iter();
        for output in rest.by_ref() {
            if output.coins == 0 {
                continue;
            }
            total_coins = checked_sum(total_coins, output.coins)?;
            selected.push(output);
            if total_coins >= target {
                break;
            }
        }

        if total_coins < target {
            let expected = outputs
                .expected()
                .iter()
                .try_fold(0u64, |acc, o| checked_sum(acc, o.coins))?;
            return Err(if expected >= target {
                WalletError::BalanceNotYetConfirmed {
                    spendable: total_coins,
                    need: target,
                }
            } else {
                WalletError::InsufficientBalance {
                    have: total_coins,
                    need: target,
                }
            });
        }

        let mut total_hours = selected.iter().try_fold(0u64, |acc, o| checked_sum(acc, o.hours))?;
        if total_hours == 0 {
            // Zero-coin outputs were skipped above but still carry hours.
            let extra = rest
                .filter(|o| o.hours > 0)
                .min_by_key(|o| (Reverse(o.hours), o.hash));
            if let Some(output) = extra {
                total_coins = checked_sum(total_coins, output.coins)?;
                total_hours = output.hours;
                selected.push(output);
            }
        }

        tracing::debug!(
            inputs = selected.len(),
            total_coins,
            total_hours,
            target,
            "coins selected"
        );
        Ok(CoinSelection {
            selected,
            total_coins,
            total_hours,
        })
    }
}

fn checked_sum(acc: u64, value: u64) -> Result<u64, WalletError> {
    acc.checked_add(value)
        .ok_or(WalletError::Transaction(TransactionError::ValueOverflow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiber_core::address::Address;
    use fiber_core::types::Hash256;

    fn utxo(id: u8, coins: u64, hours: u64) -> UnspentOutput {
        UnspentOutput {
            hash: Hash256([id; 32]),
            src_tx: Hash256([0xEE; 32]),
            address: Address::from_key_hash([id; 20]),
            coins,
            hours,
        }
    }

    fn head(outputs: Vec<UnspentOutput>) -> OutputSet {
        OutputSet {
            head_outputs: outputs,
            ..OutputSet::default()
        }
    }

    fn ids(sel: &CoinSelection) -> Vec<u8> {
        sel.selected.iter().map(|o| o.hash.0[0]).collect()
    }

    #[test]
    fn prefers_fewer_larger_outputs() {
        let set = head(vec![utxo(1, 1, 1), utxo(2, 2, 1), utxo(3, 10, 1), utxo(4, 3, 1)]);
        let sel = CoinSelector::select(&set, 5).unwrap();
        assert_eq!(ids(&sel), vec![3]);
        assert_eq!(sel.total_coins, 10);
        assert_eq!(sel.total_hours, 1);
    }

    #[test]
    fn accumulates_until_covered() {
        let set = head(vec![utxo(1, 4, 2), utxo(2, 3, 5), utxo(3, 2, 7)]);
        let sel = CoinSelector::select(&set, 6).unwrap();
        assert_eq!(ids(&sel), vec![1, 2]);
        assert_eq!(sel.total_coins, 7);
        assert_eq!(sel.total_hours, 7);
    }

    #[test]
    fn ties_broken_by_output_id() {
        let set = head(vec![utxo(9, 5, 1), utxo(2, 5, 1), utxo(5, 5, 1)]);
        let sel = CoinSelector::select(&set, 5).unwrap();
        assert_eq!(ids(&sel), vec![2]);
        let sel = CoinSelector::select(&set, 10).unwrap();
        assert_eq!(ids(&sel), vec![2, 5]);
    }

    #[test]
    fn exact_cover_has_no_surplus() {
        let set = head(vec![utxo(1, 5, 3), utxo(2, 5, 3)]);
        let sel = CoinSelector::select(&set, 10).unwrap();
        assert_eq!(sel.total_coins, 10);
        assert_eq!(sel.selected.len(), 2);
    }

    #[test]
    fn pending_funds_are_not_yet_confirmed() {
        let set = OutputSet {
            head_outputs: vec![utxo(1, 5, 1)],
            outgoing_outputs: vec![],
            incoming_outputs: vec![utxo(2, 5, 1)],
        };
        assert_eq!(
            CoinSelector::select(&set, 8).unwrap_err(),
            WalletError::BalanceNotYetConfirmed { spendable: 5, need: 8 }
        );
        assert_eq!(
            CoinSelector::select(&set, 20).unwrap_err(),
            WalletError::InsufficientBalance { have: 5, need: 20 }
        );
    }

    #[test]
    fn reserved_outputs_are_not_spendable() {
        let reserved = utxo(1, 50, 10);
        let set = OutputSet {
            head_outputs: vec![reserved.clone(), utxo(2, 5, 1)],
            outgoing_outputs: vec![reserved],
            incoming_outputs: vec![],
        };
        let err = CoinSelector::select(&set, 20).unwrap_err();
        assert_eq!(err, WalletError::InsufficientBalance { have: 5, need: 20 });
    }

    #[test]
    fn empty_set_is_insufficient() {
        let err = CoinSelector::select(&OutputSet::default(), 1).unwrap_err();
        assert_eq!(err, WalletError::InsufficientBalance { have: 0, need: 1 });
    }

    #[test]
    fn zero_target_rejected() {
        let set = head(vec![utxo(1, 5, 1)]);
        assert_eq!(CoinSelector::select(&set, 0).unwrap_err(), WalletError::ZeroAmountSend);
    }

    #[test]
    fn adds_hour_bearing_output_when_selection_has_no_hours() {
        let set = head(vec![utxo(1, 10, 0), utxo(2, 1, 3), utxo(3, 2, 8), utxo(4, 0, 4)]);
        let sel = CoinSelector::select(&set, 10).unwrap();
        assert_eq!(ids(&sel), vec![1, 3]);
        assert_eq!(sel.total_coins, 12);
        assert_eq!(sel.total_hours, 8);
    }

    #[test]
    fn zero_coin_output_can_supply_hours() {
        let set = head(vec![utxo(1, 10, 0), utxo(2, 0, 6)]);
        let sel = CoinSelector::select(&set, 10).unwrap();
        assert_eq!(ids(&sel), vec![1, 2]);
        assert_eq!(sel.total_coins, 10);
        assert_eq!(sel.total_hours, 6);
    }

    #[test]
    fn no_hours_anywhere_leaves_selection_hourless() {
        let set = head(vec![utxo(1, 10, 0), utxo(2, 3, 0)]);
        let sel = CoinSelector::select(&set, 5).unwrap();
        assert_eq!(ids(&sel), vec![1]);
        assert_eq!(sel.total_hours, 0);
    }

    #[test]
    fn coin_overflow_is_an_error() {
        let set = head(vec![utxo(1, u64::MAX - 1, 1), utxo(2, 5, 1)]);
        assert_eq!(
            CoinSelector::select(&set, u64::MAX).unwrap_err(),
            WalletError::Transaction(TransactionError::ValueOverflow)
        );
    }

    #[test]
    fn hour_overflow_is_an_error() {
        let set = head(vec![utxo(1, 5, u64::MAX), utxo(2, 5, 1)]);
        assert_eq!(
            CoinSelector::select(&set, 10).unwrap_err(),
            WalletError::Transaction(TransactionError::ValueOverflow)
        );
    }
}
