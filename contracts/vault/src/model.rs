//! Amount Models
//!
//! The redemption engine is the same for continuous amounts and for discrete
//! item sets. What differs (how units are received, which sinks count, how
//! units leave circulation, where the hook is called) is captured by
//! [`AmountModel`], implemented by [`Fungible`] and [`ItemSet`].

use std::collections::HashSet;
use std::fmt::Debug;

use glue_common::{
    addresses::{DEAD_ADDRESS, ZERO_ADDRESS},
    safe_add, safe_sub, Address, AssetKind, GlueError, GlueResult, Host, ItemId, VaultRecord,
};

use crate::{hooks, probe};

/// Accounting differences between asset kinds
pub trait AmountModel: Sized + 'static {
    /// What a holder surrenders
    type Surrender: Clone + Debug;

    /// Asset kind bound by vaults of this model
    const KIND: AssetKind;

    /// Fails fast on empty or malformed input
    fn validate(surrender: &Self::Surrender) -> GlueResult<()>;

    /// Units the surrender stands for
    fn units(surrender: &Self::Surrender) -> u128;

    /// Moves the surrender from `from` to `to` and returns the net increase
    /// measured at `to`.
    ///
    /// # Errors
    /// `TransferFailed` if nothing arrived.
    fn receive(
        host: &mut Host,
        asset: Address,
        from: Address,
        to: Address,
        surrender: &Self::Surrender,
    ) -> GlueResult<u128>;

    /// Surrender to pass on after an intermediary received `received` units
    fn forward(surrender: &Self::Surrender, received: u128) -> Self::Surrender;

    /// First-redemption supply probes. Returns the units still available.
    fn learn_supply(_host: &mut Host, _vault: Address, real: u128) -> GlueResult<u128> {
        Ok(real)
    }

    /// Lets the hook claim part of the surrender before it is retired.
    /// Returns the units left to retire.
    fn claim_before_retire(
        _host: &mut Host,
        _vault: Address,
        real: u128,
        _recipient: Address,
    ) -> GlueResult<u128> {
        Ok(real)
    }

    /// Holdings at unreachable sinks still included in total supply
    fn sink_holdings(host: &Host, record: &VaultRecord) -> GlueResult<u128>;

    /// Takes the received units out of circulation
    fn retire(
        host: &mut Host,
        vault: Address,
        surrender: &Self::Surrender,
        real: u128,
    ) -> GlueResult<()>;

    /// Notification once the surrender is retired
    fn notify_after_retire(
        _host: &mut Host,
        _vault: Address,
        _surrender: &Self::Surrender,
        _recipient: Address,
    ) -> GlueResult<()> {
        Ok(())
    }

    /// Item identifiers for the redemption record
    fn items(_surrender: &Self::Surrender) -> Vec<ItemId> {
        Vec::new()
    }
}

// ============ Fungible ============

/// Continuous-amount backed assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fungible;

impl AmountModel for Fungible {
    type Surrender = u128;

    const KIND: AssetKind = AssetKind::Fungible;

    fn validate(amount: &u128) -> GlueResult<()> {
        if *amount == 0 {
            return Err(GlueError::ZeroAmount);
        }
        Ok(())
    }

    fn units(amount: &u128) -> u128 {
        *amount
    }

    fn receive(
        host: &mut Host,
        asset: Address,
        from: Address,
        to: Address,
        amount: &u128,
    ) -> GlueResult<u128> {
        let before = host.ledger().balance_of(&asset, &to)?;
        host.ledger_mut().transfer(asset, from, to, *amount)?;
        let after = host.ledger().balance_of(&asset, &to)?;

        let delta = after.saturating_sub(before);
        if delta == 0 {
            return Err(GlueError::TransferFailed {
                asset,
                from,
                to,
                amount: *amount,
            });
        }
        Ok(delta)
    }

    fn forward(_amount: &u128, received: u128) -> u128 {
        received
    }

    fn learn_supply(host: &mut Host, vault: Address, real: u128) -> GlueResult<u128> {
        probe::learn_zero_address(host, vault, real)
    }

    fn claim_before_retire(
        host: &mut Host,
        vault: Address,
        real: u128,
        recipient: Address,
    ) -> GlueResult<u128> {
        let backed = host.vault(&vault)?.backed_asset;
        let claim = hooks::claim(host, vault, backed, real, recipient)?;
        Ok(claim.residual)
    }

    fn sink_holdings(host: &Host, record: &VaultRecord) -> GlueResult<u128> {
        let ledger = host.ledger();
        let mut held = ledger.balance_of(&record.backed_asset, &DEAD_ADDRESS)?;
        if record.flags.zero_address_included() {
            held = safe_add(held, ledger.balance_of(&record.backed_asset, &ZERO_ADDRESS)?)?;
        }
        Ok(held)
    }

    fn retire(host: &mut Host, vault: Address, _amount: &u128, real: u128) -> GlueResult<()> {
        if real == 0 {
            return Ok(());
        }
        let asset = host.vault(&vault)?.backed_asset;
        probe::retire_with_fallback(
            host,
            vault,
            |h| h.ledger_mut().burn(asset, vault, real),
            |h| h.ledger_mut().transfer(asset, vault, DEAD_ADDRESS, real),
        )
    }
}

// ============ Item Set ============

/// Discrete item-collection backed assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSet;

impl AmountModel for ItemSet {
    type Surrender = Vec<ItemId>;

    const KIND: AssetKind = AssetKind::ItemSet;

    fn validate(items: &Vec<ItemId>) -> GlueResult<()> {
        if items.is_empty() {
            return Err(GlueError::EmptyItemSet);
        }
        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            if !seen.insert(*item) {
                return Err(GlueError::DuplicateItem { item: *item });
            }
        }
        Ok(())
    }

    fn units(items: &Vec<ItemId>) -> u128 {
        items.len() as u128
    }

    fn receive(
        host: &mut Host,
        asset: Address,
        from: Address,
        to: Address,
        items: &Vec<ItemId>,
    ) -> GlueResult<u128> {
        let before = host.ledger().balance_of(&asset, &to)?;
        for item in items {
            host.ledger_mut().transfer_item(asset, from, to, *item)?;
        }
        let after = host.ledger().balance_of(&asset, &to)?;

        let delta = safe_sub(after, before).unwrap_or(0);
        if delta == 0 {
            return Err(GlueError::TransferFailed {
                asset,
                from,
                to,
                amount: items.len() as u128,
            });
        }
        Ok(delta)
    }

    fn forward(items: &Vec<ItemId>, _received: u128) -> Vec<ItemId> {
        items.clone()
    }

    fn sink_holdings(host: &Host, record: &VaultRecord) -> GlueResult<u128> {
        host.ledger().balance_of(&record.backed_asset, &DEAD_ADDRESS)
    }

    fn retire(host: &mut Host, vault: Address, items: &Vec<ItemId>, _real: u128) -> GlueResult<()> {
        let asset = host.vault(&vault)?.backed_asset;
        probe::retire_with_fallback(
            host,
            vault,
            |h| {
                for item in items {
                    h.ledger_mut().burn_item(asset, vault, *item)?;
                }
                Ok(())
            },
            |h| {
                for item in items {
                    h.ledger_mut().transfer_item(asset, vault, DEAD_ADDRESS, *item)?;
                }
                Ok(())
            },
        )
    }

    fn notify_after_retire(
        host: &mut Host,
        vault: Address,
        items: &Vec<ItemId>,
        recipient: Address,
    ) -> GlueResult<()> {
        hooks::notify_items(host, vault, items, recipient)
    }

    fn items(items: &Vec<ItemId>) -> Vec<ItemId> {
        items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fungible_validation() {
        assert_eq!(Fungible::validate(&0), Err(GlueError::ZeroAmount));
        assert!(Fungible::validate(&1).is_ok());
        assert_eq!(Fungible::units(&42), 42);
    }

    #[test]
    fn test_item_set_validation() {
        assert_eq!(ItemSet::validate(&vec![]), Err(GlueError::EmptyItemSet));
        assert_eq!(
            ItemSet::validate(&vec![3, 4, 3]),
            Err(GlueError::DuplicateItem { item: 3 })
        );
        assert!(ItemSet::validate(&vec![3, 4]).is_ok());
        assert_eq!(ItemSet::units(&vec![3, 4]), 2);
    }
}
