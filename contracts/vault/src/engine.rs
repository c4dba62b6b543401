//! Redemption Engine
//!
//! Shared by both amount models. One redemption runs as a single call frame
//! under the vault's exclusive-execution lock:
//!
//! 1. take custody of the surrender, measuring what actually arrived
//! 2. run the one-time supply and hook probes
//! 3. let the hook claim part of the surrender (continuous assets)
//! 4. compute the adjusted outstanding supply and the supply delta
//! 5. take the received units out of circulation
//! 6. notify the hook with the surrendered items (item sets)
//! 7. pay every unique collateral through the fee waterfall

use borsh::{BorshDeserialize, BorshSerialize};
use glue_common::{
    addresses::ZERO_ADDRESS, guards, safe_sub, short_address, supply_delta, Address, GlueError,
    GlueEvent, GlueResult, Host,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::AmountModel;
use crate::probe;
use crate::waterfall::{self, Payout, QuotedPayout};

/// Result of a successful redemption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Redemption {
    /// Surrendered share of outstanding supply (PRECISION units)
    pub supply_delta: u128,
    /// Units actually retired after transfer losses, probes and hook claims
    pub real_amount: u128,
    pub supply_before: u128,
    pub supply_after: u128,
    pub recipient: Address,
    pub payouts: Vec<Payout>,
}

/// Projection of a redemption of a given number of units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Quote {
    pub supply_delta: u128,
    pub supply_before: u128,
    pub payouts: Vec<QuotedPayout>,
}

/// Adjusted outstanding supply of the vault's backed asset.
///
/// Total supply minus unreachable sink holdings minus what the vault itself
/// keeps. `pending` received units that are about to be retired still count
/// as outstanding.
pub(crate) fn outstanding_supply<M: AmountModel>(
    host: &Host,
    vault: Address,
    pending: u128,
) -> GlueResult<u128> {
    let record = host.vault(&vault)?;
    let ledger = host.ledger();

    let total = ledger.total_supply(&record.backed_asset)?;
    let sinks = M::sink_holdings(host, record)?;
    let held = ledger
        .balance_of(&record.backed_asset, &vault)?
        .saturating_sub(pending);

    let reachable = safe_sub(total, sinks)?;
    safe_sub(reachable, held)
}

/// Runs one redemption of units held by `caller`, made for `origin`
pub(crate) fn redeem<M: AmountModel>(
    host: &mut Host,
    vault: Address,
    caller: Address,
    origin: Address,
    collaterals: &[Address],
    surrender: &M::Surrender,
    recipient: Option<Address>,
) -> GlueResult<Redemption> {
    host.transact(|h| {
        let mut guard = h.enter(vault, guards::VAULT)?;
        let host: &mut Host = &mut guard;

        let backed_asset = host.vault(&vault)?.backed_asset;
        waterfall::validate_collaterals(collaterals, &backed_asset)?;
        waterfall::check_collateral_kinds(host, collaterals)?;
        M::validate(surrender)?;
        let recipient = match recipient {
            Some(r) if r != ZERO_ADDRESS => r,
            _ => caller,
        };

        let received = M::receive(host, backed_asset, caller, vault, surrender)?;
        let real = M::learn_supply(host, vault, received)?;
        probe::learn_hook(host, vault)?;
        let real = M::claim_before_retire(host, vault, real, recipient)?;

        let supply_before = outstanding_supply::<M>(host, vault, real)?;
        let delta = supply_delta(real, supply_before)?;
        let supply_after = safe_sub(supply_before, real)?;

        M::retire(host, vault, surrender, real)?;
        M::notify_after_retire(host, vault, surrender, recipient)?;

        let payouts = waterfall::distribute(host, vault, collaterals, delta, recipient)?;

        debug!(
            vault = %short_address(&vault),
            caller = %short_address(&caller),
            origin = %short_address(&origin),
            surrendered = M::units(surrender),
            received,
            real,
            supply_before,
            delta,
            paid = payouts.len(),
            "redeemed"
        );
        host.emit(GlueEvent::Redeemed {
            vault,
            caller,
            origin,
            recipient,
            real_amount: real,
            supply_delta: delta,
            supply_before,
            supply_after,
            items: M::items(surrender),
        });

        Ok(Redemption {
            supply_delta: delta,
            real_amount: real,
            supply_before,
            supply_after,
            recipient,
            payouts,
        })
    })
}

/// Projects a redemption of `units` without touching state
pub(crate) fn quote<M: AmountModel>(
    host: &Host,
    vault: Address,
    collaterals: &[Address],
    units: u128,
) -> GlueResult<Quote> {
    let backed_asset = host.vault(&vault)?.backed_asset;
    waterfall::validate_collaterals(collaterals, &backed_asset)?;
    waterfall::check_collateral_kinds(host, collaterals)?;
    if units == 0 {
        return Err(GlueError::ZeroAmount);
    }

    let supply_before = outstanding_supply::<M>(host, vault, 0)?;
    let delta = supply_delta(units, supply_before)?;
    let payouts = waterfall::project(host, vault, collaterals, delta)?;

    Ok(Quote {
        supply_delta: delta,
        supply_before,
        payouts,
    })
}
