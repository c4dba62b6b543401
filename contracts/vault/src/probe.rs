//! Self-Learning Probes
//!
//! A vault learns three things about its backed asset, each exactly once:
//!
//! - whether the asset's total supply still counts zero-address holdings
//!   (continuous assets only; costs one real unit),
//! - which tier of the burn fallback works (burn, dead-address transfer,
//!   keep in the vault),
//! - whether the asset contract exposes a hook.
//!
//! Every probe runs its side effect in its own frame, so a failing probe
//! leaves nothing behind and resolves to the conservative default instead of
//! aborting the redemption. Learned state only moves forward.

use glue_common::{
    addresses::ZERO_ADDRESS, probe::ZERO_ADDRESS_PROBE_UNITS, short_address, Address,
    BurnBehavior, GlueEvent, GlueResult, HookState, Host, VaultRecord, ZeroAddressAccounting,
};
use tracing::{info, warn};

/// Applies `learn` to the vault record and records the change, if any
fn record_learning<F>(host: &mut Host, vault: Address, learn: F) -> GlueResult<()>
where
    F: FnOnce(&mut VaultRecord) -> bool,
{
    let record = host.vault_mut(&vault)?;
    if !learn(record) {
        return Ok(());
    }
    let (flags, hook) = (record.flags, record.hook);
    info!(
        vault = %short_address(&vault),
        burn = ?flags.burn,
        zero_address = ?flags.zero_address,
        hook = ?hook,
        "vault adapted to backed asset"
    );
    host.emit(GlueEvent::AdaptationLearned { vault, flags, hook });
    Ok(())
}

/// Zero-address probe.
///
/// Sends one unit of the freshly received backed asset to the zero address
/// and watches total supply. A refused transfer, or a supply that did not
/// move, means the asset excludes the zero address from its own accounting.
/// Otherwise the included default is kept.
/// Returns how much of `real` is left after the probe.
pub(crate) fn learn_zero_address(host: &mut Host, vault: Address, real: u128) -> GlueResult<u128> {
    let record = host.vault(&vault)?;
    if record.flags.zero_address != ZeroAddressAccounting::Unknown || real == 0 {
        return Ok(real);
    }
    let asset = record.backed_asset;

    let supply_before = host.ledger().total_supply(&asset)?;
    let held_before = host.ledger().balance_of(&asset, &vault)?;
    let outcome = host.transact(|h| {
        h.ledger_mut()
            .transfer(asset, vault, ZERO_ADDRESS, ZERO_ADDRESS_PROBE_UNITS)
    });
    let supply_after = host.ledger().total_supply(&asset)?;
    let held_after = host.ledger().balance_of(&asset, &vault)?;

    let accounting = match outcome {
        Err(err) => {
            warn!(vault = %short_address(&vault), code = err.code(), "zero-address probe refused");
            ZeroAddressAccounting::Excluded
        }
        Ok(()) if supply_after == supply_before => ZeroAddressAccounting::Excluded,
        Ok(()) => ZeroAddressAccounting::Included,
    };
    record_learning(host, vault, |r| r.flags.learn_zero_address(accounting))?;

    let consumed = held_before.saturating_sub(held_after);
    Ok(real.saturating_sub(consumed))
}

/// Hook-presence probe; later calls read the cache only
pub(crate) fn learn_hook(host: &mut Host, vault: Address) -> GlueResult<HookState> {
    let record = host.vault(&vault)?;
    if record.hook != HookState::Unknown {
        return Ok(record.hook);
    }

    let state = match host.hook_of(&record.backed_asset) {
        None => HookState::Absent,
        Some(hook) => match hook.has_hook(host) {
            Ok(true) => HookState::Present,
            Ok(false) => HookState::Absent,
            Err(err) => {
                warn!(
                    vault = %short_address(&vault),
                    code = err.code(),
                    "hook capability query failed"
                );
                HookState::Absent
            }
        },
    };
    record_learning(host, vault, |r| {
        r.hook = state;
        true
    })?;
    Ok(state)
}

/// Three-tier removal from circulation.
///
/// Tries `burn`; if it fails the vault is marked non-burnable and `sink`
/// (transfer to the dead address) is tried; if that fails too the units stay
/// in the vault for good. A tier that failed once is never tried again.
pub(crate) fn retire_with_fallback<B, S>(
    host: &mut Host,
    vault: Address,
    burn: B,
    sink: S,
) -> GlueResult<()>
where
    B: FnOnce(&mut Host) -> GlueResult<()>,
    S: FnOnce(&mut Host) -> GlueResult<()>,
{
    let flags = host.vault(&vault)?.flags;
    if flags.supply_permanently_held() {
        return Ok(());
    }

    if !flags.non_burnable() {
        match host.transact(burn) {
            Ok(()) => {
                return record_learning(host, vault, |r| {
                    r.flags.advance_burn(BurnBehavior::Standard)
                })
            }
            Err(err) => {
                warn!(
                    vault = %short_address(&vault),
                    code = err.code(),
                    "burn refused, falling back to dead address"
                );
                record_learning(host, vault, |r| r.flags.advance_burn(BurnBehavior::NonBurnable))?;
            }
        }
    }

    match host.transact(sink) {
        Ok(()) => Ok(()),
        Err(err) => {
            warn!(
                vault = %short_address(&vault),
                code = err.code(),
                "dead-address transfer refused, holding units"
            );
            record_learning(host, vault, |r| r.flags.advance_burn(BurnBehavior::PermanentlyHeld))
        }
    }
}
