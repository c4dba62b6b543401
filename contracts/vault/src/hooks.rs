//! Hook Dispatcher
//!
//! Lets the backed asset's own contract take a bounded slice of value on its
//! way out of the vault. The slice is moved to the asset contract first and
//! what actually arrived (not what the hook asked for) is reported to the
//! execution callback. Queries that fail count as a zero claim; a failing
//! callback is rolled back on its own and ignored, the value already moved
//! stays moved.

use glue_common::{
    hook_share, precision::PRECISION, safe_sub, short_address, Address, GlueEvent, GlueResult,
    HookContext, HookState, Host, ItemId,
};
use tracing::{debug, warn};

/// Outcome of one claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HookClaim {
    /// Amount left for the normal payout
    pub residual: u128,
    /// Amount that left the vault toward the asset contract
    pub sent: u128,
}

/// Offers `amount` of `asset` to the backed asset's hook.
///
/// # Errors
/// Only the vault-side transfer of the claimed slice can fail the call;
/// every hook failure degrades to a zero claim.
pub(crate) fn claim(
    host: &mut Host,
    vault: Address,
    asset: Address,
    amount: u128,
    recipient: Address,
) -> GlueResult<HookClaim> {
    let unclaimed = HookClaim {
        residual: amount,
        ..HookClaim::default()
    };

    let record = host.vault(&vault)?;
    if amount == 0 || record.hook != HookState::Present {
        return Ok(unclaimed);
    }
    let target = record.backed_asset;
    let Some(hook) = host.hook_of(&target) else {
        return Ok(unclaimed);
    };

    let fraction = match hook.hook_size(host, asset, amount) {
        Ok(fraction) => fraction.min(PRECISION),
        Err(err) => {
            warn!(vault = %short_address(&vault), code = err.code(), "hook size query failed");
            0
        }
    };
    let sent = hook_share(amount, fraction)?;
    if sent == 0 {
        return Ok(unclaimed);
    }

    let before = host.ledger().balance_of(&asset, &target)?;
    host.ledger_mut().transfer(asset, vault, target, sent)?;
    let delivered = host.ledger().balance_of(&asset, &target)?.saturating_sub(before);

    let context = HookContext {
        vault,
        recipient,
        items: Vec::new(),
    };
    let outcome = host.transact(|h| {
        h.invoke(target, |h| hook.execute_hook(h, asset, delivered, &context))
    });
    if let Err(err) = &outcome {
        warn!(vault = %short_address(&vault), code = err.code(), "hook execution failed, ignored");
    }
    debug!(
        vault = %short_address(&vault),
        asset = %short_address(&asset),
        sent,
        delivered,
        "hook claimed"
    );
    host.emit(GlueEvent::HookExecuted {
        vault,
        asset,
        amount: delivered,
        succeeded: outcome.is_ok(),
    });

    Ok(HookClaim {
        residual: safe_sub(amount, sent)?,
        sent,
    })
}

/// Zero-value notification carrying the surrendered item identifiers
pub(crate) fn notify_items(
    host: &mut Host,
    vault: Address,
    items: &[ItemId],
    recipient: Address,
) -> GlueResult<()> {
    let record = host.vault(&vault)?;
    if record.hook != HookState::Present {
        return Ok(());
    }
    let target = record.backed_asset;
    let Some(hook) = host.hook_of(&target) else {
        return Ok(());
    };

    let context = HookContext {
        vault,
        recipient,
        items: items.to_vec(),
    };
    let outcome = host.transact(|h| {
        h.invoke(target, |h| hook.execute_hook(h, target, 0, &context))
    });
    if let Err(err) = &outcome {
        warn!(
            vault = %short_address(&vault),
            code = err.code(),
            "item notification failed, ignored"
        );
    }
    host.emit(GlueEvent::HookExecuted {
        vault,
        asset: target,
        amount: 0,
        succeeded: outcome.is_ok(),
    });
    Ok(())
}
