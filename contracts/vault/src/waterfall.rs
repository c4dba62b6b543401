//! Fee Waterfall
//!
//! Splits each collateral's share of a redemption into the recipient's
//! payout and the protocol fee, then splits the protocol fee between the
//! vault operator and the remainder address.
//!
//! ```text
//! availability = floor(balance * supply_delta / PRECISION)
//! protocol_fee = ceil(availability * PROTOCOL_FEE / PRECISION)
//! recipient    = availability - protocol_fee - hook claim
//! operator     = min(floor(protocol_fee * share / PRECISION), protocol_fee)
//! remainder    = protocol_fee - operator
//! ```
//!
//! A collateral listed more than once is paid once.

use std::collections::HashSet;

use borsh::{BorshDeserialize, BorshSerialize};
use glue_common::{
    addresses::ZERO_ADDRESS, collateral_share, operator_cut, protocol_fee, safe_sub,
    short_address, Address, AssetKind, GlueError, GlueEvent, GlueResult, Host,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hooks;

/// One collateral paid by a redemption
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Payout {
    pub collateral: Address,
    /// Vault balance share before fees
    pub availability: u128,
    pub protocol_fee: u128,
    pub operator_fee: u128,
    pub remainder_fee: u128,
    /// Taken by the backed asset's hook out of the recipient amount
    pub hook_amount: u128,
    /// Sent to the recipient
    pub recipient_amount: u128,
}

/// One collateral of a quote
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct QuotedPayout {
    pub collateral: Address,
    pub availability: u128,
    pub protocol_fee: u128,
    pub recipient_amount: u128,
}

/// Rejects collateral lists the engine must never act on
pub(crate) fn validate_collaterals(
    collaterals: &[Address],
    backed_asset: &Address,
) -> GlueResult<()> {
    if collaterals.is_empty() {
        return Err(GlueError::EmptyCollateralList);
    }
    for collateral in collaterals {
        if *collateral == ZERO_ADDRESS {
            return Err(GlueError::InvalidAddress {
                reason: "collateral cannot be zero address",
            });
        }
        if collateral == backed_asset {
            return Err(GlueError::CollateralIsBackedAsset { asset: *collateral });
        }
    }
    Ok(())
}

/// Collateral must be a continuous asset known to the ledger
pub(crate) fn check_collateral_kinds(host: &Host, collaterals: &[Address]) -> GlueResult<()> {
    for collateral in collaterals {
        match host.ledger().kind_of(collateral) {
            Some(AssetKind::Fungible) | Some(AssetKind::Native) => {}
            Some(AssetKind::ItemSet) => {
                return Err(GlueError::WrongAssetKind {
                    asset: *collateral,
                    expected: AssetKind::Fungible,
                })
            }
            None => return Err(GlueError::UnknownAsset { asset: *collateral }),
        }
    }
    Ok(())
}

/// Availability and fee for one collateral; `None` when nothing is payable
fn split(balance: u128, supply_delta: u128) -> GlueResult<Option<(u128, u128, u128)>> {
    let availability = collateral_share(balance, supply_delta)?;
    if availability == 0 {
        return Ok(None);
    }
    let fee = protocol_fee(availability)?;
    let recipient_amount = availability.saturating_sub(fee);
    if recipient_amount == 0 {
        return Ok(None);
    }
    Ok(Some((availability, fee, recipient_amount)))
}

/// Pure projection of what [`distribute`] would pay, ignoring hooks
pub(crate) fn project(
    host: &Host,
    vault: Address,
    collaterals: &[Address],
    supply_delta: u128,
) -> GlueResult<Vec<QuotedPayout>> {
    let mut seen = HashSet::with_capacity(collaterals.len());
    let mut quoted = Vec::new();

    for collateral in collaterals {
        if !seen.insert(*collateral) {
            continue;
        }
        let balance = host.ledger().balance_of(collateral, &vault)?;
        if let Some((availability, fee, recipient_amount)) = split(balance, supply_delta)? {
            quoted.push(QuotedPayout {
                collateral: *collateral,
                availability,
                protocol_fee: fee,
                recipient_amount,
            });
        }
    }
    Ok(quoted)
}

/// Pays every unique collateral its share of `supply_delta`
pub(crate) fn distribute(
    host: &mut Host,
    vault: Address,
    collaterals: &[Address],
    supply_delta: u128,
    recipient: Address,
) -> GlueResult<Vec<Payout>> {
    let settings = host.vault(&vault)?.settings;
    let fee_info = host.settings(&settings)?.protocol_fee_info();

    // call-scoped duplicate-collateral marker
    let mut paid = HashSet::with_capacity(collaterals.len());
    let mut payouts = Vec::new();

    for collateral in collaterals {
        if !paid.insert(*collateral) {
            debug!(collateral = %short_address(collateral), "duplicate collateral skipped");
            continue;
        }

        let balance = host.ledger().balance_of(collateral, &vault)?;
        let Some((availability, fee, recipient_amount)) = split(balance, supply_delta)? else {
            continue;
        };

        let claim = hooks::claim(host, vault, *collateral, recipient_amount, recipient)?;

        let operator_fee = if fee_info.operator == ZERO_ADDRESS {
            0
        } else {
            operator_cut(fee, fee_info.operator_share)?
        };
        let remainder_fee = safe_sub(fee, operator_fee)?;

        let mut ledger = host.ledger_mut();
        if operator_fee > 0 {
            ledger.transfer(*collateral, vault, fee_info.operator, operator_fee)?;
        }
        if remainder_fee > 0 {
            ledger.transfer(*collateral, vault, fee_info.remainder, remainder_fee)?;
        }
        if claim.residual > 0 {
            ledger.transfer(*collateral, vault, recipient, claim.residual)?;
        }

        host.emit(GlueEvent::CollateralPaid {
            vault,
            collateral: *collateral,
            recipient,
            amount: claim.residual,
            protocol_fee: fee,
            hook_amount: claim.sent,
        });
        payouts.push(Payout {
            collateral: *collateral,
            availability,
            protocol_fee: fee,
            operator_fee,
            remainder_fee,
            hook_amount: claim.sent,
            recipient_amount: claim.residual,
        });
    }
    Ok(payouts)
}
