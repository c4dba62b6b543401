//! Glued Loan Coordinator
//!
//! Draws one asset from several vaults of the same factory in a single
//! atomic call:
//!
//! 1. **Plan**: walk the vaults in caller order and take what each can give
//!    until the requested total is met. Pure; nothing moves if liquidity is
//!    short.
//! 2. **Disburse**: every planned vault transfers its allocation to the
//!    borrower.
//! 3. **Settle**: the borrower's callback runs, then every participating
//!    vault must hold at least its pre-loan balance plus its fee.
//!
//! Any failure rolls the whole call back. The run holds the coordinating
//! factory's lock, so the borrower cannot re-enter that factory.

use std::collections::HashSet;

use borsh::{BorshDeserialize, BorshSerialize};
use glue_common::{
    addresses::ZERO_ADDRESS, guards, safe_add, safe_sub, short_address, Address, GlueError,
    GlueEvent, GlueResult, Host,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::loan;

/// One vault's part of a loan
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
pub struct LoanAllocation {
    pub vault: Address,
    /// Amount lent by this vault
    pub amount: u128,
    pub fee: u128,
    /// amount + fee
    pub expected_repay: u128,
    /// Vault balance when planned
    pub pre_balance: u128,
    /// Minimum balance after settlement: pre_balance + fee
    pub expected_post_balance: u128,
}

/// Per-call loan plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LoanPlan {
    pub asset: Address,
    pub total_amount: u128,
    /// Vaults that lend something, in caller order
    pub allocations: Vec<LoanAllocation>,
}

impl LoanPlan {
    pub fn vaults(&self) -> Vec<Address> {
        self.allocations.iter().map(|a| a.vault).collect()
    }

    pub fn expected_repay(&self) -> Vec<u128> {
        self.allocations.iter().map(|a| a.expected_repay).collect()
    }

    pub fn total_fee(&self) -> GlueResult<u128> {
        self.allocations
            .iter()
            .try_fold(0u128, |acc, a| safe_add(acc, a.fee))
    }
}

/// Settled loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LoanReceipt {
    pub plan: LoanPlan,
    pub total_fee: u128,
}

/// Plans a loan of `total_amount` of `asset` across `vaults`.
///
/// A vault listed twice is considered once. Vaults backing `asset` itself
/// never lend it.
///
/// # Errors
/// - `Unauthorized` if a considered vault belongs to another factory
/// - `InsufficientLiquidity` if the vaults cannot cover the total
pub fn plan_loan(
    host: &Host,
    coordinator: Address,
    vaults: &[Address],
    asset: Address,
    total_amount: u128,
) -> GlueResult<LoanPlan> {
    if vaults.is_empty() {
        return Err(GlueError::EmptyVaultList);
    }
    if total_amount == 0 {
        return Err(GlueError::ZeroAmount);
    }
    if asset == ZERO_ADDRESS {
        return Err(GlueError::InvalidAddress {
            reason: "loan asset cannot be zero address",
        });
    }

    let mut seen = HashSet::with_capacity(vaults.len());
    let mut allocations = Vec::new();
    let mut remaining = total_amount;

    for vault in vaults {
        if remaining == 0 {
            break;
        }
        if !seen.insert(*vault) {
            continue;
        }

        let record = host.vault(vault)?;
        if record.factory != coordinator {
            return Err(GlueError::Unauthorized {
                expected: coordinator,
                actual: record.factory,
            });
        }
        if record.backed_asset == asset {
            continue;
        }

        let available = host.ledger().balance_of(&asset, vault)?;
        let amount = remaining.min(available);
        if amount == 0 {
            continue;
        }

        let fee = loan::fee_quote(amount)?;
        allocations.push(LoanAllocation {
            vault: *vault,
            amount,
            fee,
            expected_repay: safe_add(amount, fee)?,
            pre_balance: available,
            expected_post_balance: safe_add(available, fee)?,
        });
        remaining -= amount;
    }

    if remaining > 0 {
        return Err(GlueError::InsufficientLiquidity {
            asset,
            available: total_amount - remaining,
            requested: total_amount,
        });
    }

    Ok(LoanPlan {
        asset,
        total_amount,
        allocations,
    })
}

/// Plans, disburses and settles a glued loan for `borrower`.
///
/// `borrower` must have a [`LoanReceiver`](glue_common::LoanReceiver)
/// deployed; `data` is passed through to its callback untouched.
pub fn execute_loan(
    host: &mut Host,
    coordinator: Address,
    vaults: &[Address],
    asset: Address,
    total_amount: u128,
    borrower: Address,
    data: &[u8],
) -> GlueResult<LoanReceipt> {
    host.transact(|h| {
        let mut guard = h.enter(coordinator, guards::FACTORY)?;
        let host: &mut Host = &mut guard;

        if borrower == ZERO_ADDRESS {
            return Err(GlueError::InvalidAddress {
                reason: "borrower cannot be zero address",
            });
        }
        let receiver = host.receiver(&borrower)?;
        let plan = plan_loan(host, coordinator, vaults, asset, total_amount)?;

        for allocation in &plan.allocations {
            loan::disburse(
                host,
                allocation.vault,
                coordinator,
                asset,
                allocation.amount,
                borrower,
            )?;
        }

        let participants = plan.vaults();
        let expected_repay = plan.expected_repay();
        let callback = host.invoke(borrower, |h| {
            receiver.on_glued_loan(h, borrower, &participants, asset, &expected_repay, data)
        });
        match callback {
            Ok(true) => {}
            Ok(false) => {
                warn!(borrower = %short_address(&borrower), "loan callback returned false");
                return Err(GlueError::LoanCallbackFailed);
            }
            Err(err) => {
                warn!(
                    borrower = %short_address(&borrower),
                    code = err.code(),
                    "loan callback failed"
                );
                return Err(GlueError::LoanCallbackFailed);
            }
        }

        for allocation in &plan.allocations {
            let actual = host.ledger().balance_of(&asset, &allocation.vault)?;
            if actual < allocation.expected_post_balance {
                warn!(
                    vault = %short_address(&allocation.vault),
                    shortfall = safe_sub(allocation.expected_post_balance, actual)?,
                    "loan not repaid"
                );
                return Err(GlueError::LoanNotRepaid {
                    vault: allocation.vault,
                    expected: allocation.expected_post_balance,
                    actual,
                });
            }
        }

        let total_fee = plan.total_fee()?;
        info!(
            coordinator = %short_address(&coordinator),
            asset = %short_address(&asset),
            total_amount,
            total_fee,
            vaults = participants.len(),
            "glued loan settled"
        );
        host.emit(GlueEvent::LoanSettled {
            coordinator,
            asset,
            borrower,
            total_amount,
            total_fee,
            vaults: participants,
        });

        Ok(LoanReceipt { plan, total_fee })
    })
}
