//! Vault side of glued loans

use glue_common::{
    addresses::ZERO_ADDRESS, flash_loan_fee, guards, short_address, Address, GlueError, GlueEvent,
    GlueResult, Host,
};
use tracing::debug;

/// Fee owed on a loan of `amount`, rounded up
pub(crate) fn fee_quote(amount: u128) -> GlueResult<u128> {
    flash_loan_fee(amount)
}

/// Hands `amount` of `asset` to `borrower`.
///
/// Only the factory that created the vault may call this; it coordinates
/// repayment.
pub(crate) fn disburse(
    host: &mut Host,
    vault: Address,
    caller: Address,
    asset: Address,
    amount: u128,
    borrower: Address,
) -> GlueResult<()> {
    host.transact(|h| {
        let mut guard = h.enter(vault, guards::VAULT)?;
        let host: &mut Host = &mut guard;

        let record = host.vault(&vault)?;
        if caller != record.factory {
            return Err(GlueError::Unauthorized {
                expected: record.factory,
                actual: caller,
            });
        }
        if asset == record.backed_asset {
            return Err(GlueError::CollateralIsBackedAsset { asset });
        }
        if amount == 0 {
            return Err(GlueError::ZeroAmount);
        }
        if borrower == ZERO_ADDRESS {
            return Err(GlueError::InvalidAddress {
                reason: "borrower cannot be zero address",
            });
        }

        host.ledger_mut().transfer(asset, vault, borrower, amount)?;

        debug!(
            vault = %short_address(&vault),
            asset = %short_address(&asset),
            amount,
            "loan disbursed"
        );
        host.emit(GlueEvent::LoanDisbursed {
            vault,
            asset,
            amount,
            borrower,
        });
        Ok(())
    })
}
