//! Collaborator Interfaces
//!
//! Contracts the redemption core talks to but does not own: the backed
//! asset's optional hook, the borrower receiving a glued loan, and the
//! governance settings that route the protocol fee.

use serde::{Deserialize, Serialize};

use crate::constants::{addresses::ZERO_ADDRESS, fees::MAX_OPERATOR_SHARE};
use crate::errors::{GlueError, GlueResult};
use crate::host::Host;
use crate::types::{Address, ItemId};

// ============ Hook ============

/// Context handed to [`GlueHook::execute_hook`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookContext {
    /// Vault running the redemption
    pub vault: Address,
    /// Final recipient of the redemption
    pub recipient: Address,
    /// Surrendered item identifiers (item-set notifications only)
    pub items: Vec<ItemId>,
}

/// Optional extension exposed by a backed asset's own contract.
///
/// Every call may fail; the vault maps failures to "no hook" or "no claim".
pub trait GlueHook {
    /// Whether the asset wants to be called during redemptions
    fn has_hook(&self, host: &Host) -> GlueResult<bool>;

    /// Fraction (in PRECISION units) of `amount` of `asset` the hook claims
    fn hook_size(&self, host: &Host, asset: Address, amount: u128) -> GlueResult<u128>;

    /// Notification after `amount` of `asset` reached the asset contract.
    ///
    /// Runs as the asset contract: it can spend what it holds, not what the
    /// vault holds.
    fn execute_hook(
        &self,
        host: &mut Host,
        asset: Address,
        amount: u128,
        context: &HookContext,
    ) -> GlueResult<()>;
}

// ============ Loan Receiver ============

/// Borrower side of a glued loan
pub trait LoanReceiver {
    /// Called after every planned vault disbursed to `borrower`.
    ///
    /// `expected_repay[i]` is what `vaults[i]` must get back. Returns the
    /// success flag; `Ok(false)` fails the loan like an error does. Runs as
    /// `borrower`, so vault balances are out of its reach.
    fn on_glued_loan(
        &self,
        host: &mut Host,
        borrower: Address,
        vaults: &[Address],
        asset: Address,
        expected_repay: &[u128],
        data: &[u8],
    ) -> GlueResult<bool>;
}

// ============ Settings ============

/// Protocol fee routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolFeeInfo {
    /// Share of the protocol fee sent to the vault operator (PRECISION units)
    pub operator_share: u128,
    /// Vault operator receiving its share; zero disables the cut
    pub operator: Address,
    /// Receiver of the rest of the protocol fee
    pub remainder: Address,
}

/// Governance component holding the fee routing
pub trait SettingsProvider {
    fn protocol_fee_info(&self) -> ProtocolFeeInfo;
}

/// Fee routing as loaded from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSettings {
    pub operator_share: u128,
    pub operator: Address,
    pub remainder: Address,
}

/// Settings provider with fixed, validated values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticSettings {
    info: ProtocolFeeInfo,
}

impl StaticSettings {
    /// Validates bounds before accepting the settings.
    ///
    /// # Errors
    /// `InvalidSettings` if the operator share exceeds 100% or the remainder
    /// address is zero.
    pub fn new(settings: FeeSettings) -> GlueResult<Self> {
        if settings.operator_share > MAX_OPERATOR_SHARE {
            return Err(GlueError::InvalidSettings {
                reason: "operator share above 100%",
            });
        }
        if settings.remainder == ZERO_ADDRESS {
            return Err(GlueError::InvalidSettings {
                reason: "remainder address cannot be zero",
            });
        }
        Ok(Self {
            info: ProtocolFeeInfo {
                operator_share: settings.operator_share,
                operator: settings.operator,
                remainder: settings.remainder,
            },
        })
    }
}

impl SettingsProvider for StaticSettings {
    fn protocol_fee_info(&self) -> ProtocolFeeInfo {
        self.info
    }
}
