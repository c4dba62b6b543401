//! Error Types for the Glue Protocol
//!
//! Errors are grouped by the failure taxonomy of the redemption core:
//! validation, asset interaction, liquidity, settlement and extension.
//! Only extension errors are ever recovered locally; everything else
//! aborts the call and the host rolls the frame back.

use thiserror::Error;

use crate::types::{short_address, Address, AssetKind, ItemId};

/// Result type alias for Glue operations
pub type GlueResult<T> = Result<T, GlueError>;

/// Main error enum for all Glue protocol errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlueError {
    // ============ Input Validation Errors ============
    /// Redemption called without any collateral to pay out
    #[error("collateral list is empty")]
    EmptyCollateralList,

    /// Zero amount not allowed
    #[error("amount must be non-zero")]
    ZeroAmount,

    /// Item-set redemption without any item
    #[error("item set is empty")]
    EmptyItemSet,

    /// The same item identifier was surrendered twice
    #[error("item {item} listed more than once")]
    DuplicateItem { item: ItemId },

    /// Invalid address (e.g., zero address)
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },

    /// A vault cannot pay out its own backed asset
    #[error("collateral {} is the backed asset", short_address(.asset))]
    CollateralIsBackedAsset { asset: Address },

    /// Loan requested over an empty vault list
    #[error("vault list is empty")]
    EmptyVaultList,

    /// Invalid input parameter
    #[error("invalid {param}: {reason}")]
    InvalidInput {
        param: &'static str,
        reason: &'static str,
    },

    /// Settings provider configuration out of bounds
    #[error("invalid fee settings: {reason}")]
    InvalidSettings { reason: &'static str },

    /// Asset exists but is not of the kind this contract handles
    #[error("asset {} is not a {expected:?}", short_address(.asset))]
    WrongAssetKind { asset: Address, expected: AssetKind },

    /// A vault is already bound to this asset
    #[error("asset {} already bound to vault {}", short_address(.asset), short_address(.vault))]
    VaultAlreadyExists { asset: Address, vault: Address },

    /// No vault at the given address
    #[error("vault {} not found", short_address(.vault))]
    VaultNotFound { vault: Address },

    /// No vault is bound to the given asset
    #[error("asset {} has no vault", short_address(.asset))]
    AssetNotBacked { asset: Address },

    /// Enumeration index past the end
    #[error("index {index} out of bounds ({len} entries)")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Caller is not authorized for this operation
    #[error("caller {} is not {}", short_address(.actual), short_address(.expected))]
    Unauthorized { expected: Address, actual: Address },

    // ============ Asset Interaction Errors ============
    /// Asset is not registered in the ledger
    #[error("unknown asset {}", short_address(.asset))]
    UnknownAsset { asset: Address },

    /// Transfer produced an unexpected outcome (including a zero net delta)
    #[error("transfer of {amount} {} failed", short_address(.asset))]
    TransferFailed {
        asset: Address,
        from: Address,
        to: Address,
        amount: u128,
    },

    /// The asset's own logic refused the transfer
    #[error("asset {} rejected transfer: {reason}", short_address(.asset))]
    TransferRejected {
        asset: Address,
        reason: &'static str,
    },

    /// Holder balance too small
    #[error("insufficient balance of {}: {available} < {requested}", short_address(.asset))]
    InsufficientBalance {
        asset: Address,
        available: u128,
        requested: u128,
    },

    /// The asset does not support burning
    #[error("asset {} cannot be burned", short_address(.asset))]
    BurnRejected { asset: Address },

    /// Item is not held by the expected owner
    #[error("item {item} of {} not owned by {}", short_address(.asset), short_address(.holder))]
    ItemNotOwned {
        asset: Address,
        item: ItemId,
        holder: Address,
    },

    /// Item identifier already minted
    #[error("item {item} of {} already exists", short_address(.asset))]
    ItemExists { asset: Address, item: ItemId },

    /// Surrendered units exceed the adjusted outstanding supply
    #[error("amount {amount} exceeds outstanding supply {supply}")]
    ExceedsSupply { amount: u128, supply: u128 },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow occurred
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    // ============ Liquidity Errors ============
    /// Aggregate vault balances cannot cover the requested loan
    #[error("insufficient liquidity of {}: {available} < {requested}", short_address(.asset))]
    InsufficientLiquidity {
        asset: Address,
        available: u128,
        requested: u128,
    },

    // ============ Settlement Errors ============
    /// A participating vault did not get its loan plus fee back
    #[error("vault {} not repaid: expected {expected}, found {actual}", short_address(.vault))]
    LoanNotRepaid {
        vault: Address,
        expected: u128,
        actual: u128,
    },

    /// Borrower callback failed or returned false
    #[error("loan callback failed")]
    LoanCallbackFailed,

    // ============ Extension Errors ============
    /// Hook query or execution failed
    #[error("hook failed: {reason}")]
    HookFailed { reason: &'static str },

    // ============ Host Errors ============
    /// Nested entry into a lock-guarded entry point
    #[error("reentrant call into {} ({guard})", short_address(.contract))]
    Reentrancy {
        contract: Address,
        guard: &'static str,
    },

    /// No collaborator code deployed at the address
    #[error("no contract deployed at {}", short_address(.address))]
    ContractNotDeployed { address: Address },
}

/// Failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad caller input, rejected before any state change
    Validation,
    /// Unexpected outcome of an asset interaction
    AssetInteraction,
    /// Not enough aggregate balance for a loan
    Liquidity,
    /// Loan not repaid after the borrower callback
    Settlement,
    /// Hook failures; always recovered to the conservative default
    Extension,
    /// Execution host invariants (locks, missing code)
    Host,
}

impl GlueError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyCollateralList => "E001_EMPTY_COLLATERALS",
            Self::ZeroAmount => "E002_ZERO_AMOUNT",
            Self::EmptyItemSet => "E003_EMPTY_ITEMS",
            Self::DuplicateItem { .. } => "E004_DUPLICATE_ITEM",
            Self::InvalidAddress { .. } => "E005_INVALID_ADDRESS",
            Self::CollateralIsBackedAsset { .. } => "E006_COLLATERAL_IS_BACKED",
            Self::EmptyVaultList => "E007_EMPTY_VAULTS",
            Self::InvalidInput { .. } => "E008_INVALID_INPUT",
            Self::InvalidSettings { .. } => "E009_INVALID_SETTINGS",
            Self::WrongAssetKind { .. } => "E010_WRONG_KIND",
            Self::VaultAlreadyExists { .. } => "E011_VAULT_EXISTS",
            Self::VaultNotFound { .. } => "E012_VAULT_NOT_FOUND",
            Self::AssetNotBacked { .. } => "E013_NOT_BACKED",
            Self::IndexOutOfBounds { .. } => "E014_INDEX_OOB",
            Self::Unauthorized { .. } => "E015_UNAUTHORIZED",
            Self::UnknownAsset { .. } => "E020_UNKNOWN_ASSET",
            Self::TransferFailed { .. } => "E021_TRANSFER_FAILED",
            Self::TransferRejected { .. } => "E022_TRANSFER_REJECTED",
            Self::InsufficientBalance { .. } => "E023_INSUFFICIENT_BALANCE",
            Self::BurnRejected { .. } => "E024_BURN_REJECTED",
            Self::ItemNotOwned { .. } => "E025_ITEM_NOT_OWNED",
            Self::ItemExists { .. } => "E026_ITEM_EXISTS",
            Self::ExceedsSupply { .. } => "E027_EXCEEDS_SUPPLY",
            Self::Overflow => "E030_OVERFLOW",
            Self::Underflow => "E031_UNDERFLOW",
            Self::DivisionByZero => "E032_DIV_ZERO",
            Self::InsufficientLiquidity { .. } => "E040_INSUFFICIENT_LIQUIDITY",
            Self::LoanNotRepaid { .. } => "E050_LOAN_NOT_REPAID",
            Self::LoanCallbackFailed => "E051_LOAN_CALLBACK_FAIL",
            Self::HookFailed { .. } => "E060_HOOK_FAILED",
            Self::Reentrancy { .. } => "E070_REENTRANCY",
            Self::ContractNotDeployed { .. } => "E071_NO_CONTRACT",
        }
    }

    /// Where this error sits in the failure taxonomy
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyCollateralList
            | Self::ZeroAmount
            | Self::EmptyItemSet
            | Self::DuplicateItem { .. }
            | Self::InvalidAddress { .. }
            | Self::CollateralIsBackedAsset { .. }
            | Self::EmptyVaultList
            | Self::InvalidInput { .. }
            | Self::InvalidSettings { .. }
            | Self::WrongAssetKind { .. }
            | Self::VaultAlreadyExists { .. }
            | Self::VaultNotFound { .. }
            | Self::AssetNotBacked { .. }
            | Self::IndexOutOfBounds { .. }
            | Self::Unauthorized { .. } => ErrorCategory::Validation,
            Self::UnknownAsset { .. }
            | Self::TransferFailed { .. }
            | Self::TransferRejected { .. }
            | Self::InsufficientBalance { .. }
            | Self::BurnRejected { .. }
            | Self::ItemNotOwned { .. }
            | Self::ItemExists { .. }
            | Self::ExceedsSupply { .. }
            | Self::Overflow
            | Self::Underflow
            | Self::DivisionByZero => ErrorCategory::AssetInteraction,
            Self::InsufficientLiquidity { .. } => ErrorCategory::Liquidity,
            Self::LoanNotRepaid { .. } | Self::LoanCallbackFailed => ErrorCategory::Settlement,
            Self::HookFailed { .. } => ErrorCategory::Extension,
            Self::Reentrancy { .. } | Self::ContractNotDeployed { .. } => ErrorCategory::Host,
        }
    }

    /// Returns true if the caller can fix this by changing the request
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Validation | ErrorCategory::Liquidity
        )
    }
}
