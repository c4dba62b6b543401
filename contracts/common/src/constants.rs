//! Protocol Constants
//!
//! All fixed numbers of the Glue protocol. Fee rates are not governable:
//! only the routing of the protocol fee comes from the settings provider.

/// Fixed-point precision (18 fractional digits)
pub mod precision {
    /// 1.0 in fixed-point units
    pub const PRECISION: u128 = 1_000_000_000_000_000_000; // 1e18
}

/// Fee rates, expressed in [`precision::PRECISION`] units
pub mod fees {
    use super::precision::PRECISION;

    /// Protocol fee taken from every collateral payout (0.1%)
    pub const PROTOCOL_FEE: u128 = PRECISION / 1_000;

    /// Fee charged on every flash/glued loan allocation (0.01%)
    pub const FLASH_LOAN_FEE: u128 = PRECISION / 10_000;

    /// Upper bound for the operator share of the protocol fee (100%)
    pub const MAX_OPERATOR_SHARE: u128 = PRECISION;
}

/// Well-known addresses
pub mod addresses {
    use crate::types::Address;

    /// The zero address. Never a valid asset, vault, or recipient.
    pub const ZERO_ADDRESS: Address = [0u8; 32];

    /// Conventional unreachable sink (`...dEaD`)
    pub const DEAD_ADDRESS: Address = {
        let mut a = [0u8; 32];
        a[30] = 0xde;
        a[31] = 0xad;
        a
    };

    /// Sentinel asset id standing in for the native currency
    pub const NATIVE_ASSET: Address = [0xee; 32];
}

/// Self-learning probe configuration
pub mod probe {
    /// Units of the backed asset spent on the zero-address probe
    pub const ZERO_ADDRESS_PROBE_UNITS: u128 = 1;
}

/// Names of the exclusive-execution locks
pub mod guards {
    /// Held by every state-mutating vault entry point
    pub const VAULT: &str = "vault";

    /// Held by every state-mutating factory entry point, including a whole
    /// plan/disburse/settle loan run
    pub const FACTORY: &str = "factory";
}

/// Basis points denominator used by ledger transfer taxes
pub const BPS_DENOMINATOR: u128 = 10_000;
