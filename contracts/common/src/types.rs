//! Core Types for the Glue Protocol
//!
//! Persistent records held by the execution host: the vault binding with its
//! adaptation state, and the factory registry.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Type alias for addresses (32-byte account or contract id)
pub type Address = [u8; 32];

/// Identifier of one item inside an item collection
pub type ItemId = u64;

/// Short hex rendering of an address for logs and error messages
pub fn short_address(address: &Address) -> String {
    address[..4].iter().map(|b| format!("{b:02x}")).collect()
}

// ============ Asset Kinds ============

/// Kind of asset, as seen by the ledger
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
pub enum AssetKind {
    /// Fungible token with a continuous amount
    Fungible,
    /// Collection of discrete, individually owned items
    ItemSet,
    /// Native currency (sentinel asset id)
    Native,
}

// ============ Adaptation State ============

/// How received units of the backed asset leave circulation.
///
/// Ordered: a vault only ever moves to a later variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub enum BurnBehavior {
    /// No redemption has needed to burn yet
    #[default]
    Unknown,
    /// Conventional burn works
    Standard,
    /// Burn failed; units are sent to the dead address instead
    NonBurnable,
    /// Burn and dead-address transfer both failed; the vault keeps the units
    PermanentlyHeld,
}

/// Whether the asset's own accounting includes zero-address holdings
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub enum ZeroAddressAccounting {
    /// Not probed yet; treated as included
    #[default]
    Unknown,
    /// Zero-address balance is part of total supply and is subtracted from
    /// outstanding supply
    Included,
    /// Zero-address transfers are rejected or leave supply unchanged;
    /// nothing is subtracted
    Excluded,
}

/// Cached result of the hook capability query
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub enum HookState {
    #[default]
    Unknown,
    Present,
    Absent,
}

/// Self-learned behavior of a vault's backed asset
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct AdaptationFlags {
    pub burn: BurnBehavior,
    pub zero_address: ZeroAddressAccounting,
}

impl AdaptationFlags {
    /// Burn tier fell through at least once
    pub fn non_burnable(&self) -> bool {
        self.burn >= BurnBehavior::NonBurnable
    }

    /// Zero-address holdings are subtracted from outstanding supply.
    ///
    /// Unprobed assets are treated as included.
    pub fn zero_address_included(&self) -> bool {
        self.zero_address != ZeroAddressAccounting::Excluded
    }

    /// Received units stay inside the vault for good
    pub fn supply_permanently_held(&self) -> bool {
        self.burn == BurnBehavior::PermanentlyHeld
    }

    /// Moves the burn state forward; earlier states are ignored.
    ///
    /// Returns true if the state changed.
    pub fn advance_burn(&mut self, next: BurnBehavior) -> bool {
        if next > self.burn {
            self.burn = next;
            true
        } else {
            false
        }
    }

    /// Records the zero-address probe result once.
    ///
    /// Returns true if the state changed.
    pub fn learn_zero_address(&mut self, accounting: ZeroAddressAccounting) -> bool {
        if self.zero_address == ZeroAddressAccounting::Unknown
            && accounting != ZeroAddressAccounting::Unknown
        {
            self.zero_address = accounting;
            true
        } else {
            false
        }
    }
}

// ============ Vault Record ============

/// Persistent state of one vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct VaultRecord {
    /// Vault address
    pub address: Address,
    /// Backed asset; immutable after creation
    pub backed_asset: Address,
    /// Kind of the backed asset
    pub kind: AssetKind,
    /// Factory that created the vault; the only caller allowed to disburse loans
    pub factory: Address,
    /// Settings provider consulted for fee routing
    pub settings: Address,
    /// Learned supply/burn behavior
    pub flags: AdaptationFlags,
    /// Cached hook capability
    pub hook: HookState,
}

impl VaultRecord {
    /// Creates a fresh vault record with nothing learned yet
    pub fn new(
        address: Address,
        backed_asset: Address,
        kind: AssetKind,
        factory: Address,
        settings: Address,
    ) -> Self {
        Self {
            address,
            backed_asset,
            kind,
            factory,
            settings,
            flags: AdaptationFlags::default(),
            hook: HookState::Unknown,
        }
    }
}

// ============ Registry Record ============

/// Persistent state of one factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RegistryRecord {
    /// Factory address
    pub address: Address,
    /// Asset kind this factory binds
    pub kind: AssetKind,
    /// Settings provider handed to every vault
    pub settings: Address,
    /// Vaults in creation order
    pub vaults: Vec<Address>,
    /// Backed asset to vault
    pub by_asset: BTreeMap<Address, Address>,
}

impl RegistryRecord {
    pub fn new(address: Address, kind: AssetKind, settings: Address) -> Self {
        Self {
            address,
            kind,
            settings,
            vaults: Vec::new(),
            by_asset: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burn_behavior_is_monotonic() {
        let mut flags = AdaptationFlags::default();
        assert!(flags.advance_burn(BurnBehavior::NonBurnable));
        assert!(!flags.advance_burn(BurnBehavior::Standard));
        assert_eq!(flags.burn, BurnBehavior::NonBurnable);
        assert!(flags.non_burnable());
        assert!(!flags.supply_permanently_held());

        assert!(flags.advance_burn(BurnBehavior::PermanentlyHeld));
        assert!(!flags.advance_burn(BurnBehavior::NonBurnable));
        assert!(flags.supply_permanently_held());
    }

    #[test]
    fn test_zero_address_learned_once() {
        let mut flags = AdaptationFlags::default();
        assert!(flags.zero_address_included());
        assert!(flags.learn_zero_address(ZeroAddressAccounting::Excluded));
        assert!(!flags.zero_address_included());
        assert!(!flags.learn_zero_address(ZeroAddressAccounting::Included));
        assert!(!flags.zero_address_included());
    }

    #[test]
    fn test_short_address() {
        assert_eq!(short_address(&[0xab; 32]), "abababab");
    }
}
