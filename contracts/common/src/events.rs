//! Protocol Events for Glue
//!
//! Events are recorded in the host's event log while a call runs and are
//! rolled back with the frame when the call fails. They can be indexed
//! off-chain for UIs and analytics.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Address, AdaptationFlags, AssetKind, HookState, ItemId};

/// Event types for indexing and filtering
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
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Registry Events (0x01 - 0x1F)
    VaultCreated = 0x01,

    // Redemption Events (0x20 - 0x3F)
    Redeemed = 0x20,
    CollateralPaid = 0x21,
    AdaptationLearned = 0x22,
    HookExecuted = 0x23,

    // Loan Events (0x40 - 0x5F)
    LoanDisbursed = 0x40,
    LoanSettled = 0x41,
}

/// Main event enum containing all possible protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum GlueEvent {
    // ============ Registry Events ============

    /// Emitted when a factory binds an asset to a new vault
    VaultCreated {
        factory: Address,
        asset: Address,
        vault: Address,
        kind: AssetKind,
        index: u64,
    },

    // ============ Redemption Events ============

    /// Emitted once per successful redemption
    Redeemed {
        vault: Address,
        /// Account that handed the units to the vault
        caller: Address,
        /// Account the redemption was made for; differs from `caller` when
        /// a factory batch redeems on a user's behalf
        origin: Address,
        recipient: Address,
        real_amount: u128,
        supply_delta: u128,
        supply_before: u128,
        supply_after: u128,
        items: Vec<ItemId>,
    },

    /// Emitted for every collateral actually paid out
    CollateralPaid {
        vault: Address,
        collateral: Address,
        recipient: Address,
        amount: u128,
        protocol_fee: u128,
        hook_amount: u128,
    },

    /// Emitted when the vault learns something about its backed asset
    AdaptationLearned {
        vault: Address,
        flags: AdaptationFlags,
        hook: HookState,
    },

    /// Emitted when value was routed to the backed asset's hook
    HookExecuted {
        vault: Address,
        asset: Address,
        amount: u128,
        succeeded: bool,
    },

    // ============ Loan Events ============

    /// Emitted by a vault when it hands its allocation to a borrower
    LoanDisbursed {
        vault: Address,
        asset: Address,
        amount: u128,
        borrower: Address,
    },

    /// Emitted by the coordinator after every vault verified repayment
    LoanSettled {
        coordinator: Address,
        asset: Address,
        borrower: Address,
        total_amount: u128,
        total_fee: u128,
        vaults: Vec<Address>,
    },
}

impl GlueEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::VaultCreated { .. } => EventType::VaultCreated,
            Self::Redeemed { .. } => EventType::Redeemed,
            Self::CollateralPaid { .. } => EventType::CollateralPaid,
            Self::AdaptationLearned { .. } => EventType::AdaptationLearned,
            Self::HookExecuted { .. } => EventType::HookExecuted,
            Self::LoanDisbursed { .. } => EventType::LoanDisbursed,
            Self::LoanSettled { .. } => EventType::LoanSettled,
        }
    }
}

/// Event log for collecting events during execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<GlueEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: GlueEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[GlueEvent] {
        &self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&GlueEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redeemed() -> GlueEvent {
        GlueEvent::Redeemed {
            vault: [1u8; 32],
            caller: [2u8; 32],
            origin: [2u8; 32],
            recipient: [2u8; 32],
            real_amount: 50,
            supply_delta: 500_000_000_000_000_000,
            supply_before: 100,
            supply_after: 50,
            items: Vec::new(),
        }
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();
        log.emit(redeemed());
        log.emit(GlueEvent::LoanDisbursed {
            vault: [1u8; 32],
            asset: [3u8; 32],
            amount: 40,
            borrower: [4u8; 32],
        });

        assert_eq!(log.len(), 2);
        assert!(!log.is_empty());
        assert_eq!(log.filter_by_type(EventType::Redeemed).len(), 1);
        assert_eq!(log.filter_by_type(EventType::LoanSettled).len(), 0);
    }

    #[test]
    fn test_event_encodings() {
        let event = redeemed();

        let bytes = borsh::to_vec(&event).unwrap();
        let decoded: GlueEvent = borsh::from_slice(&bytes).unwrap();
        assert_eq!(decoded, event);

        let mut cbor = Vec::new();
        ciborium::into_writer(&event, &mut cbor).unwrap();
        assert!(!cbor.is_empty());
    }
}
