//! Glue Common Library
//!
//! Shared types, constants, and utilities for all Glue contracts.
//!
//! A Glue vault makes any fungible token or item collection "asset-backed":
//! holders surrender units of the backed asset and receive a proportional
//! share of whatever collateral the vault custodies. This crate holds the
//! pieces every contract needs:
//!
//! - **Fixed-point math**: 18-decimal ratios, 256-bit intermediates,
//!   explicit rounding direction
//! - **Asset ledger**: fungible tokens, item collections and the native
//!   currency, including non-standard transfer behavior
//! - **Execution host**: rolled-back call frames and per-call
//!   exclusive-execution locks
//! - **Collaborator interfaces**: hooks, loan receivers, fee settings
//! - **Events**: indexable records of registry, redemption and loan activity

pub mod constants;
pub mod errors;
pub mod events;
pub mod host;
pub mod interfaces;
pub mod ledger;
pub mod math;
pub mod types;

// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use events::*;
pub use host::{CallGuard, Host, LedgerMut, WorldState};
pub use interfaces::*;
pub use ledger::{CollectionBehavior, Ledger, TokenBehavior, ZeroAddressPolicy};
pub use math::*;
pub use types::*;
