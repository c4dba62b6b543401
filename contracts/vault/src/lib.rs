//! Glue Vault
//!
//! One vault per backed asset. The vault custodies any mix of collateral
//! (fungible tokens and the native currency) and lets holders of the backed
//! asset surrender units for a proportional share of every collateral.
//!
//! ## Redemption
//!
//! ```text
//! supply_delta = floor(real_amount * PRECISION / adjusted_supply)
//! payout       = floor(balance * supply_delta / PRECISION) - protocol fee
//! ```
//!
//! The adjusted supply excludes units parked at unreachable sinks and units
//! the vault itself keeps. Surrendered units are burned, sent to the dead
//! address, or kept in the vault, whichever the backed asset allows; the
//! vault learns which on first use.
//!
//! ## Asset kinds
//!
//! [`TokenVault`] backs a fungible token, [`CollectionVault`] an item
//! collection. Both run the same engine through an [`AmountModel`].
//!
//! ## Glued loans
//!
//! Vault collateral can be lent for the duration of one call, alone
//! ([`Vault::flash_loan`]) or together with other vaults of the same factory
//! ([`coordinator::execute_loan`]).

use std::fmt;
use std::marker::PhantomData;

use glue_common::{
    addresses::ZERO_ADDRESS,
    fees::{FLASH_LOAN_FEE, PROTOCOL_FEE},
    AdaptationFlags, Address, GlueError, GlueResult, HookState, Host, VaultRecord,
};

pub mod coordinator;
mod engine;
mod hooks;
mod loan;
mod model;
mod probe;
mod waterfall;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::{LoanAllocation, LoanPlan, LoanReceipt};
pub use engine::{Quote, Redemption};
pub use model::{AmountModel, Fungible, ItemSet};
pub use waterfall::{Payout, QuotedPayout};

/// Vault backing a fungible token
pub type TokenVault = Vault<Fungible>;

/// Vault backing an item collection
pub type CollectionVault = Vault<ItemSet>;

/// Handle to a vault living in the host
pub struct Vault<M: AmountModel> {
    address: Address,
    _model: PhantomData<M>,
}

impl<M: AmountModel> Clone for Vault<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: AmountModel> Copy for Vault<M> {}

impl<M: AmountModel> PartialEq for Vault<M> {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl<M: AmountModel> Eq for Vault<M> {}

impl<M: AmountModel> fmt::Debug for Vault<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("address", &self.address)
            .field("kind", &M::KIND)
            .finish()
    }
}

impl<M: AmountModel> Vault<M> {
    fn handle(address: Address) -> Self {
        Self {
            address,
            _model: PhantomData,
        }
    }

    /// Attaches to an existing vault of this model's kind
    pub fn at(host: &Host, address: Address) -> GlueResult<Self> {
        let record = host.vault(&address)?;
        if record.kind != M::KIND {
            return Err(GlueError::WrongAssetKind {
                asset: record.backed_asset,
                expected: M::KIND,
            });
        }
        Ok(Self::handle(address))
    }

    /// Binds a new vault at `address` to `backed_asset`.
    ///
    /// Called once by the creating factory; the binding never changes.
    pub fn initialize(
        host: &mut Host,
        address: Address,
        backed_asset: Address,
        factory: Address,
        settings: Address,
    ) -> GlueResult<Self> {
        if address == ZERO_ADDRESS || factory == ZERO_ADDRESS {
            return Err(GlueError::InvalidAddress {
                reason: "vault and factory cannot be zero address",
            });
        }
        if host.vault(&address).is_ok() {
            return Err(GlueError::VaultAlreadyExists {
                asset: backed_asset,
                vault: address,
            });
        }
        match host.ledger().kind_of(&backed_asset) {
            Some(kind) if kind == M::KIND => {}
            Some(_) => {
                return Err(GlueError::WrongAssetKind {
                    asset: backed_asset,
                    expected: M::KIND,
                })
            }
            None => return Err(GlueError::UnknownAsset { asset: backed_asset }),
        }
        host.settings(&settings)?;

        host.insert_vault(VaultRecord::new(address, backed_asset, M::KIND, factory, settings));
        Ok(Self::handle(address))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    // ============ Redemption ============

    /// Surrenders `surrender` of the backed asset held by `caller` and pays
    /// the proportional collateral share to `recipient` (defaults to the
    /// caller).
    ///
    /// # Errors
    /// Input validation, transfer and supply errors abort the call with no
    /// state change. Hook failures never do.
    pub fn redeem(
        &self,
        host: &mut Host,
        caller: Address,
        collaterals: &[Address],
        surrender: M::Surrender,
        recipient: Option<Address>,
    ) -> GlueResult<Redemption> {
        engine::redeem::<M>(host, self.address, caller, caller, collaterals, &surrender, recipient)
    }

    /// Same as [`redeem`](Self::redeem) for units `caller` already took from
    /// `origin`; the `Redeemed` event names `origin`
    pub fn redeem_for(
        &self,
        host: &mut Host,
        caller: Address,
        origin: Address,
        collaterals: &[Address],
        surrender: M::Surrender,
        recipient: Option<Address>,
    ) -> GlueResult<Redemption> {
        engine::redeem::<M>(host, self.address, caller, origin, collaterals, &surrender, recipient)
    }

    /// Payouts a redemption of `units` would produce right now
    pub fn quote(&self, host: &Host, collaterals: &[Address], units: u128) -> GlueResult<Quote> {
        engine::quote::<M>(host, self.address, collaterals, units)
    }

    /// Share of outstanding supply `units` represents
    pub fn supply_delta_for(&self, host: &Host, units: u128) -> GlueResult<u128> {
        let supply = self.adjusted_supply(host)?;
        glue_common::supply_delta(units, supply)
    }

    /// Outstanding supply of the backed asset as the vault accounts for it
    pub fn adjusted_supply(&self, host: &Host) -> GlueResult<u128> {
        engine::outstanding_supply::<M>(host, self.address, 0)
    }

    /// Vault balances of `collaterals`, in input order
    pub fn balances(&self, host: &Host, collaterals: &[Address]) -> GlueResult<Vec<u128>> {
        collaterals
            .iter()
            .map(|c| host.ledger().balance_of(c, &self.address))
            .collect()
    }

    // ============ Views ============

    pub fn backed_asset(&self, host: &Host) -> GlueResult<Address> {
        Ok(host.vault(&self.address)?.backed_asset)
    }

    pub fn flags(&self, host: &Host) -> GlueResult<AdaptationFlags> {
        Ok(host.vault(&self.address)?.flags)
    }

    pub fn hook_state(&self, host: &Host) -> GlueResult<HookState> {
        Ok(host.vault(&self.address)?.hook)
    }

    /// Protocol fee rate (PRECISION units)
    pub fn protocol_fee(&self) -> u128 {
        PROTOCOL_FEE
    }

    /// Flash loan fee rate (PRECISION units)
    pub fn flash_loan_fee(&self) -> u128 {
        FLASH_LOAN_FEE
    }

    /// Fee owed on a loan of `amount`, rounded up
    pub fn flash_loan_fee_quote(&self, amount: u128) -> GlueResult<u128> {
        loan::fee_quote(amount)
    }

    // ============ Loans ============

    /// Transfers a loan allocation to `borrower`; `caller` must be the
    /// vault's factory
    pub fn disburse_loan(
        &self,
        host: &mut Host,
        caller: Address,
        asset: Address,
        amount: u128,
        borrower: Address,
    ) -> GlueResult<()> {
        loan::disburse(host, self.address, caller, asset, amount, borrower)
    }

    /// Single-vault glued loan, coordinated by the vault's factory
    pub fn flash_loan(
        &self,
        host: &mut Host,
        asset: Address,
        amount: u128,
        borrower: Address,
        data: &[u8],
    ) -> GlueResult<LoanReceipt> {
        let factory = host.vault(&self.address)?.factory;
        coordinator::execute_loan(host, factory, &[self.address], asset, amount, borrower, data)
    }
}
