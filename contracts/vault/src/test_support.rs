//! Shared fixtures for vault tests

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glue_common::{
    precision::PRECISION, Address, CollectionBehavior, FeeSettings, GlueError, GlueHook,
    GlueResult, HookContext, Host, ItemId, LoanReceiver, StaticSettings, TokenBehavior,
};

use crate::{CollectionVault, TokenVault};

pub const ALICE: Address = [1u8; 32];
pub const BOB: Address = [2u8; 32];
pub const OPERATOR: Address = [3u8; 32];
pub const TREASURY: Address = [4u8; 32];
pub const BORROWER: Address = [5u8; 32];
pub const FACTORY: Address = [0xfa; 32];
pub const SETTINGS: Address = [0x5e; 32];
pub const VAULT: Address = [0x10; 32];
pub const BACKED: Address = [0x20; 32];
pub const COLL_A: Address = [0xa1; 32];
pub const COLL_B: Address = [0xb1; 32];

/// Host with fee settings deployed; the operator takes `operator_share`
pub fn host_with_settings(operator_share: u128) -> Host {
    let mut host = Host::new();
    let settings = StaticSettings::new(FeeSettings {
        operator_share,
        operator: OPERATOR,
        remainder: TREASURY,
    })
    .unwrap();
    host.deploy_settings(SETTINGS, Rc::new(settings));
    host
}

/// Standard fungible collateral token funded into `holder`
pub fn fund_collateral(host: &mut Host, asset: Address, holder: Address, amount: u128) {
    if host.ledger().kind_of(&asset).is_none() {
        host.ledger_mut().create_token(asset, TokenBehavior::default()).unwrap();
    }
    host.ledger_mut().mint(asset, holder, amount).unwrap();
}

/// Token vault over a backed token with `supply` units held by ALICE
pub fn token_vault(host: &mut Host, behavior: TokenBehavior, supply: u128) -> TokenVault {
    host.ledger_mut().create_token(BACKED, behavior).unwrap();
    host.ledger_mut().mint(BACKED, ALICE, supply).unwrap();
    TokenVault::initialize(host, VAULT, BACKED, FACTORY, SETTINGS).unwrap()
}

/// Collection vault over items `0..count` held by ALICE
pub fn collection_vault(
    host: &mut Host,
    behavior: CollectionBehavior,
    count: u64,
) -> CollectionVault {
    host.ledger_mut().create_collection(BACKED, behavior).unwrap();
    for item in 0..count {
        host.ledger_mut().mint_item(BACKED, ALICE, item).unwrap();
    }
    CollectionVault::initialize(host, VAULT, BACKED, FACTORY, SETTINGS).unwrap()
}

// ============ Hook ============

/// Configurable hook that records what it saw
#[derive(Default)]
pub struct RecordingHook {
    pub present: bool,
    /// Claimed fraction (PRECISION units)
    pub fraction: u128,
    pub fail_capability: bool,
    pub fail_size: bool,
    pub fail_execute: bool,
    /// Tries to redeem this many units again from inside the callback
    pub reenter_with: Option<u128>,
    /// Tries to pull this many COLL_A out of the vault from inside the callback
    pub drain: Option<u128>,
    pub capability_queries: Cell<usize>,
    pub executions: Cell<usize>,
    pub amounts: RefCell<Vec<u128>>,
    pub items: RefCell<Vec<ItemId>>,
    pub reentry_error: RefCell<Option<GlueError>>,
    pub drain_error: RefCell<Option<GlueError>>,
}

impl RecordingHook {
    pub fn claiming(fraction: u128) -> Self {
        Self {
            present: true,
            fraction,
            ..Self::default()
        }
    }

    pub fn notify_only() -> Self {
        Self::claiming(0)
    }
}

impl GlueHook for RecordingHook {
    fn has_hook(&self, _host: &Host) -> GlueResult<bool> {
        self.capability_queries.set(self.capability_queries.get() + 1);
        if self.fail_capability {
            return Err(GlueError::HookFailed { reason: "capability query" });
        }
        Ok(self.present)
    }

    fn hook_size(&self, _host: &Host, _asset: Address, _amount: u128) -> GlueResult<u128> {
        if self.fail_size {
            return Err(GlueError::HookFailed { reason: "size query" });
        }
        Ok(self.fraction.min(2 * PRECISION))
    }

    fn execute_hook(
        &self,
        host: &mut Host,
        _asset: Address,
        amount: u128,
        context: &HookContext,
    ) -> GlueResult<()> {
        self.executions.set(self.executions.get() + 1);
        self.amounts.borrow_mut().push(amount);
        self.items.borrow_mut().extend_from_slice(&context.items);

        if let Some(units) = self.reenter_with {
            let vault = TokenVault::at(host, context.vault)?;
            let err = vault
                .redeem(host, ALICE, &[COLL_A], units, None)
                .err();
            *self.reentry_error.borrow_mut() = err.clone();
            if let Some(err) = err {
                return Err(err);
            }
        }
        if let Some(units) = self.drain {
            *self.drain_error.borrow_mut() = host
                .ledger_mut()
                .transfer(COLL_A, context.vault, BOB, units)
                .err();
        }
        if self.fail_execute {
            return Err(GlueError::HookFailed { reason: "execute" });
        }
        Ok(())
    }
}

// ============ Borrower ============

/// Borrower that repays what it is told, minus an optional shortfall
#[derive(Default)]
pub struct Repayer {
    /// (index into the vault list, units withheld)
    pub shortfall: Option<(usize, u128)>,
    pub answer_false: bool,
    pub fail: bool,
    /// Starts a nested single-vault loan from the callback
    pub nested_loan: Option<(Address, Address, u128)>,
    pub calls: Cell<usize>,
    pub seen_repay: RefCell<Vec<u128>>,
    pub nested_error: RefCell<Option<GlueError>>,
}

impl LoanReceiver for Repayer {
    fn on_glued_loan(
        &self,
        host: &mut Host,
        borrower: Address,
        vaults: &[Address],
        asset: Address,
        expected_repay: &[u128],
        _data: &[u8],
    ) -> GlueResult<bool> {
        self.calls.set(self.calls.get() + 1);
        self.seen_repay.borrow_mut().extend_from_slice(expected_repay);

        if let Some((vault, loan_asset, amount)) = self.nested_loan {
            let err = TokenVault::at(host, vault)?
                .flash_loan(host, loan_asset, amount, borrower, &[])
                .err();
            *self.nested_error.borrow_mut() = err;
        }
        if self.fail {
            return Err(GlueError::HookFailed { reason: "borrower" });
        }
        if self.answer_false {
            return Ok(false);
        }

        for (index, (vault, repay)) in vaults.iter().zip(expected_repay).enumerate() {
            let withheld = match self.shortfall {
                Some((short_index, units)) if short_index == index => units,
                _ => 0,
            };
            host.ledger_mut()
                .transfer(asset, borrower, *vault, repay - withheld)?;
        }
        Ok(true)
    }
}
