//! Execution Host
//!
//! The host plays the role of the chain: it owns the world state, runs every
//! state-mutating entry point as a call frame that is rolled back on failure,
//! and hands out the per-call exclusive-execution locks that stop reentry.
//!
//! Deployed collaborator code (hooks, loan receivers, settings providers) is
//! immutable and lives outside the rolled-back state.
//!
//! The host also tracks which contract is executing. Units held by a vault
//! only leave it while that vault's own code runs; outside any call (test
//! setup, genesis) the ledger is unrestricted.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use tracing::trace;

use crate::errors::{GlueError, GlueResult};
use crate::events::{EventLog, GlueEvent};
use crate::interfaces::{GlueHook, LoanReceiver, SettingsProvider};
use crate::ledger::{CollectionBehavior, Ledger, TokenBehavior};
use crate::types::{short_address, Address, ItemId, RegistryRecord, VaultRecord};

/// Everything a failed call must not leave behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldState {
    pub ledger: Ledger,
    pub vaults: BTreeMap<Address, VaultRecord>,
    pub registries: BTreeMap<Address, RegistryRecord>,
    pub events: EventLog,
}

type LockKey = (Address, &'static str);

/// The execution environment shared by all contracts
#[derive(Default)]
pub struct Host {
    state: WorldState,
    hooks: BTreeMap<Address, Rc<dyn GlueHook>>,
    receivers: BTreeMap<Address, Rc<dyn LoanReceiver>>,
    settings: BTreeMap<Address, Rc<dyn SettingsProvider>>,
    locks: BTreeSet<LockKey>,
    /// Contracts whose code is running, innermost last
    executing: Vec<Address>,
    depth: usize,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    // ============ State Access ============

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    /// Mutable ledger access, checked against vault custody
    pub fn ledger_mut(&mut self) -> LedgerMut<'_> {
        LedgerMut {
            ledger: &mut self.state.ledger,
            vaults: &self.state.vaults,
            executing: self.executing.last().copied(),
        }
    }

    pub fn vault(&self, address: &Address) -> GlueResult<&VaultRecord> {
        self.state
            .vaults
            .get(address)
            .ok_or(GlueError::VaultNotFound { vault: *address })
    }

    pub fn vault_mut(&mut self, address: &Address) -> GlueResult<&mut VaultRecord> {
        self.state
            .vaults
            .get_mut(address)
            .ok_or(GlueError::VaultNotFound { vault: *address })
    }

    pub fn insert_vault(&mut self, record: VaultRecord) {
        self.state.vaults.insert(record.address, record);
    }

    pub fn registry(&self, address: &Address) -> GlueResult<&RegistryRecord> {
        self.state
            .registries
            .get(address)
            .ok_or(GlueError::ContractNotDeployed { address: *address })
    }

    pub fn registry_mut(&mut self, address: &Address) -> GlueResult<&mut RegistryRecord> {
        self.state
            .registries
            .get_mut(address)
            .ok_or(GlueError::ContractNotDeployed { address: *address })
    }

    pub fn insert_registry(&mut self, record: RegistryRecord) {
        self.state.registries.insert(record.address, record);
    }

    pub fn events(&self) -> &EventLog {
        &self.state.events
    }

    pub fn emit(&mut self, event: GlueEvent) {
        self.state.events.emit(event);
    }

    // ============ Call Frames ============

    /// Runs `f` as one call frame.
    ///
    /// On `Err` the world state is restored to what it was when the frame
    /// was entered, so a failed call has no observable effect. Frames nest:
    /// a failing inner frame only rolls back its own changes.
    pub fn transact<T, F>(&mut self, f: F) -> GlueResult<T>
    where
        F: FnOnce(&mut Host) -> GlueResult<T>,
    {
        let snapshot = self.state.clone();
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;

        if let Err(err) = &result {
            trace!(depth = self.depth, code = err.code(), "frame reverted");
            self.state = snapshot;
        }
        result
    }

    /// Current frame nesting depth (0 outside any call)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Acquires the exclusive-execution lock `(contract, guard)`.
    ///
    /// The returned guard dereferences to the host and releases the lock
    /// when dropped, on every exit path.
    ///
    /// # Errors
    /// `Reentrancy` if the lock is already held by an outer call.
    pub fn enter(&mut self, contract: Address, guard: &'static str) -> GlueResult<CallGuard<'_>> {
        let key = (contract, guard);
        if !self.locks.insert(key) {
            trace!(contract = %short_address(&contract), guard, "reentry refused");
            return Err(GlueError::Reentrancy { contract, guard });
        }
        self.executing.push(contract);
        Ok(CallGuard { host: self, key })
    }

    /// Runs collaborator code deployed at `contract`.
    ///
    /// Ledger outflows made by `f` are attributed to `contract`, so it can
    /// move its own holdings but never a vault's.
    pub fn invoke<T, F>(&mut self, contract: Address, f: F) -> GlueResult<T>
    where
        F: FnOnce(&mut Host) -> GlueResult<T>,
    {
        self.executing.push(contract);
        let result = f(self);
        self.executing.pop();
        result
    }

    /// Innermost contract whose code is running
    pub fn executing(&self) -> Option<Address> {
        self.executing.last().copied()
    }

    pub fn is_locked(&self, contract: &Address, guard: &'static str) -> bool {
        self.locks.contains(&(*contract, guard))
    }

    // ============ Deployed Code ============

    /// Attaches a hook to a backed asset's contract
    pub fn deploy_hook(&mut self, asset: Address, hook: Rc<dyn GlueHook>) {
        self.hooks.insert(asset, hook);
    }

    pub fn hook_of(&self, asset: &Address) -> Option<Rc<dyn GlueHook>> {
        self.hooks.get(asset).cloned()
    }

    pub fn deploy_receiver(&mut self, address: Address, receiver: Rc<dyn LoanReceiver>) {
        self.receivers.insert(address, receiver);
    }

    pub fn receiver(&self, address: &Address) -> GlueResult<Rc<dyn LoanReceiver>> {
        self.receivers
            .get(address)
            .cloned()
            .ok_or(GlueError::ContractNotDeployed { address: *address })
    }

    pub fn deploy_settings(&mut self, address: Address, settings: Rc<dyn SettingsProvider>) {
        self.settings.insert(address, settings);
    }

    pub fn settings(&self, address: &Address) -> GlueResult<Rc<dyn SettingsProvider>> {
        self.settings
            .get(address)
            .cloned()
            .ok_or(GlueError::ContractNotDeployed { address: *address })
    }
}

/// Held exclusive-execution lock; releases on drop
pub struct CallGuard<'a> {
    host: &'a mut Host,
    key: LockKey,
}

impl Deref for CallGuard<'_> {
    type Target = Host;

    fn deref(&self) -> &Host {
        self.host
    }
}

impl DerefMut for CallGuard<'_> {
    fn deref_mut(&mut self) -> &mut Host {
        self.host
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.host.executing.pop();
        self.host.locks.remove(&self.key);
    }
}

/// Mutable view of the ledger handed out by [`Host::ledger_mut`].
///
/// Outflows from a vault are refused unless that vault is the executing
/// contract.
pub struct LedgerMut<'a> {
    ledger: &'a mut Ledger,
    vaults: &'a BTreeMap<Address, VaultRecord>,
    executing: Option<Address>,
}

impl LedgerMut<'_> {
    fn check_custody(&self, from: &Address) -> GlueResult<()> {
        match self.executing {
            Some(actor) if actor != *from && self.vaults.contains_key(from) => {
                trace!(
                    vault = %short_address(from),
                    actor = %short_address(&actor),
                    "vault outflow refused"
                );
                Err(GlueError::Unauthorized {
                    expected: *from,
                    actual: actor,
                })
            }
            _ => Ok(()),
        }
    }

    pub fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> GlueResult<()> {
        self.check_custody(&from)?;
        self.ledger.transfer(asset, from, to, amount)
    }

    pub fn transfer_item(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        item: ItemId,
    ) -> GlueResult<()> {
        self.check_custody(&from)?;
        self.ledger.transfer_item(asset, from, to, item)
    }

    pub fn burn(&mut self, asset: Address, from: Address, amount: u128) -> GlueResult<()> {
        self.check_custody(&from)?;
        self.ledger.burn(asset, from, amount)
    }

    pub fn burn_item(&mut self, asset: Address, from: Address, item: ItemId) -> GlueResult<()> {
        self.check_custody(&from)?;
        self.ledger.burn_item(asset, from, item)
    }

    pub fn create_token(&mut self, asset: Address, behavior: TokenBehavior) -> GlueResult<()> {
        self.ledger.create_token(asset, behavior)
    }

    pub fn create_collection(
        &mut self,
        asset: Address,
        behavior: CollectionBehavior,
    ) -> GlueResult<()> {
        self.ledger.create_collection(asset, behavior)
    }

    pub fn mint(&mut self, asset: Address, to: Address, amount: u128) -> GlueResult<()> {
        self.ledger.mint(asset, to, amount)
    }

    pub fn mint_item(&mut self, asset: Address, to: Address, item: ItemId) -> GlueResult<()> {
        self.ledger.mint_item(asset, to, item)
    }

    pub fn deal_native(&mut self, to: Address, amount: u128) -> GlueResult<()> {
        self.ledger.deal_native(to, amount)
    }
}

impl Deref for LedgerMut<'_> {
    type Target = Ledger;

    fn deref(&self) -> &Ledger {
        self.ledger
    }
}
