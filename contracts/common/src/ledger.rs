//! Asset Ledger
//!
//! Balances of every asset a vault can touch: fungible tokens, item
//! collections and the native currency. Each asset carries its own transfer
//! rules, so non-standard behavior (no burn, taxed transfers, odd zero-address
//! handling) lives here and vaults only observe it through balances.
//!
//! Every operation validates before it mutates; a failed operation leaves the
//! ledger untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    addresses::{DEAD_ADDRESS, NATIVE_ASSET, ZERO_ADDRESS},
    BPS_DENOMINATOR,
};
use crate::errors::{GlueError, GlueResult};
use crate::math::{mul_div, safe_add, safe_sub, Rounding};
use crate::types::{Address, AssetKind, ItemId};

// ============ Asset Behavior ============

/// What a fungible token does with a transfer to the zero address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZeroAddressPolicy {
    /// The transfer is refused
    #[default]
    Reject,
    /// The units are destroyed and total supply shrinks
    Burn,
    /// The zero address is credited like any holder; supply is unchanged
    Hold,
}

/// Transfer rules of a fungible token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBehavior {
    pub burnable: bool,
    pub zero_address: ZeroAddressPolicy,
    pub dead_transfers: bool,
    /// Portion of every transfer destroyed in flight
    pub transfer_tax_bps: u16,
    pub frozen: bool,
}

impl Default for TokenBehavior {
    fn default() -> Self {
        Self {
            burnable: true,
            zero_address: ZeroAddressPolicy::Reject,
            dead_transfers: true,
            transfer_tax_bps: 0,
            frozen: false,
        }
    }
}

impl TokenBehavior {
    pub fn non_burnable(mut self) -> Self {
        self.burnable = false;
        self
    }

    pub fn with_zero_address(mut self, policy: ZeroAddressPolicy) -> Self {
        self.zero_address = policy;
        self
    }

    pub fn without_dead_transfers(mut self) -> Self {
        self.dead_transfers = false;
        self
    }

    pub fn with_transfer_tax(mut self, bps: u16) -> Self {
        self.transfer_tax_bps = bps;
        self
    }

    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }
}

/// Transfer rules of an item collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionBehavior {
    pub burnable: bool,
    pub dead_transfers: bool,
    pub frozen: bool,
}

impl Default for CollectionBehavior {
    fn default() -> Self {
        Self {
            burnable: true,
            dead_transfers: true,
            frozen: false,
        }
    }
}

impl CollectionBehavior {
    pub fn non_burnable(mut self) -> Self {
        self.burnable = false;
        self
    }

    pub fn without_dead_transfers(mut self) -> Self {
        self.dead_transfers = false;
        self
    }
}

// ============ Ledgers ============

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TokenLedger {
    behavior: TokenBehavior,
    total_supply: u128,
    balances: BTreeMap<Address, u128>,
}

impl TokenLedger {
    fn balance(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn debit(&mut self, asset: Address, holder: Address, amount: u128) -> GlueResult<()> {
        let available = self.balance(&holder);
        if available < amount {
            return Err(GlueError::InsufficientBalance {
                asset,
                available,
                requested: amount,
            });
        }
        self.balances.insert(holder, available - amount);
        Ok(())
    }

    fn credit(&mut self, holder: Address, amount: u128) -> GlueResult<()> {
        let balance = safe_add(self.balance(&holder), amount)?;
        self.balances.insert(holder, balance);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CollectionLedger {
    behavior: CollectionBehavior,
    owners: BTreeMap<ItemId, Address>,
    balances: BTreeMap<Address, u128>,
}

impl CollectionLedger {
    fn balance(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn check_owner(&self, asset: Address, holder: Address, item: ItemId) -> GlueResult<()> {
        match self.owners.get(&item) {
            Some(owner) if *owner == holder => Ok(()),
            _ => Err(GlueError::ItemNotOwned { asset, item, holder }),
        }
    }

    fn reassign(&mut self, from: Address, to: Option<Address>, item: ItemId) {
        let from_balance = self.balance(&from);
        self.balances.insert(from, from_balance.saturating_sub(1));
        match to {
            Some(to) => {
                let to_balance = self.balance(&to);
                self.balances.insert(to, to_balance.saturating_add(1));
                self.owners.insert(item, to);
            }
            None => {
                self.owners.remove(&item);
            }
        }
    }
}

/// Balances of all assets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    native: BTreeMap<Address, u128>,
    tokens: BTreeMap<Address, TokenLedger>,
    collections: BTreeMap<Address, CollectionLedger>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ============ Registration ============

    fn check_new_asset(&self, asset: Address) -> GlueResult<()> {
        if asset == ZERO_ADDRESS || asset == NATIVE_ASSET || asset == DEAD_ADDRESS {
            return Err(GlueError::InvalidAddress {
                reason: "reserved address cannot be an asset",
            });
        }
        if self.kind_of(&asset).is_some() {
            return Err(GlueError::InvalidInput {
                param: "asset",
                reason: "asset already registered",
            });
        }
        Ok(())
    }

    /// Registers a fungible token with zero supply
    pub fn create_token(&mut self, asset: Address, behavior: TokenBehavior) -> GlueResult<()> {
        self.check_new_asset(asset)?;
        self.tokens.insert(
            asset,
            TokenLedger {
                behavior,
                ..TokenLedger::default()
            },
        );
        Ok(())
    }

    /// Registers an item collection with no items
    pub fn create_collection(
        &mut self,
        asset: Address,
        behavior: CollectionBehavior,
    ) -> GlueResult<()> {
        self.check_new_asset(asset)?;
        self.collections.insert(
            asset,
            CollectionLedger {
                behavior,
                ..CollectionLedger::default()
            },
        );
        Ok(())
    }

    /// Kind of a registered asset
    pub fn kind_of(&self, asset: &Address) -> Option<AssetKind> {
        if *asset == NATIVE_ASSET {
            Some(AssetKind::Native)
        } else if self.tokens.contains_key(asset) {
            Some(AssetKind::Fungible)
        } else if self.collections.contains_key(asset) {
            Some(AssetKind::ItemSet)
        } else {
            None
        }
    }

    fn token(&self, asset: &Address) -> GlueResult<&TokenLedger> {
        self.tokens
            .get(asset)
            .ok_or(GlueError::UnknownAsset { asset: *asset })
    }

    fn token_mut(&mut self, asset: &Address) -> GlueResult<&mut TokenLedger> {
        self.tokens
            .get_mut(asset)
            .ok_or(GlueError::UnknownAsset { asset: *asset })
    }

    fn collection(&self, asset: &Address) -> GlueResult<&CollectionLedger> {
        self.collections
            .get(asset)
            .ok_or(GlueError::UnknownAsset { asset: *asset })
    }

    fn collection_mut(&mut self, asset: &Address) -> GlueResult<&mut CollectionLedger> {
        self.collections
            .get_mut(asset)
            .ok_or(GlueError::UnknownAsset { asset: *asset })
    }

    // ============ Issuance ============

    /// Issues new token units
    pub fn mint(&mut self, asset: Address, to: Address, amount: u128) -> GlueResult<()> {
        let token = self.token_mut(&asset)?;
        let total_supply = safe_add(token.total_supply, amount)?;
        token.credit(to, amount)?;
        token.total_supply = total_supply;
        Ok(())
    }

    /// Issues a new item
    pub fn mint_item(&mut self, asset: Address, to: Address, item: ItemId) -> GlueResult<()> {
        let collection = self.collection_mut(&asset)?;
        if collection.owners.contains_key(&item) {
            return Err(GlueError::ItemExists { asset, item });
        }
        collection.owners.insert(item, to);
        let balance = collection.balance(&to);
        collection.balances.insert(to, balance.saturating_add(1));
        Ok(())
    }

    /// Credits native currency out of thin air
    pub fn deal_native(&mut self, to: Address, amount: u128) -> GlueResult<()> {
        let balance = safe_add(self.native.get(&to).copied().unwrap_or(0), amount)?;
        self.native.insert(to, balance);
        Ok(())
    }

    // ============ Views ============

    /// Balance of any asset kind; item collections report the item count
    pub fn balance_of(&self, asset: &Address, holder: &Address) -> GlueResult<u128> {
        match self.kind_of(asset) {
            Some(AssetKind::Native) => Ok(self.native.get(holder).copied().unwrap_or(0)),
            Some(AssetKind::Fungible) => Ok(self.token(asset)?.balance(holder)),
            Some(AssetKind::ItemSet) => Ok(self.collection(asset)?.balance(holder)),
            None => Err(GlueError::UnknownAsset { asset: *asset }),
        }
    }

    /// Total issued units as reported by the asset itself
    pub fn total_supply(&self, asset: &Address) -> GlueResult<u128> {
        match self.kind_of(asset) {
            Some(AssetKind::Native) => Ok(self.native.values().sum()),
            Some(AssetKind::Fungible) => Ok(self.token(asset)?.total_supply),
            Some(AssetKind::ItemSet) => Ok(self.collection(asset)?.owners.len() as u128),
            None => Err(GlueError::UnknownAsset { asset: *asset }),
        }
    }

    /// Current owner of an item
    pub fn owner_of(&self, asset: &Address, item: ItemId) -> GlueResult<Option<Address>> {
        Ok(self.collection(asset)?.owners.get(&item).copied())
    }

    // ============ Movements ============

    /// Moves a continuous amount of a fungible token or the native currency
    pub fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> GlueResult<()> {
        match self.kind_of(&asset) {
            Some(AssetKind::Native) => self.transfer_native(from, to, amount),
            Some(AssetKind::Fungible) => self.transfer_token(asset, from, to, amount),
            Some(AssetKind::ItemSet) => Err(GlueError::WrongAssetKind {
                asset,
                expected: AssetKind::Fungible,
            }),
            None => Err(GlueError::UnknownAsset { asset }),
        }
    }

    fn transfer_native(&mut self, from: Address, to: Address, amount: u128) -> GlueResult<()> {
        if to == ZERO_ADDRESS {
            return Err(GlueError::TransferRejected {
                asset: NATIVE_ASSET,
                reason: "native transfer to zero address",
            });
        }
        let available = self.native.get(&from).copied().unwrap_or(0);
        if available < amount {
            return Err(GlueError::InsufficientBalance {
                asset: NATIVE_ASSET,
                available,
                requested: amount,
            });
        }
        self.native.insert(from, available - amount);
        let credited = safe_add(self.native.get(&to).copied().unwrap_or(0), amount)?;
        self.native.insert(to, credited);
        Ok(())
    }

    fn transfer_token(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> GlueResult<()> {
        let token = self.token_mut(&asset)?;
        let behavior = token.behavior;

        if behavior.frozen {
            return Err(GlueError::TransferRejected { asset, reason: "token frozen" });
        }
        if to == DEAD_ADDRESS && !behavior.dead_transfers {
            return Err(GlueError::TransferRejected {
                asset,
                reason: "dead address transfers disabled",
            });
        }
        if to == ZERO_ADDRESS && behavior.zero_address == ZeroAddressPolicy::Reject {
            return Err(GlueError::TransferRejected {
                asset,
                reason: "transfer to zero address",
            });
        }
        if token.balance(&from) < amount {
            return Err(GlueError::InsufficientBalance {
                asset,
                available: token.balance(&from),
                requested: amount,
            });
        }

        let tax = mul_div(
            amount,
            behavior.transfer_tax_bps as u128,
            BPS_DENOMINATOR,
            Rounding::Down,
        )?
            .min(amount);
        let received = amount - tax;
        let mut destroyed = tax;

        token.debit(asset, from, amount)?;
        if to == ZERO_ADDRESS && behavior.zero_address == ZeroAddressPolicy::Burn {
            destroyed += received;
        } else {
            token.credit(to, received)?;
        }
        token.total_supply = safe_sub(token.total_supply, destroyed)?;
        Ok(())
    }

    /// Destroys token units held by `from`
    pub fn burn(&mut self, asset: Address, from: Address, amount: u128) -> GlueResult<()> {
        let token = self.token_mut(&asset)?;
        if !token.behavior.burnable {
            return Err(GlueError::BurnRejected { asset });
        }
        if token.behavior.frozen {
            return Err(GlueError::TransferRejected { asset, reason: "token frozen" });
        }
        token.debit(asset, from, amount)?;
        token.total_supply = safe_sub(token.total_supply, amount)?;
        Ok(())
    }

    /// Moves one item
    pub fn transfer_item(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        item: ItemId,
    ) -> GlueResult<()> {
        let collection = self.collection_mut(&asset)?;
        if collection.behavior.frozen {
            return Err(GlueError::TransferRejected {
                asset,
                reason: "collection frozen",
            });
        }
        if to == ZERO_ADDRESS {
            return Err(GlueError::TransferRejected {
                asset,
                reason: "transfer to zero address",
            });
        }
        if to == DEAD_ADDRESS && !collection.behavior.dead_transfers {
            return Err(GlueError::TransferRejected {
                asset,
                reason: "dead address transfers disabled",
            });
        }
        collection.check_owner(asset, from, item)?;
        collection.reassign(from, Some(to), item);
        Ok(())
    }

    /// Destroys one item held by `from`
    pub fn burn_item(&mut self, asset: Address, from: Address, item: ItemId) -> GlueResult<()> {
        let collection = self.collection_mut(&asset)?;
        if !collection.behavior.burnable {
            return Err(GlueError::BurnRejected { asset });
        }
        collection.check_owner(asset, from, item)?;
        collection.reassign(from, None, item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: Address = [7u8; 32];
    const NFT: Address = [8u8; 32];
    const ALICE: Address = [1u8; 32];
    const BOB: Address = [2u8; 32];

    fn ledger_with(behavior: TokenBehavior) -> Ledger {
        let mut ledger = Ledger::new();
        ledger.create_token(TOKEN, behavior).unwrap();
        ledger.mint(TOKEN, ALICE, 1_000).unwrap();
        ledger
    }

    #[test]
    fn test_standard_transfer_and_burn() {
        let mut ledger = ledger_with(TokenBehavior::default());
        ledger.transfer(TOKEN, ALICE, BOB, 400).unwrap();
        assert_eq!(ledger.balance_of(&TOKEN, &BOB).unwrap(), 400);

        ledger.burn(TOKEN, BOB, 100).unwrap();
        assert_eq!(ledger.total_supply(&TOKEN).unwrap(), 900);
        assert!(matches!(
            ledger.transfer(TOKEN, ALICE, ZERO_ADDRESS, 1),
            Err(GlueError::TransferRejected { .. })
        ));
    }

    #[test]
    fn test_zero_address_policies() {
        let mut burning =
            ledger_with(TokenBehavior::default().with_zero_address(ZeroAddressPolicy::Burn));
        burning.transfer(TOKEN, ALICE, ZERO_ADDRESS, 10).unwrap();
        assert_eq!(burning.total_supply(&TOKEN).unwrap(), 990);
        assert_eq!(burning.balance_of(&TOKEN, &ZERO_ADDRESS).unwrap(), 0);

        let mut holding =
            ledger_with(TokenBehavior::default().with_zero_address(ZeroAddressPolicy::Hold));
        holding.transfer(TOKEN, ALICE, ZERO_ADDRESS, 10).unwrap();
        assert_eq!(holding.total_supply(&TOKEN).unwrap(), 1_000);
        assert_eq!(holding.balance_of(&TOKEN, &ZERO_ADDRESS).unwrap(), 10);
    }

    #[test]
    fn test_taxed_transfer_short_delivers() {
        let mut ledger = ledger_with(TokenBehavior::default().with_transfer_tax(500));
        ledger.transfer(TOKEN, ALICE, BOB, 100).unwrap();
        assert_eq!(ledger.balance_of(&TOKEN, &BOB).unwrap(), 95);
        assert_eq!(ledger.total_supply(&TOKEN).unwrap(), 995);
    }

    #[test]
    fn test_failed_operations_leave_state() {
        let mut ledger =
            ledger_with(TokenBehavior::default().non_burnable().without_dead_transfers());
        let before = ledger.clone();
        assert_eq!(ledger.burn(TOKEN, ALICE, 1), Err(GlueError::BurnRejected { asset: TOKEN }));
        assert!(ledger.transfer(TOKEN, ALICE, DEAD_ADDRESS, 1).is_err());
        assert!(ledger.transfer(TOKEN, ALICE, BOB, 1_001).is_err());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_items() {
        let mut ledger = Ledger::new();
        ledger.create_collection(NFT, CollectionBehavior::default()).unwrap();
        ledger.mint_item(NFT, ALICE, 1).unwrap();
        ledger.mint_item(NFT, ALICE, 2).unwrap();
        assert!(ledger.mint_item(NFT, BOB, 2).is_err());

        ledger.transfer_item(NFT, ALICE, BOB, 1).unwrap();
        assert_eq!(ledger.balance_of(&NFT, &BOB).unwrap(), 1);
        assert!(ledger.transfer_item(NFT, ALICE, BOB, 1).is_err());

        ledger.burn_item(NFT, BOB, 1).unwrap();
        assert_eq!(ledger.total_supply(&NFT).unwrap(), 1);
        assert_eq!(ledger.owner_of(&NFT, 1).unwrap(), None);
    }

    #[test]
    fn test_native_shares_abstraction() {
        let mut ledger = Ledger::new();
        ledger.deal_native(ALICE, 5).unwrap();
        ledger.transfer(NATIVE_ASSET, ALICE, BOB, 3).unwrap();
        assert_eq!(ledger.balance_of(&NATIVE_ASSET, &BOB).unwrap(), 3);
        assert_eq!(ledger.kind_of(&NATIVE_ASSET), Some(AssetKind::Native));
    }
}
