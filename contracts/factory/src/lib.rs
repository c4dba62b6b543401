//! Glue Factory
//!
//! Deploys one vault per backed asset at a deterministic address, keeps the
//! asset → vault registry, and offers batch entry points over many vaults:
//!
//! - **create_vault**: bind an asset to a new vault (once per asset)
//! - **batch_redeem / batch_quote / batch_balances**: act on many vaults
//!   in one call
//! - **glued_loan**: borrow one asset from several vaults atomically
//!
//! A factory binds a single asset kind: [`TokenFactory`] for fungible tokens,
//! [`CollectionFactory`] for item collections.

use std::fmt;
use std::marker::PhantomData;

use glue_common::{
    addresses::ZERO_ADDRESS, guards, short_address, Address, AssetKind, GlueError, GlueEvent,
    GlueResult, Host, RegistryRecord,
};
use glue_vault::{
    coordinator, AmountModel, Fungible, ItemSet, LoanReceipt, Quote, Redemption, Vault,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info};


/// Domain separator for vault address derivation
const VAULT_ADDRESS_DOMAIN: &[u8] = b"glue/vault/v1";

/// Factory for fungible-token vaults
pub type TokenFactory = GlueFactory<Fungible>;

/// Factory for item-collection vaults
pub type CollectionFactory = GlueFactory<ItemSet>;

/// One entry of a batch redemption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemRequest<S> {
    /// Backed asset whose vault is redeemed against
    pub asset: Address,
    pub surrender: S,
    /// Defaults to the caller
    pub recipient: Option<Address>,
}

/// Deterministic vault address for `asset` under `factory`
pub fn compute_vault_address(factory: &Address, asset: &Address, kind: AssetKind) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(VAULT_ADDRESS_DOMAIN);
    hasher.update(factory);
    hasher.update(asset);
    hasher.update([kind_tag(kind)]);
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

fn kind_tag(kind: AssetKind) -> u8 {
    match kind {
        AssetKind::Fungible => 0x01,
        AssetKind::ItemSet => 0x02,
        AssetKind::Native => 0x03,
    }
}

/// Handle to a factory living in the host
pub struct GlueFactory<M: AmountModel> {
    address: Address,
    _model: PhantomData<M>,
}

impl<M: AmountModel> Clone for GlueFactory<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: AmountModel> Copy for GlueFactory<M> {}

impl<M: AmountModel> fmt::Debug for GlueFactory<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlueFactory")
            .field("address", &self.address)
            .field("kind", &M::KIND)
            .finish()
    }
}

impl<M: AmountModel> GlueFactory<M> {
    fn handle(address: Address) -> Self {
        Self {
            address,
            _model: PhantomData,
        }
    }

    /// Deploys a factory whose vaults route fees through `settings`
    pub fn deploy(host: &mut Host, address: Address, settings: Address) -> GlueResult<Self> {
        if address == ZERO_ADDRESS {
            return Err(GlueError::InvalidAddress {
                reason: "factory cannot be zero address",
            });
        }
        if host.registry(&address).is_ok() {
            return Err(GlueError::InvalidInput {
                param: "address",
                reason: "factory already deployed",
            });
        }
        host.settings(&settings)?;

        host.insert_registry(RegistryRecord::new(address, M::KIND, settings));
        info!(factory = %short_address(&address), kind = ?M::KIND, "factory deployed");
        Ok(Self::handle(address))
    }

    /// Attaches to a deployed factory of this model's kind
    pub fn at(host: &Host, address: Address) -> GlueResult<Self> {
        let registry = host.registry(&address)?;
        if registry.kind != M::KIND {
            return Err(GlueError::InvalidInput {
                param: "address",
                reason: "factory binds another asset kind",
            });
        }
        Ok(Self::handle(address))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Address the vault for `asset` has, or will have
    pub fn compute_vault_address(&self, asset: &Address) -> Address {
        compute_vault_address(&self.address, asset, M::KIND)
    }

    // ============ Registry ============

    /// Binds `asset` to a new vault.
    ///
    /// # Errors
    /// - `VaultAlreadyExists` if the asset is already bound
    /// - `WrongAssetKind` / `UnknownAsset` if the ledger does not know the
    ///   asset as this factory's kind
    pub fn create_vault(&self, host: &mut Host, asset: Address) -> GlueResult<Vault<M>> {
        let factory = self.address;
        host.transact(|h| {
            let mut guard = h.enter(factory, guards::FACTORY)?;
            let host: &mut Host = &mut guard;

            if asset == ZERO_ADDRESS {
                return Err(GlueError::InvalidAddress {
                    reason: "asset cannot be zero address",
                });
            }
            let registry = host.registry(&factory)?;
            if let Some(existing) = registry.by_asset.get(&asset) {
                return Err(GlueError::VaultAlreadyExists {
                    asset,
                    vault: *existing,
                });
            }
            let settings = registry.settings;

            let address = compute_vault_address(&factory, &asset, M::KIND);
            let vault = Vault::<M>::initialize(host, address, asset, factory, settings)?;

            let registry = host.registry_mut(&factory)?;
            registry.vaults.push(address);
            registry.by_asset.insert(asset, address);
            let index = (registry.vaults.len() - 1) as u64;

            info!(
                factory = %short_address(&factory),
                asset = %short_address(&asset),
                vault = %short_address(&address),
                index,
                "vault created"
            );
            host.emit(GlueEvent::VaultCreated {
                factory,
                asset,
                vault: address,
                kind: M::KIND,
                index,
            });
            Ok(vault)
        })
    }

    pub fn vault_count(&self, host: &Host) -> GlueResult<usize> {
        Ok(host.registry(&self.address)?.vaults.len())
    }

    pub fn vault_at(&self, host: &Host, index: usize) -> GlueResult<Vault<M>> {
        let vaults = &host.registry(&self.address)?.vaults;
        let address = vaults.get(index).ok_or(GlueError::IndexOutOfBounds {
            index,
            len: vaults.len(),
        })?;
        Vault::at(host, *address)
    }

    /// Vault bound to `asset`
    pub fn vault_of(&self, host: &Host, asset: &Address) -> GlueResult<Vault<M>> {
        let address = host
            .registry(&self.address)?
            .by_asset
            .get(asset)
            .ok_or(GlueError::AssetNotBacked { asset: *asset })?;
        Vault::at(host, *address)
    }

    // ============ Batch Operations ============

    /// Redeems against several vaults in one atomic call.
    ///
    /// The factory takes the surrendered units from `caller`, then redeems
    /// them itself; payouts go to each request's recipient, or to `caller`.
    pub fn batch_redeem(
        &self,
        host: &mut Host,
        caller: Address,
        requests: &[RedeemRequest<M::Surrender>],
        collaterals: &[Address],
    ) -> GlueResult<Vec<Redemption>> {
        if requests.is_empty() {
            return Err(GlueError::InvalidInput {
                param: "requests",
                reason: "empty batch",
            });
        }
        let factory = self.address;
        host.transact(|h| {
            let mut guard = h.enter(factory, guards::FACTORY)?;
            let host: &mut Host = &mut guard;

            let mut redemptions = Vec::with_capacity(requests.len());
            for request in requests {
                let vault = self.vault_of(host, &request.asset)?;
                M::validate(&request.surrender)?;

                let received =
                    M::receive(host, request.asset, caller, factory, &request.surrender)?;
                let forwarded = M::forward(&request.surrender, received);
                let recipient = match request.recipient {
                    Some(r) if r != ZERO_ADDRESS => r,
                    _ => caller,
                };
                redemptions.push(vault.redeem_for(
                    host,
                    factory,
                    caller,
                    collaterals,
                    forwarded,
                    Some(recipient),
                )?);
            }

            debug!(
                factory = %short_address(&factory),
                caller = %short_address(&caller),
                count = redemptions.len(),
                "batch redeemed"
            );
            Ok(redemptions)
        })
    }

    /// Quotes `(asset, units)` pairs against their vaults
    pub fn batch_quote(
        &self,
        host: &Host,
        requests: &[(Address, u128)],
        collaterals: &[Address],
    ) -> GlueResult<Vec<Quote>> {
        requests
            .iter()
            .map(|(asset, units)| self.vault_of(host, asset)?.quote(host, collaterals, *units))
            .collect()
    }

    /// Collateral balances of the vaults bound to `assets`
    pub fn batch_balances(
        &self,
        host: &Host,
        assets: &[Address],
        collaterals: &[Address],
    ) -> GlueResult<Vec<Vec<u128>>> {
        assets
            .iter()
            .map(|asset| self.vault_of(host, asset)?.balances(host, collaterals))
            .collect()
    }

    // ============ Loans ============

    /// Borrows `amount` of `asset` from `vaults` (all created by this
    /// factory) for the duration of the borrower's callback
    pub fn glued_loan(
        &self,
        host: &mut Host,
        vaults: &[Address],
        asset: Address,
        amount: u128,
        borrower: Address,
        data: &[u8],
    ) -> GlueResult<LoanReceipt> {
        coordinator::execute_loan(host, self.address, vaults, asset, amount, borrower, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_address_is_deterministic() {
        let factory = [1u8; 32];
        let asset = [2u8; 32];

        let a = compute_vault_address(&factory, &asset, AssetKind::Fungible);
        assert_eq!(a, compute_vault_address(&factory, &asset, AssetKind::Fungible));
        assert_ne!(a, compute_vault_address(&factory, &asset, AssetKind::ItemSet));
        assert_ne!(a, compute_vault_address(&[3u8; 32], &asset, AssetKind::Fungible));
        assert_ne!(a, compute_vault_address(&factory, &[4u8; 32], AssetKind::Fungible));
    }

    #[test]
    fn test_kind_tags_unique() {
        let tags = [
            kind_tag(AssetKind::Fungible),
            kind_tag(AssetKind::ItemSet),
            kind_tag(AssetKind::Native),
        ];
        assert_ne!(tags[0], tags[1]);
        assert_ne!(tags[1], tags[2]);
        assert_ne!(tags[0], tags[2]);
    }
}
