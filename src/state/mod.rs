//! Ledger State Module
//!
//! Read-only access to the mirrored ledger (accounts, trustlines, offers,
//! data entries and the latest header). Two backends are provided: an
//! in-memory mirror and the SQLite core database. Validation never writes
//! through this interface; intra-transaction effects live in [`StateOverlay`].

mod memory;
mod overlay;
mod sqlite;

pub use memory::MemoryLedger;
pub use overlay::{Effect, PendingFlow, StateOverlay};
pub use sqlite::SqliteLedger;

use crate::error::StoreError;
use crate::types::{AccountEntry, AccountId, Asset, DataEntry, LedgerHeader, OfferEntry, TrustLineEntry};
use async_trait::async_trait;

/// Query interface over the current ledger state.
#[async_trait]
pub trait LedgerState: Send + Sync {
    /// Header of the latest closed ledger.
    async fn ledger_header(&self) -> Result<LedgerHeader, StoreError>;

    async fn account(&self, id: &AccountId) -> Result<Option<AccountEntry>, StoreError>;

    /// Trustline of `account` for a credit `asset`. Always `None` for native.
    async fn trustline(
        &self,
        account: &AccountId,
        asset: &Asset,
    ) -> Result<Option<TrustLineEntry>, StoreError>;

    async fn offer(&self, offer_id: u64) -> Result<Option<OfferEntry>, StoreError>;

    async fn data(&self, account: &AccountId, name: &str) -> Result<Option<DataEntry>, StoreError>;
}
