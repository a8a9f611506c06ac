//! Persistence seam shared by every module.
//!
//! Each method is a single atomic unit against the backing store; services
//! compose them but never need a lock that spans two calls.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::repo_types::{Account, EligibilityProfile, NewAccount, NewEligibility},
    loads::repo_types::{Load, LoadFilter, NewLoad},
    offers::repo_types::{NewOffer, Offer, RankedOffer},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Inserts an account and, when given, its eligibility profile in one write.
    /// Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn create_account(
        &self,
        account: NewAccount,
        eligibility: Option<NewEligibility>,
    ) -> Result<Account, StoreError>;
    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn find_eligibility(
        &self,
        trucker_id: Uuid,
    ) -> Result<Option<EligibilityProfile>, StoreError>;

    async fn insert_load(&self, load: NewLoad) -> Result<Load, StoreError>;
    async fn find_load(&self, id: Uuid) -> Result<Option<Load>, StoreError>;
    async fn loads_by_shipper(&self, shipper_id: Uuid) -> Result<Vec<Load>, StoreError>;
    async fn pending_loads(&self, filter: &LoadFilter) -> Result<Vec<Load>, StoreError>;

    /// Writes the editable fields of `load`. Returns `None` unless the stored
    /// load has the same shipper and is still pending.
    async fn update_pending_load(&self, load: &Load) -> Result<Option<Load>, StoreError>;

    /// Removes a pending load owned by `shipper_id` and rejects its offers.
    /// Returns `None` if no such load exists.
    async fn delete_pending_load(
        &self,
        shipper_id: Uuid,
        load_id: Uuid,
    ) -> Result<Option<Load>, StoreError>;

    /// Books a pending load for `trucker_id`: that trucker's offer becomes
    /// accepted and every other offer on the load rejected, all or nothing.
    /// Returns `None` if the load is not pending or the trucker has no offer on it.
    async fn book_load(&self, load_id: Uuid, trucker_id: Uuid) -> Result<Option<Load>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] if the trucker already bid on the load.
    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, StoreError>;
    async fn find_offer(&self, load_id: Uuid, trucker_id: Uuid)
        -> Result<Option<Offer>, StoreError>;
    async fn offers_for_load(&self, load_id: Uuid) -> Result<Vec<RankedOffer>, StoreError>;
}
