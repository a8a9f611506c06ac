use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MarketStore, StoreError};
use crate::{
    auth::repo_types::{Account, EligibilityProfile, NewAccount, NewEligibility},
    loads::repo_types::{Load, LoadFilter, LoadStatus, NewLoad},
    offers::repo_types::{NewOffer, Offer, OfferStatus, RankedOffer, TruckerContact},
};

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    eligibility: Vec<EligibilityProfile>,
    loads: Vec<Load>,
    offers: Vec<Offer>,
}

/// Store kept in process memory. Vectors preserve insertion order; every
/// write takes the single write lock, so multi-record updates are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn create_account(
        &self,
        account: NewAccount,
        eligibility: Option<NewEligibility>,
    ) -> Result<Account, StoreError> {
        let mut t = self.tables.write().await;
        if t.accounts.iter().any(|a| a.email == account.email) {
            return Err(StoreError::Duplicate("email"));
        }
        let now = OffsetDateTime::now_utc();
        let created = Account {
            id: Uuid::new_v4(),
            name: account.name,
            email: account.email,
            phone: account.phone,
            password_hash: account.password_hash,
            role: account.role,
            created_at: now,
        };
        if let Some(e) = eligibility {
            t.eligibility.push(EligibilityProfile {
                trucker_id: created.id,
                has_accident_history: e.has_accident_history,
                has_theft_complaint_history: e.has_theft_complaint_history,
                truck_manufacture_date: e.truck_manufacture_date,
                license_issue_date: e.license_issue_date,
                notes: e.notes,
                created_at: now,
            });
        }
        t.accounts.push(created.clone());
        Ok(created)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn find_eligibility(
        &self,
        trucker_id: Uuid,
    ) -> Result<Option<EligibilityProfile>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.eligibility.iter().find(|e| e.trucker_id == trucker_id).cloned())
    }

    async fn insert_load(&self, load: NewLoad) -> Result<Load, StoreError> {
        let created = Load {
            id: Uuid::new_v4(),
            shipper_id: load.shipper_id,
            origin: load.origin,
            destination: load.destination,
            payment: load.payment,
            load_length: load.load_length,
            load_weight: load.load_weight,
            equipment: load.equipment,
            pickup_from: load.pickup_from,
            pickup_to: load.pickup_to,
            distance: load.distance,
            commodity: load.commodity,
            additional_info: load.additional_info,
            contact: load.contact,
            status: LoadStatus::Pending,
            trucker_id: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables.write().await.loads.push(created.clone());
        Ok(created)
    }

    async fn find_load(&self, id: Uuid) -> Result<Option<Load>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.loads.iter().find(|l| l.id == id).cloned())
    }

    async fn loads_by_shipper(&self, shipper_id: Uuid) -> Result<Vec<Load>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.loads
            .iter()
            .filter(|l| l.shipper_id == shipper_id)
            .cloned()
            .collect())
    }

    async fn pending_loads(&self, filter: &LoadFilter) -> Result<Vec<Load>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.loads.iter().filter(|l| filter.matches(l)).cloned().collect())
    }

    async fn update_pending_load(&self, load: &Load) -> Result<Option<Load>, StoreError> {
        let mut t = self.tables.write().await;
        let Some(stored) = t.loads.iter_mut().find(|l| {
            l.id == load.id && l.shipper_id == load.shipper_id && l.status == LoadStatus::Pending
        }) else {
            return Ok(None);
        };
        *stored = Load {
            status: LoadStatus::Pending,
            trucker_id: None,
            created_at: stored.created_at,
            ..load.clone()
        };
        Ok(Some(stored.clone()))
    }

    async fn delete_pending_load(
        &self,
        shipper_id: Uuid,
        load_id: Uuid,
    ) -> Result<Option<Load>, StoreError> {
        let mut t = self.tables.write().await;
        let Some(pos) = t.loads.iter().position(|l| {
            l.id == load_id && l.shipper_id == shipper_id && l.status == LoadStatus::Pending
        }) else {
            return Ok(None);
        };
        let removed = t.loads.remove(pos);
        for offer in t.offers.iter_mut().filter(|o| o.load_id == load_id) {
            offer.status = OfferStatus::Rejected;
        }
        Ok(Some(removed))
    }

    async fn book_load(&self, load_id: Uuid, trucker_id: Uuid) -> Result<Option<Load>, StoreError> {
        let mut t = self.tables.write().await;
        let has_offer = t
            .offers
            .iter()
            .any(|o| o.load_id == load_id && o.trucker_id == trucker_id);
        let Some(load) = t
            .loads
            .iter_mut()
            .find(|l| l.id == load_id && l.status == LoadStatus::Pending)
        else {
            return Ok(None);
        };
        if !has_offer {
            return Ok(None);
        }
        load.status = LoadStatus::Booked;
        load.trucker_id = Some(trucker_id);
        let booked = load.clone();

        for offer in t.offers.iter_mut().filter(|o| o.load_id == load_id) {
            offer.status = if offer.trucker_id == trucker_id {
                OfferStatus::Accepted
            } else {
                OfferStatus::Rejected
            };
        }
        Ok(Some(booked))
    }

    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, StoreError> {
        let mut t = self.tables.write().await;
        if t
            .offers
            .iter()
            .any(|o| o.load_id == offer.load_id && o.trucker_id == offer.trucker_id)
        {
            return Err(StoreError::Duplicate("offer"));
        }
        let created = Offer {
            id: Uuid::new_v4(),
            load_id: offer.load_id,
            trucker_id: offer.trucker_id,
            price: offer.price,
            status: OfferStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
        };
        t.offers.push(created.clone());
        Ok(created)
    }

    async fn find_offer(
        &self,
        load_id: Uuid,
        trucker_id: Uuid,
    ) -> Result<Option<Offer>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.offers
            .iter()
            .find(|o| o.load_id == load_id && o.trucker_id == trucker_id)
            .cloned())
    }

    async fn offers_for_load(&self, load_id: Uuid) -> Result<Vec<RankedOffer>, StoreError> {
        let t = self.tables.read().await;
        let ranked = t
            .offers
            .iter()
            .filter(|o| o.load_id == load_id)
            .filter_map(|o| {
                let trucker = t.accounts.iter().find(|a| a.id == o.trucker_id)?;
                Some(RankedOffer {
                    offer: o.clone(),
                    trucker: TruckerContact {
                        id: trucker.id,
                        name: trucker.name.clone(),
                        phone: trucker.phone.clone(),
                        email: trucker.email.clone(),
                    },
                })
            })
            .collect();
        Ok(ranked)
    }
}
