use tracing::warn;
use uuid::Uuid;

use crate::{error::ApiError, loads, loads::repo_types::Load, store::MarketStore};

/// Awards a load to one of its bidders.
///
/// The load is booked for `trucker_id`, whose offer becomes accepted while
/// every other offer on the load is rejected. All of it commits or none does.
pub async fn select_trucker(
    store: &dyn MarketStore,
    load_id: Uuid,
    trucker_id: Uuid,
) -> Result<Load, ApiError> {
    if store.find_load(load_id).await?.is_none() {
        return Err(ApiError::not_found("Load not found"));
    }
    if store.find_offer(load_id, trucker_id).await?.is_none() {
        warn!(%load_id, %trucker_id, "selected trucker has no offer");
        return Err(ApiError::not_found("No bid found from this trucker"));
    }

    loads::services::transition_to_booked(store, load_id, trucker_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::EligibilityRules,
        loads::repo_types::LoadStatus,
        offers::{
            repo_types::OfferStatus,
            services::{
                place_offer,
                tests::{clean_record, posted_load, trucker},
            },
        },
        store::MemoryStore,
    };
    use rust_decimal::Decimal;
    use time::macros::date;

    async fn three_bids(store: &MemoryStore) -> (Uuid, [Uuid; 3]) {
        let (_, load) = posted_load(store).await;
        let mut truckers = [Uuid::nil(); 3];
        for (i, price) in [900, 750, 820].into_iter().enumerate() {
            let t = trucker(store, &format!("t{i}@road.io"), clean_record()).await;
            place_offer(
                store,
                &EligibilityRules::default(),
                date!(2026 - 10 - 16),
                t,
                load,
                Decimal::from(price),
            )
            .await
            .unwrap();
            truckers[i] = t;
        }
        (load, truckers)
    }

    async fn offer_status(store: &MemoryStore, load_id: Uuid, trucker_id: Uuid) -> OfferStatus {
        store
            .find_offer(load_id, trucker_id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn selection_books_load_and_settles_every_offer() {
        let store = MemoryStore::new();
        let (load_id, [a, b, c]) = three_bids(&store).await;

        let booked = select_trucker(&store, load_id, b).await.unwrap();
        assert_eq!(booked.status, LoadStatus::Booked);
        assert_eq!(booked.trucker_id, Some(b));

        let stored = store.find_load(load_id).await.unwrap().unwrap();
        assert_eq!(stored, booked);

        assert_eq!(offer_status(&store, load_id, b).await, OfferStatus::Accepted);
        assert_eq!(offer_status(&store, load_id, a).await, OfferStatus::Rejected);
        assert_eq!(offer_status(&store, load_id, c).await, OfferStatus::Rejected);
    }

    #[tokio::test]
    async fn missing_load_or_offer_is_not_found() {
        let store = MemoryStore::new();
        let (load_id, [a, ..]) = three_bids(&store).await;

        let err = select_trucker(&store, Uuid::new_v4(), a).await.unwrap_err();
        assert_eq!(err.to_string(), "Load not found");

        let stranger = trucker(&store, "late@road.io", clean_record()).await;
        let err = select_trucker(&store, load_id, stranger).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let load = store.find_load(load_id).await.unwrap().unwrap();
        assert_eq!(load.status, LoadStatus::Pending);
        assert_eq!(offer_status(&store, load_id, a).await, OfferStatus::Pending);
    }

    #[tokio::test]
    async fn second_selection_is_refused() {
        let store = MemoryStore::new();
        let (load_id, [a, b, _]) = three_bids(&store).await;

        select_trucker(&store, load_id, a).await.unwrap();
        let err = select_trucker(&store, load_id, b).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let load = store.find_load(load_id).await.unwrap().unwrap();
        assert_eq!(load.trucker_id, Some(a));
        assert_eq!(offer_status(&store, load_id, b).await, OfferStatus::Rejected);
    }
}
