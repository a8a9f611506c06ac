use rust_decimal::Decimal;
use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo_types::{NewOffer, Offer, RankedOffer};
use crate::{
    auth::repo_types::Role,
    config::EligibilityRules,
    error::ApiError,
    loads::repo_types::LoadStatus,
    matching::gate,
    money,
    store::{MarketStore, StoreError},
};

/// Records a bid. Checks run in order and the first failure is returned:
/// price, load, role, profile, eligibility gate, load status, price ceiling,
/// then the one-offer-per-trucker rule enforced by the store.
pub async fn place_offer(
    store: &dyn MarketStore,
    rules: &EligibilityRules,
    today: Date,
    trucker_id: Uuid,
    load_id: Uuid,
    price: Decimal,
) -> Result<Offer, ApiError> {
    if price <= Decimal::ZERO {
        return Err(ApiError::validation("Offer price must be greater than 0."));
    }
    if let Some(reason) = money::out_of_range(price) {
        return Err(ApiError::validation(format!("Offer price {reason}.")));
    }

    let load = store
        .find_load(load_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Load not found"))?;

    match store.find_account(trucker_id).await? {
        Some(a) if a.role == Role::Trucker => {}
        _ => {
            warn!(%trucker_id, %load_id, "offer from a non-trucker");
            return Err(ApiError::forbidden("Only truckers can place offers."));
        }
    }

    let profile = store.find_eligibility(trucker_id).await?.ok_or_else(|| {
        ApiError::forbidden("Trucker eligibility details not found.")
    })?;

    if let Err(reason) = gate::check(&profile, today, rules) {
        warn!(%trucker_id, %load_id, %reason, "trucker not eligible to bid");
        return Err(reason.into());
    }

    if load.status != LoadStatus::Pending {
        return Err(ApiError::validation("Load is no longer accepting offers."));
    }
    if price > load.payment {
        return Err(ApiError::validation(format!(
            "Offer price must not exceed the load payment of {}.",
            load.payment
        )));
    }

    let offer = match store
        .insert_offer(NewOffer {
            load_id,
            trucker_id,
            price,
        })
        .await
    {
        Ok(o) => o,
        Err(StoreError::Duplicate(_)) => {
            warn!(%trucker_id, %load_id, "duplicate offer");
            return Err(ApiError::validation(
                "Duplicate offer: you have already placed an offer on this load.",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    info!(offer_id = %offer.id, %trucker_id, %load_id, %price, "offer placed");
    Ok(offer)
}

/// Cheapest first; earlier offers win ties.
pub fn rank(offers: &mut [RankedOffer]) {
    offers.sort_by(|a, b| {
        a.offer
            .price
            .cmp(&b.offer.price)
            .then(a.offer.created_at.cmp(&b.offer.created_at))
            .then(a.offer.id.cmp(&b.offer.id))
    });
}

pub async fn list_for_load(
    store: &dyn MarketStore,
    load_id: Uuid,
) -> Result<Vec<RankedOffer>, ApiError> {
    if store.find_load(load_id).await?.is_none() {
        return Err(ApiError::not_found("Load not found"));
    }

    let mut offers = store.offers_for_load(load_id).await?;
    if offers.is_empty() {
        return Err(ApiError::not_found("No bids found for this load."));
    }
    rank(&mut offers);
    Ok(offers)
}
