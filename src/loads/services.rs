use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{ContactInput, LoadFields, PendingLoadsQuery},
    repo_types::{Contact, Equipment, Load, LoadFilter, LoadStatus, NewLoad},
};
use crate::{
    auth::repo_types::Role, dates::parse_instant, error::ApiError, money, store::MarketStore,
};

const NOT_FOUND_OR_UNAUTHORIZED: &str = "Load not found or unauthorized.";

/// Checks every field and reports all problems in one message.
pub fn validate(shipper_id: Uuid, fields: LoadFields) -> Result<NewLoad, ApiError> {
    let mut missing: Vec<&str> = Vec::new();
    let mut invalid: Vec<String> = Vec::new();

    fn required<T>(value: Option<T>, name: &'static str, missing: &mut Vec<&str>) -> Option<T> {
        if value.is_none() {
            missing.push(name);
        }
        value
    }

    let origin = required(fields.origin, "origin", &mut missing);
    let destination = required(fields.destination, "destination", &mut missing);
    let payment = required(fields.payment, "payment", &mut missing);
    let load_length = required(fields.load_length, "loadLength", &mut missing);
    let load_weight = required(fields.load_weight, "loadWeight", &mut missing);
    let equipment = required(fields.equipment, "equipment", &mut missing);
    let pickup_from = required(fields.pickup_from, "pickupFrom", &mut missing);
    let pickup_to = required(fields.pickup_to, "pickupTo", &mut missing);
    let ContactInput { name, phone, email } = fields.contact.unwrap_or_default();
    let contact_name = required(name, "contact.name", &mut missing);
    let contact_phone = required(phone, "contact.phone", &mut missing);
    let contact_email = required(email, "contact.email", &mut missing);

    if payment.is_some_and(|p| p <= Decimal::ZERO) {
        invalid.push("payment must be greater than 0".into());
    }
    if let Some(reason) = payment.and_then(money::out_of_range) {
        invalid.push(format!("payment {reason}"));
    }
    if load_length.is_some_and(|v| v <= 0.0) {
        invalid.push("loadLength must be greater than 0".into());
    }
    if load_weight.is_some_and(|v| v <= 0.0) {
        invalid.push("loadWeight must be greater than 0".into());
    }
    if fields.distance.is_some_and(|v| v < 0.0) {
        invalid.push("distance must not be negative".into());
    }
    let equipment = match equipment.as_deref().map(str::parse::<Equipment>) {
        Some(Ok(e)) => Some(e),
        Some(Err(_)) => {
            let allowed: Vec<&str> = Equipment::ALL.iter().map(|e| e.as_str()).collect();
            invalid.push(format!("equipment must be one of {}", allowed.join(", ")));
            None
        }
        None => None,
    };
    if let (Some(from), Some(to)) = (pickup_from, pickup_to) {
        if from > to {
            invalid.push("pickupFrom must not be after pickupTo".into());
        }
    }

    let mut problems = Vec::new();
    if !missing.is_empty() {
        problems.push(format!("missing {}", missing.join(", ")));
    }
    problems.extend(invalid);

    match (
        origin,
        destination,
        payment,
        load_length,
        load_weight,
        equipment,
        pickup_from,
        pickup_to,
        contact_name,
        contact_phone,
        contact_email,
    ) {
        (
            Some(origin),
            Some(destination),
            Some(payment),
            Some(load_length),
            Some(load_weight),
            Some(equipment),
            Some(pickup_from),
            Some(pickup_to),
            Some(name),
            Some(phone),
            Some(email),
        ) if problems.is_empty() => Ok(NewLoad {
            shipper_id,
            origin,
            destination,
            payment,
            load_length,
            load_weight,
            equipment,
            pickup_from,
            pickup_to,
            distance: fields.distance,
            commodity: fields.commodity,
            additional_info: fields.additional_info,
            contact: Contact { name, phone, email },
        }),
        _ => Err(ApiError::validation(format!(
            "Invalid load: {}",
            problems.join("; ")
        ))),
    }
}

/// Overlays `patch` on the editable fields of `load`. Absent or blank patch
/// fields keep the current value.
fn merge(load: &Load, patch: LoadFields) -> LoadFields {
    let contact = patch.contact.unwrap_or_default();
    LoadFields {
        origin: patch.origin.or_else(|| Some(load.origin.clone())),
        destination: patch.destination.or_else(|| Some(load.destination.clone())),
        payment: patch.payment.or(Some(load.payment)),
        load_length: patch.load_length.or(Some(load.load_length)),
        load_weight: patch.load_weight.or(Some(load.load_weight)),
        equipment: patch
            .equipment
            .or_else(|| Some(load.equipment.as_str().to_string())),
        pickup_from: patch.pickup_from.or(Some(load.pickup_from)),
        pickup_to: patch.pickup_to.or(Some(load.pickup_to)),
        distance: patch.distance.or(load.distance),
        commodity: patch.commodity.or_else(|| load.commodity.clone()),
        additional_info: patch
            .additional_info
            .or_else(|| load.additional_info.clone()),
        contact: Some(ContactInput {
            name: contact.name.or_else(|| Some(load.contact.name.clone())),
            phone: contact.phone.or_else(|| Some(load.contact.phone.clone())),
            email: contact.email.or_else(|| Some(load.contact.email.clone())),
        }),
    }
}

pub fn build_filter(q: PendingLoadsQuery) -> Result<LoadFilter, ApiError> {
    fn text(v: Option<String>) -> Option<String> {
        v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    }
    fn instant(v: Option<String>, name: &str) -> Result<Option<time::OffsetDateTime>, ApiError> {
        text(v)
            .map(|s| {
                parse_instant(&s).ok_or_else(|| ApiError::validation(format!("Invalid {name}: {s}")))
            })
            .transpose()
    }

    Ok(LoadFilter {
        origin: text(q.origin),
        destination: text(q.destination),
        equipment: text(q.equipment)
            .map(|s| s.parse::<Equipment>())
            .transpose()
            .map_err(ApiError::Validation)?,
        pickup_from: instant(q.pickup_from, "pickupFrom")?,
        pickup_to: instant(q.pickup_to, "pickupTo")?,
    })
}

pub async fn create_load(
    store: &dyn MarketStore,
    shipper_id: Uuid,
    fields: LoadFields,
) -> Result<Load, ApiError> {
    match store.find_account(shipper_id).await? {
        Some(a) if a.role == Role::Shipper => {}
        _ => {
            warn!(%shipper_id, "load posted by a non-shipper");
            return Err(ApiError::forbidden("Only shippers can post loads."));
        }
    }

    let new_load = validate(shipper_id, fields)?;
    let load = store.insert_load(new_load).await?;
    info!(load_id = %load.id, %shipper_id, "load created");
    Ok(load)
}

pub async fn list_by_shipper(
    store: &dyn MarketStore,
    shipper_id: Uuid,
) -> Result<Vec<Load>, ApiError> {
    Ok(store.loads_by_shipper(shipper_id).await?)
}

pub async fn list_pending(
    store: &dyn MarketStore,
    filter: &LoadFilter,
) -> Result<Vec<Load>, ApiError> {
    Ok(store.pending_loads(filter).await?)
}

/// The load if it exists and belongs to `shipper_id`; both failures look the same.
pub async fn owned_load(
    store: &dyn MarketStore,
    shipper_id: Uuid,
    load_id: Uuid,
) -> Result<Load, ApiError> {
    match store.find_load(load_id).await? {
        Some(load) if load.shipper_id == shipper_id => Ok(load),
        _ => Err(ApiError::not_found(NOT_FOUND_OR_UNAUTHORIZED)),
    }
}

pub async fn update(
    store: &dyn MarketStore,
    shipper_id: Uuid,
    load_id: Uuid,
    patch: LoadFields,
) -> Result<Load, ApiError> {
    let current = owned_load(store, shipper_id, load_id).await?;
    if current.status != LoadStatus::Pending {
        warn!(%load_id, status = ?current.status, "edit of non-pending load refused");
        return Err(ApiError::validation("Only pending loads can be edited."));
    }

    let valid = validate(shipper_id, merge(&current, patch))?;
    let edited = Load {
        origin: valid.origin,
        destination: valid.destination,
        payment: valid.payment,
        load_length: valid.load_length,
        load_weight: valid.load_weight,
        equipment: valid.equipment,
        pickup_from: valid.pickup_from,
        pickup_to: valid.pickup_to,
        distance: valid.distance,
        commodity: valid.commodity,
        additional_info: valid.additional_info,
        contact: valid.contact,
        ..current
    };

    let saved = store
        .update_pending_load(&edited)
        .await?
        .ok_or_else(|| ApiError::validation("Only pending loads can be edited."))?;
    info!(%load_id, "load updated");
    Ok(saved)
}

pub async fn delete(
    store: &dyn MarketStore,
    shipper_id: Uuid,
    load_id: Uuid,
) -> Result<Load, ApiError> {
    let current = owned_load(store, shipper_id, load_id).await?;
    if current.status != LoadStatus::Pending {
        warn!(%load_id, status = ?current.status, "delete of non-pending load refused");
        return Err(ApiError::validation("Only pending loads can be deleted."));
    }

    let removed = store
        .delete_pending_load(shipper_id, load_id)
        .await?
        .ok_or_else(|| ApiError::validation("Only pending loads can be deleted."))?;
    info!(%load_id, "load deleted");
    Ok(removed)
}

/// Books a pending load for `trucker_id`, settling every offer on it in the
/// same atomic step.
pub async fn transition_to_booked(
    store: &dyn MarketStore,
    load_id: Uuid,
    trucker_id: Uuid,
) -> Result<Load, ApiError> {
    let load = store
        .find_load(load_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Load not found"))?;
    if load.status != LoadStatus::Pending {
        return Err(ApiError::validation("Load is no longer pending."));
    }

    match store.book_load(load_id, trucker_id).await? {
        Some(booked) => {
            info!(%load_id, %trucker_id, "load booked");
            Ok(booked)
        }
        None if store.find_offer(load_id, trucker_id).await?.is_none() => {
            Err(ApiError::not_found("No bid found from this trucker"))
        }
        None => Err(ApiError::validation("Load is no longer pending.")),
    }
}
