use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "load_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Pending,
    Booked,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "equipment_kind")]
pub enum Equipment {
    Flatbed,
    Reefer,
    #[sqlx(rename = "Dry Van")]
    #[serde(rename = "Dry Van")]
    DryVan,
    #[sqlx(rename = "Step Deck")]
    #[serde(rename = "Step Deck")]
    StepDeck,
}

impl Equipment {
    pub const ALL: [Equipment; 4] = [Self::Flatbed, Self::Reefer, Self::DryVan, Self::StepDeck];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flatbed => "Flatbed",
            Self::Reefer => "Reefer",
            Self::DryVan => "Dry Van",
            Self::StepDeck => "Step Deck",
        }
    }
}

impl std::str::FromStr for Equipment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown equipment: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// A freight posting as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Load {
    pub id: Uuid,
    pub shipper_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub payment: Decimal,
    pub load_length: f64,
    pub load_weight: f64,
    pub equipment: Equipment,
    #[serde(with = "time::serde::rfc3339")]
    pub pickup_from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub pickup_to: OffsetDateTime,
    pub distance: Option<f64>,
    pub commodity: Option<String>,
    pub additional_info: Option<String>,
    pub contact: Contact,
    pub status: LoadStatus,
    /// Set exactly when the load is no longer pending.
    pub trucker_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Flat row of the `loads` table.
#[derive(Debug, FromRow)]
pub struct LoadRow {
    pub id: Uuid,
    pub shipper_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub payment: Decimal,
    pub load_length: f64,
    pub load_weight: f64,
    pub equipment: Equipment,
    pub pickup_from: OffsetDateTime,
    pub pickup_to: OffsetDateTime,
    pub distance: Option<f64>,
    pub commodity: Option<String>,
    pub additional_info: Option<String>,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub status: LoadStatus,
    pub trucker_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

impl From<LoadRow> for Load {
    fn from(r: LoadRow) -> Self {
        Self {
            id: r.id,
            shipper_id: r.shipper_id,
            origin: r.origin,
            destination: r.destination,
            payment: r.payment,
            load_length: r.load_length,
            load_weight: r.load_weight,
            equipment: r.equipment,
            pickup_from: r.pickup_from,
            pickup_to: r.pickup_to,
            distance: r.distance,
            commodity: r.commodity,
            additional_info: r.additional_info,
            contact: Contact {
                name: r.contact_name,
                phone: r.contact_phone,
                email: r.contact_email,
            },
            status: r.status,
            trucker_id: r.trucker_id,
            created_at: r.created_at,
        }
    }
}

/// Validated input for a new load; status always starts as pending.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoad {
    pub shipper_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub payment: Decimal,
    pub load_length: f64,
    pub load_weight: f64,
    pub equipment: Equipment,
    pub pickup_from: OffsetDateTime,
    pub pickup_to: OffsetDateTime,
    pub distance: Option<f64>,
    pub commodity: Option<String>,
    pub additional_info: Option<String>,
    pub contact: Contact,
}

/// Search criteria for pending loads. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct LoadFilter {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub equipment: Option<Equipment>,
    pub pickup_from: Option<OffsetDateTime>,
    pub pickup_to: Option<OffsetDateTime>,
}

impl LoadFilter {
    /// Whether `load` is pending and satisfies every criterion that is set.
    pub fn matches(&self, load: &Load) -> bool {
        fn contains_ci(haystack: &str, needle: &Option<String>) -> bool {
            match needle {
                Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
                None => true,
            }
        }

        load.status == LoadStatus::Pending
            && contains_ci(&load.origin, &self.origin)
            && contains_ci(&load.destination, &self.destination)
            && self.equipment.map_or(true, |e| e == load.equipment)
            && self.pickup_from.map_or(true, |from| load.pickup_from >= from)
            && self.pickup_to.map_or(true, |to| load.pickup_to <= to)
    }
}
