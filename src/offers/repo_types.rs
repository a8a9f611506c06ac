use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "offer_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: Uuid,
    pub load_id: Uuid,
    pub trucker_id: Uuid,
    pub price: Decimal,
    pub status: OfferStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Public contact fields of the trucker behind an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruckerContact {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: String,
}

/// An offer joined with its trucker, as shown to the shipper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedOffer {
    #[serde(flatten)]
    pub offer: Offer,
    pub trucker: TruckerContact,
}

/// Row of `offers JOIN accounts`.
#[derive(Debug, FromRow)]
pub struct RankedOfferRow {
    pub id: Uuid,
    pub load_id: Uuid,
    pub trucker_id: Uuid,
    pub price: Decimal,
    pub status: OfferStatus,
    pub created_at: OffsetDateTime,
    pub trucker_name: String,
    pub trucker_phone: Option<String>,
    pub trucker_email: String,
}

impl From<RankedOfferRow> for RankedOffer {
    fn from(r: RankedOfferRow) -> Self {
        Self {
            trucker: TruckerContact {
                id: r.trucker_id,
                name: r.trucker_name,
                phone: r.trucker_phone,
                email: r.trucker_email,
            },
            offer: Offer {
                id: r.id,
                load_id: r.load_id,
                trucker_id: r.trucker_id,
                price: r.price,
                status: r.status,
                created_at: r.created_at,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    pub load_id: Uuid,
    pub trucker_id: Uuid,
    pub price: Decimal,
}
