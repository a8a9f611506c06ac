use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Load;
use crate::form;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ContactInput {
    #[serde(deserialize_with = "form::opt_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "form::opt_text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "form::opt_text")]
    pub email: Option<String>,
}

/// Load fields as posted by the shipper form. Every field is optional here so
/// that validation can report all problems at once; a `status` sent by the
/// client is ignored.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadFields {
    #[serde(deserialize_with = "form::opt_text")]
    pub origin: Option<String>,
    #[serde(deserialize_with = "form::opt_text")]
    pub destination: Option<String>,
    #[serde(deserialize_with = "form::opt_decimal")]
    pub payment: Option<Decimal>,
    #[serde(deserialize_with = "form::opt_f64")]
    pub load_length: Option<f64>,
    #[serde(deserialize_with = "form::opt_f64")]
    pub load_weight: Option<f64>,
    #[serde(deserialize_with = "form::opt_text")]
    pub equipment: Option<String>,
    #[serde(deserialize_with = "form::opt_instant")]
    pub pickup_from: Option<OffsetDateTime>,
    #[serde(deserialize_with = "form::opt_instant")]
    pub pickup_to: Option<OffsetDateTime>,
    #[serde(deserialize_with = "form::opt_f64")]
    pub distance: Option<f64>,
    #[serde(deserialize_with = "form::opt_text")]
    pub commodity: Option<String>,
    #[serde(deserialize_with = "form::opt_text")]
    pub additional_info: Option<String>,
    pub contact: Option<ContactInput>,
}

/// Body of `POST /api/addload`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoadRequest {
    pub shipper_id: Option<Uuid>,
    #[serde(flatten)]
    pub fields: LoadFields,
}

/// Query string of `GET /api/pendingloads`; values are parsed by the handler.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingLoadsQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub pickup_from: Option<String>,
    pub pickup_to: Option<String>,
    pub equipment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeletedLoadResponse {
    pub message: &'static str,
    pub load: Load,
}
