use rust_decimal::Decimal;
use serde::Deserialize;

use crate::form;

/// Body of `POST /api/makeoffer/:trucker_id/:load_id`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MakeOfferRequest {
    #[serde(deserialize_with = "form::opt_decimal")]
    pub offer_price: Option<Decimal>,
}
