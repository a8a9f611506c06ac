use axum::{extract::State, routing::put, Json, Router};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::services;
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::ApiJson,
    loads,
    loads::repo_types::Load,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/offer/select", put(select_trucker))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectTruckerRequest {
    pub load_id: Option<Uuid>,
    pub trucker_id: Option<Uuid>,
}

#[instrument(skip(state))]
pub async fn select_trucker(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(body): ApiJson<SelectTruckerRequest>,
) -> Result<Json<Load>, ApiError> {
    let (Some(load_id), Some(trucker_id)) = (body.load_id, body.trucker_id) else {
        return Err(ApiError::validation("Load ID and Trucker ID are required."));
    };
    loads::services::owned_load(state.store.as_ref(), caller, load_id).await?;
    let load = services::select_trucker(state.store.as_ref(), load_id, trucker_id).await?;
    Ok(Json(load))
}
