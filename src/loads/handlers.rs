use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateLoadRequest, DeletedLoadResponse, LoadFields, PendingLoadsQuery},
    repo_types::Load,
    services,
};
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/pendingloads", get(list_pending))
        .route("/myloads/:shipper_id", get(list_my_loads))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/addload", post(create_load))
        .route("/myloads/:shipper_id/editload/:load_id", put(edit_load))
        .route("/myloads/:shipper_id/deleteload/:load_id", delete(delete_load))
}

fn not_owner() -> ApiError {
    ApiError::not_found("Load not found or unauthorized.")
}

#[instrument(skip(state, body))]
pub async fn create_load(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(body): ApiJson<CreateLoadRequest>,
) -> Result<(StatusCode, Json<Load>), ApiError> {
    let shipper_id = body.shipper_id.unwrap_or(caller);
    if shipper_id != caller {
        warn!(%caller, %shipper_id, "load posted on behalf of another account");
        return Err(ApiError::forbidden("You can only post loads as yourself."));
    }
    let load = services::create_load(state.store.as_ref(), shipper_id, body.fields).await?;
    Ok((StatusCode::CREATED, Json(load)))
}

#[instrument(skip(state))]
pub async fn list_my_loads(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(shipper_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Load>>, ApiError> {
    if shipper_id != caller {
        return Err(ApiError::forbidden("You can only view your own loads."));
    }
    let loads = services::list_by_shipper(state.store.as_ref(), shipper_id).await?;
    Ok(Json(loads))
}

#[instrument(skip(state, patch))]
pub async fn edit_load(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath((shipper_id, load_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(patch): ApiJson<LoadFields>,
) -> Result<Json<Load>, ApiError> {
    if shipper_id != caller {
        return Err(not_owner());
    }
    let load = services::update(state.store.as_ref(), shipper_id, load_id, patch).await?;
    Ok(Json(load))
}

#[instrument(skip(state))]
pub async fn delete_load(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath((shipper_id, load_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<DeletedLoadResponse>, ApiError> {
    if shipper_id != caller {
        return Err(not_owner());
    }
    let load = services::delete(state.store.as_ref(), shipper_id, load_id).await?;
    Ok(Json(DeletedLoadResponse {
        message: "Load deleted successfully.",
        load,
    }))
}

#[instrument(skip(state))]
pub async fn list_pending(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<PendingLoadsQuery>,
) -> Result<Json<Vec<Load>>, ApiError> {
    let filter = services::build_filter(q)?;
    let loads = services::list_pending(state.store.as_ref(), &filter).await?;
    Ok(Json(loads))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::FromRequest, http::header::CONTENT_TYPE, http::Request};
    use crate::{auth::repo_types::Role, loads::services::tests::fields};

    async fn shipper(state: &AppState, email: &str) -> Uuid {
        state
            .store
            .create_account(
                crate::auth::repo_types::NewAccount {
                    name: "Acme".into(),
                    email: email.into(),
                    phone: None,
                    password_hash: "x".into(),
                    role: Role::Shipper,
                },
                None,
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn create_and_list_own_loads() {
        let state = AppState::fake();
        let me = shipper(&state, "me@acme.io").await;

        let (status, Json(load)) = create_load(
            State(state.clone()),
            AuthUser(me),
            ApiJson(CreateLoadRequest {
                shipper_id: Some(me),
                fields: fields(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(mine) = list_my_loads(State(state.clone()), AuthUser(me), ApiPath(me))
            .await
            .unwrap();
        assert_eq!(mine, vec![load]);

        let err = list_my_loads(State(state), AuthUser(Uuid::new_v4()), ApiPath(me))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn cannot_post_for_someone_else() {
        let state = AppState::fake();
        let me = shipper(&state, "me@acme.io").await;
        let other = shipper(&state, "other@acme.io").await;

        let err = create_load(
            State(state),
            AuthUser(me),
            ApiJson(CreateLoadRequest {
                shipper_id: Some(other),
                fields: fields(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn edit_and_delete_collapse_foreign_access_to_not_found() {
        let state = AppState::fake();
        let me = shipper(&state, "me@acme.io").await;
        let (_, Json(load)) = create_load(
            State(state.clone()),
            AuthUser(me),
            ApiJson(CreateLoadRequest {
                shipper_id: None,
                fields: fields(),
            }),
        )
        .await
        .unwrap();
        let intruder = shipper(&state, "x@evil.io").await;

        let err = edit_load(
            State(state.clone()),
            AuthUser(intruder),
            ApiPath((me, load.id)),
            ApiJson(LoadFields::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = delete_load(State(state.clone()), AuthUser(intruder), ApiPath((intruder, load.id)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let Json(deleted) = delete_load(State(state.clone()), AuthUser(me), ApiPath((me, load.id)))
            .await
            .unwrap();
        assert_eq!(deleted.load.id, load.id);
        let Json(mine) = list_my_loads(State(state), AuthUser(me), ApiPath(me)).await.unwrap();
        assert!(mine.is_empty());
    }

    #[tokio::test]
    async fn create_load_parses_form_payload() {
        let state = AppState::fake();
        let me = shipper(&state, "me@acme.io").await;
        let body: CreateLoadRequest = serde_json::from_value(serde_json::json!({
            "shipperId": me,
            "origin": "Reno, NV",
            "destination": "Boise, ID",
            "payment": "2400",
            "loadLength": "53",
            "loadWeight": "38000",
            "equipment": "Flatbed",
            "pickupFrom": "2025-06-01T00:00:00.000Z",
            "pickupTo": "2025-06-03T00:00:00.000Z",
            "distance": "",
            "contact": { "name": "Yard", "phone": "555-0199", "email": "yard@acme.io" },
            "status": "booked"
        }))
        .unwrap();

        let (_, Json(load)) = create_load(State(state), AuthUser(me), ApiJson(body))
            .await
            .unwrap();
        assert_eq!(load.status, crate::loads::repo_types::LoadStatus::Pending);
        assert_eq!(load.distance, None);

        let json = serde_json::to_value(&load).unwrap();
        assert_eq!(json["equipment"], "Flatbed");
        assert_eq!(json["payment"], 2400.0);
        assert_eq!(json["pickupFrom"], "2025-06-01T00:00:00Z");
        assert!(json["truckerId"].is_null());
    }

    #[tokio::test]
    async fn pending_search_rejects_bad_dates() {
        let state = AppState::fake();
        let err = list_pending(
            State(state.clone()),
            ApiQuery(PendingLoadsQuery {
                pickup_from: Some("tomorrow".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let Json(none) = list_pending(State(state), ApiQuery(PendingLoadsQuery::default()))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn unreadable_payment_is_a_bad_request() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/addload")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"origin":"Reno, NV","payment":"abc"}"#))
            .unwrap();
        let err = ApiJson::<CreateLoadRequest>::from_request(req, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(err.to_string().contains("invalid amount: abc"));
    }
}
