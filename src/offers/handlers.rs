use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::MakeOfferRequest,
    repo_types::{Offer, RankedOffer},
    services,
};
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    loads,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/makeoffer/:trucker_id/:load_id", post(make_offer))
        .route("/offers/:load_id", get(list_offers))
}

#[instrument(skip(state, body))]
pub async fn make_offer(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath((trucker_id, load_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<MakeOfferRequest>,
) -> Result<(StatusCode, Json<Offer>), ApiError> {
    if trucker_id != caller {
        warn!(%caller, %trucker_id, "offer placed on behalf of another account");
        return Err(ApiError::forbidden("You can only place offers as yourself."));
    }
    let price = body
        .offer_price
        .ok_or_else(|| ApiError::validation("Offer price is required."))?;

    let offer = services::place_offer(
        state.store.as_ref(),
        &state.config.eligibility,
        OffsetDateTime::now_utc().date(),
        trucker_id,
        load_id,
        price,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

#[instrument(skip(state))]
pub async fn list_offers(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(load_id): ApiPath<Uuid>,
) -> Result<Json<Vec<RankedOffer>>, ApiError> {
    loads::services::owned_load(state.store.as_ref(), caller, load_id).await?;
    let offers = services::list_for_load(state.store.as_ref(), load_id).await?;
    Ok(Json(offers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::repo_types::{NewAccount, NewEligibility, Role},
        loads::{repo_types::Load, services::tests::fields},
        offers::services::tests::clean_record,
    };
    use axum::{body::Body, extract::FromRequest, http::header::CONTENT_TYPE, http::Request};
    use rust_decimal::Decimal;

    async fn account(state: &AppState, email: &str, role: Role, record: Option<NewEligibility>) -> Uuid {
        state
            .store
            .create_account(
                NewAccount {
                    name: email.into(),
                    email: email.into(),
                    phone: None,
                    password_hash: "x".into(),
                    role,
                },
                record,
            )
            .await
            .unwrap()
            .id
    }

    async fn load_for(state: &AppState, shipper: Uuid) -> Load {
        loads::services::create_load(state.store.as_ref(), shipper, fields())
            .await
            .unwrap()
    }

    fn offer_body(raw: serde_json::Value) -> MakeOfferRequest {
        serde_json::from_value(raw).unwrap()
    }

    #[tokio::test]
    async fn make_offer_accepts_form_price() {
        let state = AppState::fake();
        let shipper = account(&state, "s@acme.io", Role::Shipper, None).await;
        let trucker = account(&state, "t@road.io", Role::Trucker, Some(clean_record())).await;
        let load = load_for(&state, shipper).await;

        let (status, Json(offer)) = make_offer(
            State(state),
            AuthUser(trucker),
            ApiPath((trucker, load.id)),
            ApiJson(offer_body(serde_json::json!({ "offerPrice": "850.50" }))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(offer.price, Decimal::new(85050, 2));
    }

    #[tokio::test]
    async fn make_offer_requires_price_and_matching_caller() {
        let state = AppState::fake();
        let shipper = account(&state, "s@acme.io", Role::Shipper, None).await;
        let trucker = account(&state, "t@road.io", Role::Trucker, Some(clean_record())).await;
        let load = load_for(&state, shipper).await;

        let err = make_offer(
            State(state.clone()),
            AuthUser(trucker),
            ApiPath((trucker, load.id)),
            ApiJson(offer_body(serde_json::json!({ "offerPrice": "" }))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = make_offer(
            State(state),
            AuthUser(shipper),
            ApiPath((trucker, load.id)),
            ApiJson(offer_body(serde_json::json!({ "offerPrice": 500 }))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn ineligible_trucker_gets_forbidden_with_reason() {
        let state = AppState::fake();
        let shipper = account(&state, "s@acme.io", Role::Shipper, None).await;
        let trucker = account(
            &state,
            "t@road.io",
            Role::Trucker,
            Some(NewEligibility {
                has_theft_complaint_history: true,
                ..clean_record()
            }),
        )
        .await;
        let load = load_for(&state, shipper).await;

        let err = make_offer(
            State(state),
            AuthUser(trucker),
            ApiPath((trucker, load.id)),
            ApiJson(offer_body(serde_json::json!({ "offerPrice": 500 }))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Trucker must have no theft complaints.");
    }

    #[tokio::test]
    async fn only_the_owner_lists_offers() {
        let state = AppState::fake();
        let shipper = account(&state, "s@acme.io", Role::Shipper, None).await;
        let trucker = account(&state, "t@road.io", Role::Trucker, Some(clean_record())).await;
        let load = load_for(&state, shipper).await;
        let (status, _) = make_offer(
            State(state.clone()),
            AuthUser(trucker),
            ApiPath((trucker, load.id)),
            ApiJson(offer_body(serde_json::json!({ "offerPrice": 700 }))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(listed) = list_offers(State(state.clone()), AuthUser(shipper), ApiPath(load.id))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);

        let err = list_offers(State(state), AuthUser(trucker), ApiPath(load.id))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unreadable_price_is_a_bad_request() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"offerPrice":"lots"}"#))
            .unwrap();
        let err = ApiJson::<MakeOfferRequest>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("invalid amount: lots"));
    }
}
