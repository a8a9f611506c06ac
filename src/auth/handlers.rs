use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{AuthResponse, LoginRequest, PublicAccount, RefreshRequest, RegisterRequest},
    jwt::{AuthUser, JwtKeys},
    repo_types::{Account, EligibilityProfile},
    services,
};
use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/truckers/:trucker_id/eligibility", get(get_eligibility))
}

fn issue_tokens(state: &AppState, account: Account) -> Result<AuthResponse, ApiError> {
    let keys = JwtKeys::from_ref(state);
    Ok(AuthResponse {
        access_token: keys.sign_access(account.id)?,
        refresh_token: keys.sign_refresh(account.id)?,
        account: account.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let today = OffsetDateTime::now_utc().date();
    let account = services::register(state.store.as_ref(), payload, today).await?;
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, account)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let account =
        services::authenticate(state.store.as_ref(), &payload.email, &payload.password).await?;
    Ok(Json(issue_tokens(&state, account)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Auth(e.to_string()))?;

    let account = state
        .store
        .find_account(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Auth("Account not found".into()))?;
    Ok(Json(issue_tokens(&state, account)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
) -> Result<Json<PublicAccount>, ApiError> {
    let account = state
        .store
        .find_account(account_id)
        .await?
        .ok_or_else(|| ApiError::Auth("Account not found".into()))?;
    Ok(Json(account.into()))
}

#[instrument(skip(state))]
pub async fn get_eligibility(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    ApiPath(trucker_id): ApiPath<Uuid>,
) -> Result<Json<EligibilityProfile>, ApiError> {
    let profile = services::get_eligibility(state.store.as_ref(), trucker_id).await?;
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trucker_payload() -> RegisterRequest {
        RegisterRequest {
            name: "Road Runner".into(),
            email: "rr@haul.io".into(),
            password: "s3cure-pass".into(),
            role: "trucker".into(),
            accidents: Some("no".into()),
            theft_complaints: Some("no".into()),
            truck_manufacture_date: Some("2024-01-10".into()),
            license_issue_year: Some("2010".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn register_answers_created_with_tokens() {
        let state = AppState::fake();
        let (status, Json(body)) = register(State(state.clone()), ApiJson(trucker_payload()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.account.email, "rr@haul.io");

        let keys = JwtKeys::from_ref(&state);
        assert_eq!(keys.verify(&body.access_token).unwrap().sub, body.account.id);
        assert!(keys.verify_refresh(&body.refresh_token).is_ok());

        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("accessToken"));
        assert!(!json.contains("password"));
    }

    #[tokio::test]
    async fn login_then_me_and_refresh() {
        let state = AppState::fake();
        let (status, _) = register(State(state.clone()), ApiJson(trucker_payload()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(session) = login(
            State(state.clone()),
            ApiJson(LoginRequest {
                email: "RR@haul.io".into(),
                password: "s3cure-pass".into(),
            }),
        )
        .await
        .unwrap();

        let Json(me) = get_me(State(state.clone()), AuthUser(session.account.id))
            .await
            .unwrap();
        assert_eq!(me.id, session.account.id);

        let Json(refreshed) = refresh(
            State(state.clone()),
            ApiJson(RefreshRequest {
                refresh_token: session.refresh_token.clone(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(refreshed.account.id, session.account.id);

        let err = refresh(
            State(state),
            ApiJson(RefreshRequest {
                refresh_token: session.access_token,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let state = AppState::fake();
        let (status, _) = register(State(state.clone()), ApiJson(trucker_payload()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let err = login(
            State(state),
            ApiJson(LoginRequest {
                email: "rr@haul.io".into(),
                password: "nope-nope".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn eligibility_endpoint_returns_the_profile() {
        let state = AppState::fake();
        let (_, Json(body)) = register(State(state.clone()), ApiJson(trucker_payload()))
            .await
            .unwrap();
        let id = body.account.id;

        let Json(profile) = get_eligibility(State(state.clone()), AuthUser(id), ApiPath(id))
            .await
            .unwrap();
        assert_eq!(profile.trucker_id, id);
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["licenseIssueDate"], "2010-01-01");

        let err = get_eligibility(State(state), AuthUser(id), ApiPath(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
