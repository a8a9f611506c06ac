use lazy_static::lazy_static;
use regex::Regex;
use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::RegisterRequest,
    password::{hash_password, verify_password},
    repo_types::{Account, EligibilityProfile, NewAccount, NewEligibility, Role},
};
use crate::{
    dates::{parse_date, parse_year_start},
    error::ApiError,
    store::{MarketStore, StoreError},
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn parse_yes_no(field: &str, raw: &str) -> Result<bool, ApiError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(ApiError::validation(format!("{field} must be \"yes\" or \"no\"."))),
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Turns the raw sign-up answers into an eligibility profile. The license
/// date is collapsed to 1 January of its issue year.
pub fn parse_eligibility(req: &RegisterRequest, today: Date) -> Result<NewEligibility, ApiError> {
    let accidents = non_blank(&req.accidents);
    let theft = non_blank(&req.theft_complaints);
    let manufactured = non_blank(&req.truck_manufacture_date);
    let licensed = non_blank(&req.license_issue_year);

    let missing: Vec<&str> = [
        ("accidents", accidents.is_none()),
        ("theftComplaints", theft.is_none()),
        ("truckManufactureDate", manufactured.is_none()),
        ("licenseIssueYear", licensed.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();
    let (Some(accidents), Some(theft), Some(manufactured), Some(licensed)) =
        (accidents, theft, manufactured, licensed)
    else {
        return Err(ApiError::validation(format!(
            "All trucker details are required: {}",
            missing.join(", ")
        )));
    };

    let truck_manufacture_date = parse_date(manufactured)
        .ok_or_else(|| ApiError::validation("Invalid truck manufacture date."))?;
    if truck_manufacture_date > today {
        return Err(ApiError::validation(
            "Truck manufacture date cannot be in the future.",
        ));
    }

    let license_issue_date = parse_year_start(licensed)
        .ok_or_else(|| ApiError::validation("Invalid license issue year format."))?;
    if license_issue_date.year() > today.year() {
        return Err(ApiError::validation(
            "License issue year cannot be in the future.",
        ));
    }

    Ok(NewEligibility {
        has_accident_history: parse_yes_no("accidents", accidents)?,
        has_theft_complaint_history: parse_yes_no("theftComplaints", theft)?,
        truck_manufacture_date,
        license_issue_date,
        notes: non_blank(&req.other_criteria).map(str::to_string),
    })
}

/// Creates an account; truckers get their eligibility profile in the same write.
pub async fn register(
    store: &dyn MarketStore,
    mut req: RegisterRequest,
    today: Date,
) -> Result<Account, ApiError> {
    req.email = normalize_email(&req.email);

    let missing: Vec<&str> = [
        ("name", req.name.trim().is_empty()),
        ("email", req.email.is_empty()),
        ("password", req.password.is_empty()),
        ("role", req.role.trim().is_empty()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();
    if !missing.is_empty() {
        return Err(ApiError::validation(format!(
            "All fields are required: {}",
            missing.join(", ")
        )));
    }

    if !is_valid_email(&req.email) {
        warn!(email = %req.email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let role: Role = req.role.parse().map_err(ApiError::Validation)?;

    let eligibility = match role {
        Role::Trucker => Some(parse_eligibility(&req, today)?),
        Role::Shipper | Role::Admin => None,
    };

    if store.find_account_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ApiError::validation("User already exists"));
    }

    let password_hash = hash_password(&req.password)?;
    let account = NewAccount {
        name: req.name.trim().to_string(),
        email: req.email,
        phone: non_blank(&req.phone).map(str::to_string),
        password_hash,
        role,
    };

    let account = match store.create_account(account, eligibility).await {
        Ok(a) => a,
        Err(StoreError::Duplicate(_)) => return Err(ApiError::validation("User already exists")),
        Err(e) => return Err(e.into()),
    };

    info!(account_id = %account.id, role = ?account.role, "account registered");
    Ok(account)
}

/// Verifies credentials against the stored argon2 hash.
pub async fn authenticate(
    store: &dyn MarketStore,
    email: &str,
    password: &str,
) -> Result<Account, ApiError> {
    let email = normalize_email(email);
    let invalid = || ApiError::Auth("Invalid credentials".into());

    let Some(account) = store.find_account_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(invalid());
    };

    if !verify_password(password, &account.password_hash)? {
        warn!(account_id = %account.id, "login invalid password");
        return Err(invalid());
    }

    info!(account_id = %account.id, "account logged in");
    Ok(account)
}

pub async fn get_eligibility(
    store: &dyn MarketStore,
    trucker_id: Uuid,
) -> Result<EligibilityProfile, ApiError> {
    store
        .find_eligibility(trucker_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Trucker eligibility details not found."))
}
