//! Bidding eligibility gate.
//!
//! Checks run in a fixed order and the first failure is reported: accident
//! history, theft complaints, truck age, license age. Ages are whole calendar
//! years (`current year - year of the recorded date`).

use time::Date;

use crate::{auth::repo_types::EligibilityProfile, config::EligibilityRules};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Ineligibility {
    #[error("Trucker must have no accident history.")]
    AccidentHistory,

    #[error("Trucker must have no theft complaints.")]
    TheftComplaints,

    #[error("Truck age must not be more than {max} years (truck is {age} years old).")]
    TruckTooOld { age: i32, max: i32 },

    #[error("Driver must have held a license for at least {min} years (held for {held}).")]
    LicenseTooRecent { held: i32, min: i32 },
}

pub fn check(
    profile: &EligibilityProfile,
    today: Date,
    rules: &EligibilityRules,
) -> Result<(), Ineligibility> {
    if profile.has_accident_history {
        return Err(Ineligibility::AccidentHistory);
    }
    if profile.has_theft_complaint_history {
        return Err(Ineligibility::TheftComplaints);
    }

    let truck_age = today.year() - profile.truck_manufacture_date.year();
    if truck_age > rules.max_truck_age_years {
        return Err(Ineligibility::TruckTooOld {
            age: truck_age,
            max: rules.max_truck_age_years,
        });
    }

    let license_years = today.year() - profile.license_issue_date.year();
    if license_years < rules.min_license_years {
        return Err(Ineligibility::LicenseTooRecent {
            held: license_years,
            min: rules.min_license_years,
        });
    }

    Ok(())
}
