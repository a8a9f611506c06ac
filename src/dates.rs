use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, Month,
    OffsetDateTime,
};

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_instant(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    parse_date(raw).map(|d| d.midnight().assume_utc())
}

/// Parses a `YYYY-MM-DD` date or the date part of an RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if let Ok(d) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Some(d);
    }
    OffsetDateTime::parse(raw, &Rfc3339).ok().map(|ts| ts.date())
}

/// Collapses a year, date or timestamp to 1 January of its year.
pub fn parse_year_start(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    let year = match raw.parse::<i32>() {
        Ok(y) => y,
        Err(_) => parse_date(raw)?.year(),
    };
    Date::from_calendar_date(year, Month::January, 1).ok()
}
