//! Lenient deserializers for values posted by HTML forms, where numbers and
//! dates arrive as strings and an untouched field arrives as `""`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{de::Error, Deserialize, Deserializer};
use time::OffsetDateTime;

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Num(serde_json::Number),
    Str(String),
}

/// `None` for null, missing or blank; otherwise the trimmed text of the value.
fn raw_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Raw>::deserialize(d)? {
        None => None,
        Some(Raw::Num(n)) => Some(n.to_string()),
        Some(Raw::Str(s)) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
    })
}

pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    raw_text(d)?
        .map(|s| {
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| D::Error::custom(format!("invalid number: {s}")))
        })
        .transpose()
}

pub fn opt_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
    raw_text(d)?
        .map(|s| {
            Decimal::from_str(&s)
                .or_else(|_| Decimal::from_scientific(&s))
                .map_err(|_| D::Error::custom(format!("invalid amount: {s}")))
        })
        .transpose()
}

pub fn opt_instant<'de, D: Deserializer<'de>>(d: D) -> Result<Option<OffsetDateTime>, D::Error> {
    raw_text(d)?
        .map(|s| {
            crate::dates::parse_instant(&s)
                .ok_or_else(|| D::Error::custom(format!("invalid date or timestamp: {s}")))
        })
        .transpose()
}

/// Blank strings become `None`.
pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    raw_text(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[derive(Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "opt_decimal")]
        payment: Option<Decimal>,
        #[serde(default, deserialize_with = "opt_f64")]
        length: Option<f64>,
        #[serde(default, deserialize_with = "opt_instant")]
        from: Option<OffsetDateTime>,
        #[serde(default, deserialize_with = "opt_text")]
        note: Option<String>,
    }

    #[test]
    fn accepts_strings_numbers_and_blanks() {
        let f: Form = serde_json::from_str(
            r#"{"payment": "1500.50", "length": 53, "from": "2025-06-01", "note": "  "}"#,
        )
        .unwrap();
        assert_eq!(f.payment, Some(Decimal::new(150050, 2)));
        assert_eq!(f.length, Some(53.0));
        assert_eq!(f.from, Some(datetime!(2025-06-01 0:00 UTC)));
        assert_eq!(f.note, None);

        let f: Form = serde_json::from_str(r#"{"payment": 900, "length": ""}"#).unwrap();
        assert_eq!(f.payment, Some(Decimal::from(900)));
        assert_eq!(f.length, None);
        assert_eq!(f.from, None);
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Form>(r#"{"payment": "lots"}"#).is_err());
        assert!(serde_json::from_str::<Form>(r#"{"from": "soon"}"#).is_err());
    }
}
