//! Best-effort coercion of scalar wire values

use super::{FloatWidth, IntWidth, PropertyType};
use crate::error::{BindError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

/// Coerce a raw wire value into the canonical form of `target`.
///
/// `null` always converts to `null`. The descriptor setter turns it into
/// `None` for optional properties and into the property's default otherwise.
pub fn convert_scalar(raw: &Value, target: &PropertyType) -> Result<Value> {
    let converted = match target {
        PropertyType::Nullable(inner) => {
            if raw.is_null() {
                return Ok(Value::Null);
            }
            return convert_scalar(raw, inner);
        }
        PropertyType::Structured => return Ok(raw.clone()),
        _ if raw.is_null() => return Ok(Value::Null),
        PropertyType::Bool => to_bool(raw),
        PropertyType::Int(width) => to_int(raw, *width),
        PropertyType::Float(width) => to_float(raw, *width),
        PropertyType::String => to_string(raw),
        PropertyType::Enum(variants) => to_enum(raw, variants),
        PropertyType::Date => to_date(raw),
        PropertyType::DateTime => to_datetime(raw),
    };

    converted.ok_or_else(|| BindError::conversion(raw, target.name()))
}

fn to_bool(raw: &Value) -> Option<Value> {
    match raw {
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|f| Value::Bool(f != 0.0)),
        _ => None,
    }
}

fn to_int(raw: &Value, width: IntWidth) -> Option<Value> {
    let n: i128 = match raw {
        Value::Number(n) => number_as_i128(n)?,
        Value::String(s) => s.trim().parse::<i128>().ok()?,
        Value::Bool(b) => i128::from(*b),
        _ => return None,
    };

    let (min, max) = width.bounds();
    if n < min || n > max {
        return None;
    }

    if n < 0 {
        Some(Value::from(n as i64))
    } else {
        Some(Value::from(n as u64))
    }
}

fn number_as_i128(n: &Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        return Some(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(i128::from(u));
    }
    // Floats are accepted only when they carry no fractional part
    let f = n.as_f64()?;
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    Some(f as i128)
}

fn to_float(raw: &Value, width: FloatWidth) -> Option<Value> {
    let f = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !f.is_finite() || f.abs() > width.max() {
        return None;
    }
    Number::from_f64(f).map(Value::Number)
}

fn to_string(raw: &Value) -> Option<Value> {
    match raw {
        Value::String(s) => Some(Value::String(s.clone())),
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn to_enum(raw: &Value, variants: &[&str]) -> Option<Value> {
    let variant = match raw {
        Value::String(s) => {
            let s = s.trim();
            variants.iter().find(|v| v.eq_ignore_ascii_case(s))?
        }
        Value::Number(n) => variants.get(usize::try_from(n.as_u64()?).ok()?)?,
        _ => return None,
    };
    Some(Value::String(variant.to_string()))
}

fn to_date(raw: &Value) -> Option<Value> {
    let Value::String(s) = raw else {
        return None;
    };
    let s = s.trim();

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))?;

    Some(Value::String(date.format("%Y-%m-%d").to_string()))
}

fn to_datetime(raw: &Value) -> Option<Value> {
    let parsed: DateTime<Utc> = match raw {
        Value::String(s) => parse_datetime(s.trim())?,
        Value::Number(n) => DateTime::from_timestamp(n.as_i64()?, 0)?,
        _ => return None,
    };
    Some(Value::String(parsed.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less timestamps are taken as UTC
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn int(width: IntWidth) -> PropertyType {
        PropertyType::Int(width)
    }

    #[test]
    fn test_int_from_number_and_string() {
        assert_eq!(convert_scalar(&json!(9), &int(IntWidth::I32)).unwrap(), json!(9));
        assert_eq!(convert_scalar(&json!("9"), &int(IntWidth::I32)).unwrap(), json!(9));
        assert_eq!(convert_scalar(&json!(" -4 "), &int(IntWidth::I8)).unwrap(), json!(-4));
        assert_eq!(convert_scalar(&json!(3.0), &int(IntWidth::U8)).unwrap(), json!(3));
    }

    #[test]
    fn test_int_narrowing_rejects_out_of_range() {
        let err = convert_scalar(&json!(300), &int(IntWidth::U8)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TypeConversionFailed);
        assert!(err.to_string().contains("u8"));

        assert!(convert_scalar(&json!(-1), &int(IntWidth::U64)).is_err());
        assert!(convert_scalar(&json!(1.5), &int(IntWidth::I64)).is_err());
        assert!(convert_scalar(&json!("nine"), &int(IntWidth::I64)).is_err());
    }

    #[test]
    fn test_bool_and_float() {
        assert_eq!(convert_scalar(&json!("TRUE"), &PropertyType::Bool).unwrap(), json!(true));
        assert_eq!(convert_scalar(&json!(0), &PropertyType::Bool).unwrap(), json!(false));
        assert_eq!(
            convert_scalar(&json!("2.5"), &PropertyType::Float(FloatWidth::F32)).unwrap(),
            json!(2.5)
        );
        assert!(convert_scalar(&json!("yes"), &PropertyType::Bool).is_err());
    }

    #[test]
    fn test_string_accepts_scalars() {
        assert_eq!(convert_scalar(&json!(42), &PropertyType::String).unwrap(), json!("42"));
        assert_eq!(convert_scalar(&json!(false), &PropertyType::String).unwrap(), json!("false"));
    }

    #[test]
    fn test_enum_by_name_and_index() {
        let status = PropertyType::Enum(&["Draft", "Published"]);
        assert_eq!(convert_scalar(&json!("published"), &status).unwrap(), json!("Published"));
        assert_eq!(convert_scalar(&json!(0), &status).unwrap(), json!("Draft"));
        assert!(convert_scalar(&json!("archived"), &status).is_err());
        assert!(convert_scalar(&json!(2), &status).is_err());
    }

    #[test]
    fn test_dates() {
        assert_eq!(
            convert_scalar(&json!("2024-03-01"), &PropertyType::Date).unwrap(),
            json!("2024-03-01")
        );
        assert_eq!(
            convert_scalar(&json!("2024-03-01T10:00:00+02:00"), &PropertyType::Date).unwrap(),
            json!("2024-03-01")
        );
        assert_eq!(
            convert_scalar(&json!("2024-03-01T10:00:00+02:00"), &PropertyType::DateTime).unwrap(),
            json!("2024-03-01T08:00:00Z")
        );
        assert_eq!(
            convert_scalar(&json!("2024-03-01"), &PropertyType::DateTime).unwrap(),
            json!("2024-03-01T00:00:00Z")
        );
        assert_eq!(
            convert_scalar(&json!(0), &PropertyType::DateTime).unwrap(),
            json!("1970-01-01T00:00:00Z")
        );
        assert!(convert_scalar(&json!("03/01/2024"), &PropertyType::Date).is_err());
    }

    #[test]
    fn test_null_handling() {
        let nullable = PropertyType::nullable(int(IntWidth::I32));
        assert_eq!(convert_scalar(&Value::Null, &nullable).unwrap(), Value::Null);
        assert_eq!(convert_scalar(&json!("7"), &nullable).unwrap(), json!(7));
        assert_eq!(
            convert_scalar(&Value::Null, &PropertyType::Structured).unwrap(),
            Value::Null
        );
        assert_eq!(convert_scalar(&Value::Null, &int(IntWidth::I32)).unwrap(), Value::Null);
        assert_eq!(convert_scalar(&Value::Null, &PropertyType::String).unwrap(), Value::Null);
    }

    #[test]
    fn test_float_narrowing_rejects_out_of_range() {
        let single = PropertyType::Float(FloatWidth::F32);
        let err = convert_scalar(&json!(1e300), &single).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TypeConversionFailed);
        assert!(err.to_string().contains("f32"));
        assert!(convert_scalar(&json!("-1e39"), &single).is_err());

        let double = PropertyType::Float(FloatWidth::F64);
        assert_eq!(convert_scalar(&json!(1e300), &double).unwrap(), json!(1e300));
        assert!(convert_scalar(&json!("inf"), &double).is_err());
    }
}
