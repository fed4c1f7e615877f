//! Primitive EDM type codecs.
//!
//! Every primitive supports three directions:
//! - `deserialize`: wire JSON → [`EdmValue`]
//! - `serialize`: [`EdmValue`] → wire JSON
//! - `encode`: [`EdmValue`] → URL literal text
//!
//! `encode` intentionally differs from `serialize` where the URL conventions
//! do: a GUID is quoted inside a JSON body but bare in a key predicate, a
//! duration gains the `duration'...'` wrapper, binary data the `binary'...'`
//! wrapper.
//!
//! All codecs apply element-wise over JSON arrays, and a codec for an unknown
//! type name passes values through untouched so partial metadata degrades
//! gracefully instead of failing the pipeline.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::duration::EdmDuration;
use crate::errors::{EdmError, EdmResult};
use crate::value::EdmValue;

/// Known primitive wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdmType {
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    Guid,
    Date,
    TimeOfDay,
    DateTimeOffset,
    Duration,
    Binary,
}

impl EdmType {
    /// Resolve a wire type name such as `"Edm.Guid"`.
    ///
    /// Returns `None` for anything outside the primitive set; the registry
    /// treats those as structural or passthrough types.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Edm.Boolean" => EdmType::Boolean,
            "Edm.Byte" => EdmType::Byte,
            "Edm.SByte" => EdmType::SByte,
            "Edm.Int16" => EdmType::Int16,
            "Edm.Int32" => EdmType::Int32,
            "Edm.Int64" => EdmType::Int64,
            "Edm.Single" => EdmType::Single,
            "Edm.Double" => EdmType::Double,
            "Edm.Decimal" => EdmType::Decimal,
            "Edm.String" => EdmType::String,
            "Edm.Guid" => EdmType::Guid,
            "Edm.Date" => EdmType::Date,
            "Edm.TimeOfDay" => EdmType::TimeOfDay,
            "Edm.DateTimeOffset" => EdmType::DateTimeOffset,
            "Edm.Duration" => EdmType::Duration,
            "Edm.Binary" => EdmType::Binary,
            _ => return None,
        })
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EdmType::Boolean => "Edm.Boolean",
            EdmType::Byte => "Edm.Byte",
            EdmType::SByte => "Edm.SByte",
            EdmType::Int16 => "Edm.Int16",
            EdmType::Int32 => "Edm.Int32",
            EdmType::Int64 => "Edm.Int64",
            EdmType::Single => "Edm.Single",
            EdmType::Double => "Edm.Double",
            EdmType::Decimal => "Edm.Decimal",
            EdmType::String => "Edm.String",
            EdmType::Guid => "Edm.Guid",
            EdmType::Date => "Edm.Date",
            EdmType::TimeOfDay => "Edm.TimeOfDay",
            EdmType::DateTimeOffset => "Edm.DateTimeOffset",
            EdmType::Duration => "Edm.Duration",
            EdmType::Binary => "Edm.Binary",
        }
    }
}

/// Codec for one primitive field or parameter.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveCodec {
    /// `None` means the wire type is unknown here: values pass through.
    pub ty: Option<EdmType>,
    /// 64-bit numerics travel as strings to avoid JSON precision loss.
    pub ieee754_compatible: bool,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

impl PrimitiveCodec {
    #[must_use]
    pub fn new(ty: EdmType) -> Self {
        Self {
            ty: Some(ty),
            ..Self::default()
        }
    }

    /// Codec resolved from a wire type name; unknown names yield the
    /// passthrough codec.
    #[must_use]
    pub fn for_type_name(name: &str) -> Self {
        Self {
            ty: EdmType::from_name(name),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_ieee754(mut self, on: bool) -> Self {
        self.ieee754_compatible = on;
        self
    }

    #[must_use]
    pub fn with_precision(mut self, precision: Option<u32>, scale: Option<u32>) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    /// Marshal a wire JSON value into an [`EdmValue`].
    ///
    /// # Errors
    /// Returns `EdmError` when the wire value cannot be coerced to the
    /// declared primitive type.
    pub fn deserialize(&self, wire: &Json) -> EdmResult<EdmValue> {
        if let Json::Array(items) = wire {
            let out = items
                .iter()
                .map(|item| self.deserialize(item))
                .collect::<EdmResult<Vec<_>>>()?;
            return Ok(EdmValue::Collection(out));
        }
        if wire.is_null() {
            return Ok(EdmValue::Null);
        }
        let Some(ty) = self.ty else {
            return Ok(json_to_edm(wire));
        };
        match ty {
            EdmType::Boolean => match wire {
                Json::Bool(b) => Ok(EdmValue::Bool(*b)),
                other => Err(mismatch(ty, "boolean", other)),
            },
            EdmType::Byte | EdmType::SByte | EdmType::Int16 | EdmType::Int32 | EdmType::Int64 => {
                self.deserialize_integer(ty, wire)
            }
            EdmType::Single | EdmType::Double => deserialize_floating(ty, wire),
            EdmType::Decimal => self.deserialize_decimal(wire),
            EdmType::String => match wire {
                Json::String(s) => Ok(EdmValue::String(s.clone())),
                other => Ok(EdmValue::String(other.to_string())),
            },
            EdmType::Guid => match wire {
                Json::String(s) => Uuid::parse_str(s)
                    .map(EdmValue::Guid)
                    .map_err(|_| invalid(ty, s)),
                other => Err(mismatch(ty, "string", other)),
            },
            EdmType::Date => match wire {
                Json::String(s) => {
                    // A trailing time component is tolerated and truncated to
                    // UTC midnight.
                    let date_part = s.split('T').next().unwrap_or(s);
                    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                        .map(EdmValue::Date)
                        .map_err(|_| invalid(ty, s))
                }
                other => Err(mismatch(ty, "string", other)),
            },
            EdmType::TimeOfDay => match wire {
                Json::String(s) => NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                    .map(EdmValue::Time)
                    .map_err(|_| invalid(ty, s)),
                other => Err(mismatch(ty, "string", other)),
            },
            EdmType::DateTimeOffset => match wire {
                Json::String(s) => DateTime::parse_from_rfc3339(s)
                    .map(|dt| EdmValue::DateTimeOffset(dt.with_timezone(&Utc)))
                    .map_err(|_| invalid(ty, s)),
                other => Err(mismatch(ty, "string", other)),
            },
            EdmType::Duration => match wire {
                Json::String(s) => EdmDuration::parse(s).map(EdmValue::Duration),
                other => Err(mismatch(ty, "string", other)),
            },
            EdmType::Binary => match wire {
                Json::String(s) => BASE64
                    .decode(s)
                    .map(EdmValue::Binary)
                    .map_err(|_| invalid(ty, s)),
                other => Err(mismatch(ty, "string", other)),
            },
        }
    }

    /// Marshal an [`EdmValue`] back to wire JSON.
    ///
    /// # Errors
    /// Returns `EdmError` when the value does not fit the declared type.
    pub fn serialize(&self, value: &EdmValue) -> EdmResult<Json> {
        match value {
            EdmValue::Null => Ok(Json::Null),
            EdmValue::Collection(items) => {
                let out = items
                    .iter()
                    .map(|item| self.serialize(item))
                    .collect::<EdmResult<Vec<_>>>()?;
                Ok(Json::Array(out))
            }
            EdmValue::Bool(b) => Ok(Json::Bool(*b)),
            EdmValue::Int(i) => {
                if self.ieee754_compatible && matches!(self.ty, Some(EdmType::Int64)) {
                    Ok(Json::String(i.to_string()))
                } else {
                    Ok(Json::from(*i))
                }
            }
            EdmValue::Double(d) => serialize_floating(*d),
            EdmValue::Decimal(d) => self.serialize_decimal(d),
            EdmValue::String(s) => Ok(Json::String(s.clone())),
            EdmValue::Guid(g) => Ok(Json::String(g.to_string())),
            EdmValue::Date(d) => Ok(Json::String(d.format("%Y-%m-%d").to_string())),
            EdmValue::Time(t) => Ok(Json::String(t.format("%H:%M:%S%.3f").to_string())),
            EdmValue::DateTimeOffset(dt) => Ok(Json::String(
                dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            EdmValue::Duration(d) => Ok(Json::String(d.to_string())),
            EdmValue::Binary(bytes) => Ok(Json::String(BASE64.encode(bytes))),
            EdmValue::Object(_) => Err(EdmError::NotEncodable(
                "object value in primitive position".to_owned(),
            )),
        }
    }

    /// Render an [`EdmValue`] as a URL literal.
    ///
    /// # Errors
    /// Returns `EdmError::NotEncodable` for structural values.
    pub fn encode(&self, value: &EdmValue) -> EdmResult<String> {
        encode_value(value)
    }

    fn deserialize_integer(&self, ty: EdmType, wire: &Json) -> EdmResult<EdmValue> {
        let n = match wire {
            Json::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| invalid(ty, &n.to_string()))?,
            // ieee754-compatible Int64 travels as a string.
            Json::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid(ty, s))?,
            other => return Err(mismatch(ty, "number", other)),
        };
        Ok(EdmValue::Int(n))
    }

    fn deserialize_decimal(&self, wire: &Json) -> EdmResult<EdmValue> {
        let ty = EdmType::Decimal;
        let dec = match wire {
            Json::String(s) => s.parse::<BigDecimal>().map_err(|_| invalid(ty, s))?,
            Json::Number(n) => n
                .to_string()
                .parse::<BigDecimal>()
                .map_err(|_| invalid(ty, &n.to_string()))?,
            other => return Err(mismatch(ty, "number or string", other)),
        };
        Ok(EdmValue::Decimal(dec))
    }

    fn serialize_decimal(&self, dec: &BigDecimal) -> EdmResult<Json> {
        let mut out = dec.clone();
        if let Some(precision) = self.precision {
            out = out.with_prec(u64::from(precision));
        }
        if let Some(scale) = self.scale {
            out = out.with_scale_round(i64::from(scale), RoundingMode::HalfUp);
        }
        if self.ieee754_compatible {
            return Ok(Json::String(out.to_string()));
        }
        decimal_to_number(&out).map(Json::Number)
    }
}

/// Render any [`EdmValue`] as a URL literal, independent of a codec.
///
/// # Errors
/// Returns `EdmError::NotEncodable` for objects.
pub fn encode_value(value: &EdmValue) -> EdmResult<String> {
    match value {
        EdmValue::Null => Ok("null".to_owned()),
        EdmValue::Bool(b) => Ok(b.to_string()),
        EdmValue::Int(i) => Ok(i.to_string()),
        EdmValue::Double(d) => {
            if d.is_infinite() {
                Ok(if *d > 0.0 { "INF" } else { "-INF" }.to_owned())
            } else {
                Ok(d.to_string())
            }
        }
        EdmValue::Decimal(d) => Ok(d.to_string()),
        EdmValue::String(s) => Ok(escape_string_literal(s)),
        EdmValue::Guid(g) => Ok(g.to_string()),
        EdmValue::Date(d) => Ok(d.format("%Y-%m-%d").to_string()),
        EdmValue::Time(t) => Ok(t.format("%H:%M:%S%.3f").to_string()),
        EdmValue::DateTimeOffset(dt) => Ok(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        EdmValue::Duration(d) => Ok(format!("duration'{d}'")),
        EdmValue::Binary(bytes) => Ok(format!("binary'{}'", BASE64.encode(bytes))),
        EdmValue::Collection(items) => {
            let parts = items.iter().map(encode_value).collect::<EdmResult<Vec<_>>>()?;
            Ok(format!("[{}]", parts.join(",")))
        }
        EdmValue::Object(_) => Err(EdmError::NotEncodable("object".to_owned())),
    }
}

/// Quote and escape a string for use inside an OData URL.
///
/// Single quotes double per the URL conventions; the characters that break
/// query-string framing are percent-escaped.
#[must_use]
pub fn escape_string_literal(s: &str) -> String {
    let escaped = s
        .replace('%', "%25")
        .replace('\'', "''")
        .replace('+', "%2B")
        .replace('/', "%2F")
        .replace('?', "%3F")
        .replace('#', "%23")
        .replace('&', "%26");
    format!("'{escaped}'")
}

fn deserialize_floating(ty: EdmType, wire: &Json) -> EdmResult<EdmValue> {
    let f = match wire {
        Json::Number(n) => n.as_f64().ok_or_else(|| invalid(ty, &n.to_string()))?,
        Json::String(s) => match s.as_str() {
            "INF" => f64::INFINITY,
            "-INF" => f64::NEG_INFINITY,
            other => other.parse::<f64>().map_err(|_| invalid(ty, s))?,
        },
        other => return Err(mismatch(ty, "number", other)),
    };
    Ok(EdmValue::Double(f))
}

fn serialize_floating(d: f64) -> EdmResult<Json> {
    if d.is_infinite() {
        return Ok(Json::String(
            if d > 0.0 { "INF" } else { "-INF" }.to_owned(),
        ));
    }
    serde_json::Number::from_f64(d)
        .map(Json::Number)
        .ok_or_else(|| EdmError::NotEncodable(format!("non-finite double {d}")))
}

fn decimal_to_number(dec: &BigDecimal) -> EdmResult<serde_json::Number> {
    if dec.is_integer() {
        if let Some(i) = dec.to_i64() {
            return Ok(serde_json::Number::from(i));
        }
    }
    dec.to_f64()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| EdmError::NotEncodable(format!("decimal {dec}")))
}

/// Structure-preserving fallback for unknown wire types.
pub(crate) fn json_to_edm(wire: &Json) -> EdmValue {
    match wire {
        Json::Null => EdmValue::Null,
        Json::Bool(b) => EdmValue::Bool(*b),
        Json::Number(n) => n.as_i64().map_or_else(
            || EdmValue::Double(n.as_f64().unwrap_or(0.0)),
            EdmValue::Int,
        ),
        Json::String(s) => EdmValue::String(s.clone()),
        Json::Array(items) => EdmValue::Collection(items.iter().map(json_to_edm).collect()),
        Json::Object(map) => EdmValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_edm(v)))
                .collect(),
        ),
    }
}

/// Inverse of [`json_to_edm`]; used when a structural parser hands values
/// back to wire form without a declared type.
pub(crate) fn edm_to_json(value: &EdmValue) -> EdmResult<Json> {
    match value {
        EdmValue::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                out.insert(k.clone(), edm_to_json(v)?);
            }
            Ok(Json::Object(out))
        }
        EdmValue::Collection(items) => Ok(Json::Array(
            items.iter().map(edm_to_json).collect::<EdmResult<_>>()?,
        )),
        other => PrimitiveCodec::default().serialize(other),
    }
}

fn mismatch(ty: EdmType, expected: &'static str, got: &Json) -> EdmError {
    EdmError::TypeMismatch {
        type_name: ty.name().to_owned(),
        expected,
        got: got.to_string(),
    }
}

fn invalid(ty: EdmType, value: &str) -> EdmError {
    EdmError::InvalidLiteral {
        type_name: ty.name().to_owned(),
        value: value.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codec(ty: EdmType) -> PrimitiveCodec {
        PrimitiveCodec::new(ty)
    }

    #[test]
    fn guid_round_trip_and_encode() {
        let c = codec(EdmType::Guid);
        let wire = json!("01234567-89ab-cdef-0123-456789abcdef");
        let v = c.deserialize(&wire).unwrap();
        assert_eq!(c.serialize(&v).unwrap(), wire);
        // Unquoted in URLs, quoted in JSON bodies.
        assert_eq!(c.encode(&v).unwrap(), "01234567-89ab-cdef-0123-456789abcdef");
    }

    #[test]
    fn binary_round_trip() {
        let c = codec(EdmType::Binary);
        let v = c.deserialize(&json!("T0RhdGE=")).unwrap();
        assert_eq!(v, EdmValue::Binary(b"OData".to_vec()));
        assert_eq!(c.serialize(&v).unwrap(), json!("T0RhdGE="));
        assert_eq!(c.encode(&v).unwrap(), "binary'T0RhdGE='");
    }

    #[test]
    fn duration_round_trip() {
        let c = codec(EdmType::Duration);
        let wire = json!("P2Y1M1W12DT23H59M59.999999999999S");
        let v = c.deserialize(&wire).unwrap();
        assert_eq!(c.serialize(&v).unwrap(), wire);
    }

    #[test]
    fn date_truncates_to_midnight() {
        let c = codec(EdmType::Date);
        let v = c.deserialize(&json!("2024-03-05T13:37:00Z")).unwrap();
        assert_eq!(c.serialize(&v).unwrap(), json!("2024-03-05"));
    }

    #[test]
    fn time_of_day_keeps_millis() {
        let c = codec(EdmType::TimeOfDay);
        let v = c.deserialize(&json!("23:59:59.999")).unwrap();
        assert_eq!(c.serialize(&v).unwrap(), json!("23:59:59.999"));
    }

    #[test]
    fn datetimeoffset_normalizes_to_utc() {
        let c = codec(EdmType::DateTimeOffset);
        let v = c.deserialize(&json!("2024-01-01T01:00:00+01:00")).unwrap();
        assert_eq!(c.serialize(&v).unwrap(), json!("2024-01-01T00:00:00.000Z"));
    }

    #[test]
    fn double_inf_mapping() {
        let c = codec(EdmType::Double);
        let v = c.deserialize(&json!("INF")).unwrap();
        assert_eq!(v, EdmValue::Double(f64::INFINITY));
        assert_eq!(c.serialize(&v).unwrap(), json!("INF"));
        assert_eq!(c.encode(&v).unwrap(), "INF");
    }

    #[test]
    fn int64_ieee754_travels_as_string() {
        let c = codec(EdmType::Int64).with_ieee754(true);
        let v = c.deserialize(&json!("9007199254740993")).unwrap();
        assert_eq!(v, EdmValue::Int(9_007_199_254_740_993));
        assert_eq!(c.serialize(&v).unwrap(), json!("9007199254740993"));
    }

    #[test]
    fn decimal_scale_rounding() {
        let c = codec(EdmType::Decimal).with_precision(None, Some(2));
        let v = c.deserialize(&json!(3.14159)).unwrap();
        assert_eq!(c.serialize(&v).unwrap(), json!(3.14));
    }

    #[test]
    fn decimal_ieee754_string_mode() {
        let c = codec(EdmType::Decimal).with_ieee754(true);
        let v = c.deserialize(&json!("34.95")).unwrap();
        assert_eq!(c.serialize(&v).unwrap(), json!("34.95"));
    }

    #[test]
    fn arrays_map_element_wise() {
        let c = codec(EdmType::Int32);
        let v = c.deserialize(&json!([1, 2, 3])).unwrap();
        assert_eq!(
            v,
            EdmValue::Collection(vec![
                EdmValue::Int(1),
                EdmValue::Int(2),
                EdmValue::Int(3)
            ])
        );
        assert_eq!(c.serialize(&v).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn unknown_type_passes_through() {
        let c = PrimitiveCodec::for_type_name("Edm.GeographyPoint");
        let wire = json!({"type": "Point", "coordinates": [1.0, 2.0]});
        let v = c.deserialize(&wire).unwrap();
        assert_eq!(edm_to_json(&v).unwrap(), wire);
    }

    #[test]
    fn string_literal_escaping() {
        assert_eq!(escape_string_literal("O'Neil"), "'O''Neil'");
        assert_eq!(escape_string_literal("a/b?c"), "'a%2Fb%3Fc'");
        assert_eq!(escape_string_literal("50%+"), "'50%25%2B'");
    }
}
