//! Request body validation
//!
//! Turns an untyped JSON body into a typed input record using lenient
//! coercion: integer fields accept integral floats and numeric strings,
//! float fields accept any number or numeric string. Every offending field
//! is reported, not just the first. Unknown keys are ignored.

use crate::error::{FieldError, ValidationError};
use crate::models::{FeatureVector, FieldKind, FieldSpec, FieldValue, FEATURE_COUNT};
use serde_json::{json, Number, Value};

const MSG_MISSING: &str = "Field required";
const MSG_INT_TYPE: &str = "Input should be a valid integer";
const MSG_INT_FROM_FLOAT: &str = "Input should be a valid integer, got a number with a fractional part";
const MSG_INT_PARSING: &str = "Input should be a valid integer, unable to parse string as an integer";
const MSG_INT_SIZE: &str = "Unable to parse input string as an integer, exceeded maximum size";
const MSG_FLOAT_TYPE: &str = "Input should be a valid number";
const MSG_FLOAT_PARSING: &str = "Input should be a valid number, unable to parse string as a number";
const MSG_NOT_OBJECT: &str = "Input should be a valid dictionary or object to extract fields from";

/// Upper bound (exclusive) of floats that convert to i64 without overflow
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// A fixed-shape input record with a pinned field order
pub trait InputSchema: Sized + Send + Sync + 'static {
    /// Fields in training column order
    const FIELDS: [FieldSpec; FEATURE_COUNT];

    /// Build the record from values already coerced to each field's kind,
    /// positioned as in [`InputSchema::FIELDS`]
    fn from_values(values: [FieldValue; FEATURE_COUNT]) -> Self;

    /// Feature vector in training column order
    fn assemble(&self) -> FeatureVector;
}

/// Decode a raw request body into JSON.
///
/// An empty body counts as a missing body.
pub fn parse_body(bytes: &[u8]) -> Result<Value, ValidationError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::single(FieldError::at_body(
            "missing",
            MSG_MISSING,
            Value::Null,
        )));
    }

    serde_json::from_slice(bytes).map_err(|e| {
        let offset = byte_offset(bytes, e.line(), e.column());
        ValidationError::single(FieldError {
            kind: "json_invalid",
            loc: vec![Value::from("body"), Value::from(offset)],
            msg: "JSON decode error".to_string(),
            input: json!({}),
            ctx: Some(json!({ "error": e.to_string() })),
        })
    })
}

/// Whether a `Content-Type` announces JSON: `application/json` or
/// `application/*+json`. A missing or blank header counts as JSON.
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    let media = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if media.is_empty() {
        return true;
    }

    match media.split_once('/') {
        Some(("application", subtype)) => subtype == "json" || subtype.ends_with("+json"),
        _ => false,
    }
}

/// Decode a request body according to its content type. Bodies sent as
/// anything but JSON are never decoded and fail as a non-object.
pub fn decode_body(content_type: Option<&str>, bytes: &[u8]) -> Result<Value, ValidationError> {
    if is_json_content_type(content_type) {
        return parse_body(bytes);
    }

    if bytes.is_empty() {
        return Err(ValidationError::single(FieldError::at_body(
            "missing",
            MSG_MISSING,
            Value::Null,
        )));
    }

    Err(ValidationError::single(FieldError::at_body(
        "model_attributes_type",
        MSG_NOT_OBJECT,
        Value::from(String::from_utf8_lossy(bytes).into_owned()),
    )))
}

/// Validate a JSON body against a schema
pub fn validate<S: InputSchema>(body: &Value) -> Result<S, ValidationError> {
    let Some(object) = body.as_object() else {
        return Err(ValidationError::single(FieldError::at_body(
            "model_attributes_type",
            MSG_NOT_OBJECT,
            body.clone(),
        )));
    };

    let mut errors = Vec::new();
    let mut values = [FieldValue::Float(0.0); FEATURE_COUNT];

    for (slot, spec) in values.iter_mut().zip(S::FIELDS.iter()) {
        match object.get(spec.name) {
            None => errors.push(FieldError::at_field(
                spec.name,
                "missing",
                MSG_MISSING,
                body.clone(),
            )),
            Some(raw) => match coerce(spec.kind, raw) {
                Ok(value) => *slot = value,
                Err((kind, msg)) => {
                    errors.push(FieldError::at_field(spec.name, kind, msg, raw.clone()))
                }
            },
        }
    }

    if errors.is_empty() {
        Ok(S::from_values(values))
    } else {
        Err(ValidationError { detail: errors })
    }
}

/// Validate and assemble in one step
pub fn parse_features<S: InputSchema>(body: &Value) -> Result<FeatureVector, ValidationError> {
    validate::<S>(body).map(|record| record.assemble())
}

type Coerced = Result<FieldValue, (&'static str, &'static str)>;

fn coerce(kind: FieldKind, raw: &Value) -> Coerced {
    match kind {
        FieldKind::Int => coerce_int(raw),
        FieldKind::Float => coerce_float(raw),
    }
}

fn coerce_int(raw: &Value) -> Coerced {
    match raw {
        Value::Number(n) => int_from_number(n),
        Value::Bool(b) => Ok(FieldValue::Int(i64::from(*b))),
        Value::String(s) => int_from_str(s.trim()),
        _ => Err(("int_type", MSG_INT_TYPE)),
    }
}

fn int_from_number(n: &Number) -> Coerced {
    if let Some(v) = n.as_i64() {
        return Ok(FieldValue::Int(v));
    }
    if n.is_u64() {
        return Err(("int_parsing_size", MSG_INT_SIZE));
    }
    match n.as_f64() {
        Some(f) => int_from_f64(f),
        None => Err(("int_type", MSG_INT_TYPE)),
    }
}

fn int_from_f64(f: f64) -> Coerced {
    if !f.is_finite() {
        return Err(("finite_number", "Input should be a finite number"));
    }
    if f.fract() != 0.0 {
        return Err(("int_from_float", MSG_INT_FROM_FLOAT));
    }
    if f < -I64_UPPER || f >= I64_UPPER {
        return Err(("int_parsing_size", MSG_INT_SIZE));
    }
    Ok(FieldValue::Int(f as i64))
}

fn int_from_str(s: &str) -> Coerced {
    // "12.000" is accepted as 12
    let digits = match s.split_once('.') {
        Some((whole, frac)) if !whole.is_empty() && frac.bytes().all(|b| b == b'0') => whole,
        _ => s,
    };

    match digits.parse::<i64>() {
        Ok(v) => Ok(FieldValue::Int(v)),
        Err(_) => {
            let unsigned = digits.strip_prefix(&['-', '+'][..]).unwrap_or(digits);
            if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
                Err(("int_parsing_size", MSG_INT_SIZE))
            } else {
                Err(("int_parsing", MSG_INT_PARSING))
            }
        }
    }
}

fn coerce_float(raw: &Value) -> Coerced {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .map(FieldValue::Float)
            .ok_or(("float_type", MSG_FLOAT_TYPE)),
        Value::Bool(b) => Ok(FieldValue::Float(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|_| ("float_parsing", MSG_FLOAT_PARSING)),
        _ => Err(("float_type", MSG_FLOAT_TYPE)),
    }
}

/// Byte offset of a 1-based (line, column) position reported by the decoder
fn byte_offset(bytes: &[u8], line: usize, column: usize) -> usize {
    let line_start: usize = bytes
        .split(|b| *b == b'\n')
        .take(line.saturating_sub(1))
        .map(|l| l.len() + 1)
        .sum();
    (line_start + column.saturating_sub(1)).min(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EfficiencyInput, ImpactInput};

    fn impact_body() -> Value {
        json!({
            "Material_Type": 1,
            "Energy_Manufacturing": 1000.0,
            "Plant_Size": 10.0,
            "Capacity_Factor": 50.0,
            "Lifespan": 20.0
        })
    }

    fn with_field(field: &str, value: Value) -> Value {
        let mut body = impact_body();
        body.as_object_mut().unwrap().insert(field.to_string(), value);
        body
    }

    fn error_kinds(err: &ValidationError) -> Vec<(&str, &str)> {
        err.detail
            .iter()
            .map(|e| (e.field().unwrap_or("<body>"), e.kind))
            .collect()
    }

    #[test]
    fn test_valid_impact_body() {
        let record: ImpactInput = validate(&impact_body()).unwrap();
        assert_eq!(record.material_type, 1);
        assert_eq!(record.energy_manufacturing, 1000.0);
        assert_eq!(record.lifespan, 20.0);
    }

    #[test]
    fn test_integers_accepted_for_float_fields() {
        let body = json!({
            "Cumulative_Energy_Demand": 100,
            "EROI": 10,
            "Net_Energy_Output": 50,
            "Raw_Material_Consumption": 30,
            "Recyclability_Waste_Generation": 1
        });
        let record: EfficiencyInput = validate(&body).unwrap();
        assert_eq!(record.cumulative_energy_demand, 100.0);
        assert_eq!(record.recyclability_waste_generation, 1.0);
    }

    #[test]
    fn test_fractional_material_type_rejected() {
        let err = validate::<ImpactInput>(&with_field("Material_Type", json!(1.5))).unwrap_err();
        assert_eq!(error_kinds(&err), vec![("Material_Type", "int_from_float")]);
        assert_eq!(err.detail[0].input, json!(1.5));
        assert_eq!(err.detail[0].loc, vec![json!("body"), json!("Material_Type")]);
    }

    #[test]
    fn test_material_type_coercions_accepted() {
        for raw in [json!(1), json!("1"), json!(" 1 "), json!(1.0), json!("1.0"), json!(true)] {
            let record: ImpactInput = validate(&with_field("Material_Type", raw.clone()))
                .unwrap_or_else(|e| panic!("{raw} rejected: {e:?}"));
            assert_eq!(record.material_type, 1, "input {raw}");
        }
    }

    #[test]
    fn test_material_type_bad_strings_rejected() {
        let err = validate::<ImpactInput>(&with_field("Material_Type", json!("1.5"))).unwrap_err();
        assert_eq!(error_kinds(&err), vec![("Material_Type", "int_parsing")]);

        let err = validate::<ImpactInput>(&with_field("Material_Type", json!("steel"))).unwrap_err();
        assert_eq!(error_kinds(&err), vec![("Material_Type", "int_parsing")]);

        let err = validate::<ImpactInput>(&with_field("Material_Type", json!("99999999999999999999")))
            .unwrap_err();
        assert_eq!(error_kinds(&err), vec![("Material_Type", "int_parsing_size")]);
    }

    #[test]
    fn test_material_type_out_of_range_number() {
        let err = validate::<ImpactInput>(&with_field("Material_Type", json!(u64::MAX))).unwrap_err();
        assert_eq!(error_kinds(&err), vec![("Material_Type", "int_parsing_size")]);

        let err = validate::<ImpactInput>(&with_field("Material_Type", json!(1e300))).unwrap_err();
        assert_eq!(error_kinds(&err), vec![("Material_Type", "int_parsing_size")]);
    }

    #[test]
    fn test_numeric_strings_accepted_for_float_fields() {
        let record: ImpactInput = validate(&with_field("Plant_Size", json!(" 12.5 "))).unwrap();
        assert_eq!(record.plant_size, 12.5);

        let record: ImpactInput = validate(&with_field("Plant_Size", json!("1e3"))).unwrap();
        assert_eq!(record.plant_size, 1000.0);
    }

    #[test]
    fn test_non_numeric_float_rejected() {
        let err = validate::<ImpactInput>(&with_field("Plant_Size", json!("large"))).unwrap_err();
        assert_eq!(error_kinds(&err), vec![("Plant_Size", "float_parsing")]);

        let err = validate::<ImpactInput>(&with_field("Plant_Size", Value::Null)).unwrap_err();
        assert_eq!(error_kinds(&err), vec![("Plant_Size", "float_type")]);

        let err = validate::<ImpactInput>(&with_field("Plant_Size", json!([1.0]))).unwrap_err();
        assert_eq!(error_kinds(&err), vec![("Plant_Size", "float_type")]);
    }

    #[test]
    fn test_every_offending_field_reported_in_field_order() {
        let body = json!({
            "Lifespan": "forever",
            "Material_Type": 2.5,
            "Plant_Size": 10.0
        });
        let err = validate::<ImpactInput>(&body).unwrap_err();
        assert_eq!(
            error_kinds(&err),
            vec![
                ("Material_Type", "int_from_float"),
                ("Energy_Manufacturing", "missing"),
                ("Capacity_Factor", "missing"),
                ("Lifespan", "float_parsing"),
            ]
        );
    }

    #[test]
    fn test_missing_field_reports_whole_body_as_input() {
        let mut body = impact_body();
        body.as_object_mut().unwrap().remove("Lifespan");
        let err = validate::<ImpactInput>(&body).unwrap_err();
        assert_eq!(err.detail.len(), 1);
        assert_eq!(err.detail[0].kind, "missing");
        assert_eq!(err.detail[0].msg, "Field required");
        assert_eq!(err.detail[0].input, body);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let body = with_field("Region", json!("EU"));
        assert!(validate::<ImpactInput>(&body).is_ok());
    }

    #[test]
    fn test_non_object_body_rejected() {
        let err = validate::<ImpactInput>(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.detail.len(), 1);
        assert_eq!(err.detail[0].kind, "model_attributes_type");
        assert_eq!(err.detail[0].loc, vec![json!("body")]);
    }

    #[test]
    fn test_json_content_types() {
        assert!(is_json_content_type(None));
        assert!(is_json_content_type(Some("")));
        assert!(is_json_content_type(Some("application/json")));
        assert!(is_json_content_type(Some("Application/JSON; charset=utf-8")));
        assert!(is_json_content_type(Some("application/merge-patch+json")));
        assert!(!is_json_content_type(Some("text/plain")));
        assert!(!is_json_content_type(Some("application/x-www-form-urlencoded")));
        assert!(!is_json_content_type(Some("text/json")));
    }

    #[test]
    fn test_decode_body_ignores_non_json_payload() {
        let raw = br#"{"Material_Type": 1}"#;

        assert!(decode_body(Some("application/json"), raw).is_ok());

        let err = decode_body(Some("text/plain"), raw).unwrap_err();
        assert_eq!(err.detail[0].kind, "model_attributes_type");
        assert_eq!(err.detail[0].loc, vec![json!("body")]);
        assert_eq!(err.detail[0].input, json!(r#"{"Material_Type": 1}"#));

        let err = decode_body(Some("text/plain"), b"").unwrap_err();
        assert_eq!(err.detail[0].kind, "missing");
    }

    #[test]
    fn test_parse_body_empty_is_missing() {
        let err = parse_body(b"  ").unwrap_err();
        assert_eq!(err.detail[0].kind, "missing");
        assert_eq!(err.detail[0].loc, vec![json!("body")]);
    }

    #[test]
    fn test_parse_body_invalid_json() {
        let err = parse_body(b"{\"Material_Type\": }").unwrap_err();
        let first = &err.detail[0];
        assert_eq!(first.kind, "json_invalid");
        assert_eq!(first.loc[0], json!("body"));
        assert!(first.loc[1].is_u64());
        assert!(first.ctx.is_some());
    }

    #[test]
    fn test_parse_features_assembles() {
        let features = parse_features::<ImpactInput>(&impact_body()).unwrap();
        assert_eq!(features, [1.0, 1000.0, 10.0, 50.0, 20.0]);
    }

    #[test]
    fn test_byte_offset() {
        let text = b"{\n  \"a\": x\n}";
        assert_eq!(byte_offset(text, 2, 8), 9);
        assert_eq!(byte_offset(text, 1, 1), 0);
        assert_eq!(byte_offset(text, 10, 10), text.len());
    }
}
