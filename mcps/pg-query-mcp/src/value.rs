//! Conversion of PostgreSQL text output into typed row values
//!
//! Statements run through the simple query protocol, so every value arrives
//! in PostgreSQL's text format. The column type from the prepared statement
//! decides how that text is interpreted.

use tokio_postgres::types::Type;

use crate::types::SqlValue;

/// Convert one column value in text format to a typed value
pub fn from_text(ty: &Type, raw: Option<&str>) -> SqlValue {
    let Some(raw) = raw else {
        return SqlValue::Null;
    };

    match ty.name() {
        "bool" => match raw {
            "t" => SqlValue::Bool(true),
            "f" => SqlValue::Bool(false),
            other => SqlValue::Text(other.to_string()),
        },
        "int2" | "int4" | "int8" | "oid" => raw
            .parse::<i64>()
            .map(SqlValue::Int)
            .unwrap_or_else(|_| SqlValue::Text(raw.to_string())),
        "float4" | "float8" | "numeric" => parse_float(raw),
        "json" | "jsonb" => serde_json::from_str(raw)
            .map(SqlValue::Json)
            .unwrap_or_else(|_| SqlValue::Text(raw.to_string())),
        _ => SqlValue::Text(raw.to_string()),
    }
}

// NaN and Infinity have no JSON number form.
fn parse_float(raw: &str) -> SqlValue {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => SqlValue::Float(value),
        _ => SqlValue::Text(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_for_any_type() {
        assert_eq!(from_text(&Type::INT4, None), SqlValue::Null);
        assert_eq!(from_text(&Type::TEXT, None), SqlValue::Null);
    }

    #[test]
    fn test_booleans() {
        assert_eq!(from_text(&Type::BOOL, Some("t")), SqlValue::Bool(true));
        assert_eq!(from_text(&Type::BOOL, Some("f")), SqlValue::Bool(false));
    }

    #[test]
    fn test_integers() {
        assert_eq!(from_text(&Type::INT2, Some("-7")), SqlValue::Int(-7));
        assert_eq!(
            from_text(&Type::INT8, Some("9223372036854775807")),
            SqlValue::Int(i64::MAX)
        );
    }

    #[test]
    fn test_numeric_and_floats() {
        assert_eq!(from_text(&Type::NUMERIC, Some("12.50")), SqlValue::Float(12.5));
        assert_eq!(from_text(&Type::FLOAT8, Some("0.25")), SqlValue::Float(0.25));
        assert_eq!(
            from_text(&Type::FLOAT8, Some("NaN")),
            SqlValue::Text("NaN".to_string())
        );
        assert_eq!(
            from_text(&Type::FLOAT4, Some("Infinity")),
            SqlValue::Text("Infinity".to_string())
        );
    }

    #[test]
    fn test_json_parsed() {
        let value = from_text(&Type::JSONB, Some(r#"{"tags": ["a", "b"]}"#));
        assert_eq!(
            value,
            SqlValue::Json(serde_json::json!({ "tags": ["a", "b"] }))
        );
    }

    #[test]
    fn test_other_types_kept_as_text() {
        assert_eq!(
            from_text(&Type::TIMESTAMPTZ, Some("2024-01-02 03:04:05+00")),
            SqlValue::Text("2024-01-02 03:04:05+00".to_string())
        );
        assert_eq!(
            from_text(&Type::UUID, Some("6f1c6b4e-8b6e-4c43-9d3c-0d4f5b7a9e21")),
            SqlValue::Text("6f1c6b4e-8b6e-4c43-9d3c-0d4f5b7a9e21".to_string())
        );
    }
}
