use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;

/// Kind of value an attribute definition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    Text,
    Number,
    Select,
    Multiselect,
    Boolean,
    Date,
}

text_enum!(AttributeType, UnknownAttributeType, "attribute type", {
    Text => "text",
    Number => "number",
    Select => "select",
    Multiselect => "multiselect",
    Boolean => "boolean",
    Date => "date",
});

impl AttributeType {
    /// Check a raw value against this type before it is stored.
    ///
    /// Values are persisted as text; this is the only gate between the API
    /// and the column, so each typed variant parses the value it claims to
    /// be. Select values must come from `allowed` when the definition lists
    /// any; multiselect values are comma-separated.
    pub fn validate_value(&self, value: &str, allowed: Option<&[String]>) -> Result<(), String> {
        match self {
            AttributeType::Text => Ok(()),
            AttributeType::Number => value
                .trim()
                .parse::<rust_decimal::Decimal>()
                .map(|_| ())
                .map_err(|_| format!("'{value}' is not a number")),
            AttributeType::Boolean => match value {
                "true" | "false" => Ok(()),
                _ => Err(format!("'{value}' is not a boolean (expected true or false)")),
            },
            AttributeType::Date => {
                if chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
                    || chrono::DateTime::parse_from_rfc3339(value).is_ok()
                {
                    Ok(())
                } else {
                    Err(format!("'{value}' is not a date (expected YYYY-MM-DD or RFC 3339)"))
                }
            }
            AttributeType::Select => check_allowed(value, allowed),
            AttributeType::Multiselect => {
                let tokens: Vec<&str> = value.split(',').map(str::trim).collect();
                if tokens.iter().any(|t| t.is_empty()) {
                    return Err("multiselect value contains an empty entry".to_string());
                }
                for token in tokens {
                    check_allowed(token, allowed)?;
                }
                Ok(())
            }
        }
    }
}

fn check_allowed(value: &str, allowed: Option<&[String]>) -> Result<(), String> {
    match allowed {
        Some(values) if !values.iter().any(|v| v == value) => {
            Err(format!("'{value}' is not among the allowed values"))
        }
        _ => Ok(()),
    }
}

/// Attribute definition (shared across products).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attribute {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub attribute_type: AttributeType,
    pub unit: Option<String>,
    pub allowed_values: Option<Json<Vec<String>>>,
    pub is_required: bool,
    pub is_filterable: bool,
    pub is_searchable: bool,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product's value for one attribute.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductAttribute {
    pub id: Uuid,
    pub product_id: Uuid,
    pub attribute_id: Uuid,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product attribute value joined with its definition, for API output.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductAttributeValue {
    pub id: Uuid,
    pub attribute_id: Uuid,
    pub code: String,
    pub name: String,
    pub attribute_type: AttributeType,
    pub unit: Option<String>,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_attribute_types_and_rejects_unknown() {
        assert_eq!("text".parse::<AttributeType>().unwrap(), AttributeType::Text);
        assert_eq!(
            "multiselect".parse::<AttributeType>().unwrap(),
            AttributeType::Multiselect
        );
        assert!("color".parse::<AttributeType>().is_err());
    }

    #[test]
    fn number_values_must_parse() {
        assert!(AttributeType::Number.validate_value("42", None).is_ok());
        assert!(AttributeType::Number.validate_value("3.14", None).is_ok());
        assert!(AttributeType::Number.validate_value("-0.5", None).is_ok());
        assert!(AttributeType::Number.validate_value("abc", None).is_err());
        assert!(AttributeType::Number.validate_value("", None).is_err());
    }

    #[test]
    fn boolean_values_are_strict() {
        assert!(AttributeType::Boolean.validate_value("true", None).is_ok());
        assert!(AttributeType::Boolean.validate_value("false", None).is_ok());
        assert!(AttributeType::Boolean.validate_value("yes", None).is_err());
        assert!(AttributeType::Boolean.validate_value("True", None).is_err());
    }

    #[test]
    fn date_values_accept_plain_dates_and_rfc3339() {
        assert!(AttributeType::Date.validate_value("2024-06-01", None).is_ok());
        assert!(AttributeType::Date
            .validate_value("2024-06-01T10:30:00+02:00", None)
            .is_ok());
        assert!(AttributeType::Date.validate_value("June 1st", None).is_err());
    }

    #[test]
    fn select_values_must_be_allowed() {
        let allowed = vec!["red".to_string(), "green".to_string()];
        assert!(AttributeType::Select
            .validate_value("red", Some(&allowed))
            .is_ok());
        assert!(AttributeType::Select
            .validate_value("blue", Some(&allowed))
            .is_err());
        // No allowed list configured: any value passes
        assert!(AttributeType::Select.validate_value("blue", None).is_ok());
    }

    #[test]
    fn multiselect_values_are_comma_separated_and_all_checked() {
        let allowed = vec!["s".to_string(), "m".to_string(), "l".to_string()];
        assert!(AttributeType::Multiselect
            .validate_value("s,m", Some(&allowed))
            .is_ok());
        assert!(AttributeType::Multiselect
            .validate_value("s, l", Some(&allowed))
            .is_ok());
        assert!(AttributeType::Multiselect
            .validate_value("s,xl", Some(&allowed))
            .is_err());
        assert!(AttributeType::Multiselect
            .validate_value("s,,m", Some(&allowed))
            .is_err());
    }
}
