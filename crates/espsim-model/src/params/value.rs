//! Parameter value type.
//!
//! Capability parameters arrive from JSON or YAML with no schema attached, so they
//! are held as a dynamic [`ParamValue`] until the validator reads them against the
//! capability's schema.

use serde::{Deserialize, Serialize};

// ============================================================================
// Parameter Value Enum
// ============================================================================

/// The value a capability parameter can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value (i64).
    Integer(i64),
    /// Floating point value. Never valid for any schema, kept so the validator
    /// can name the parameter instead of failing the whole request.
    Float(f64),
    /// String value.
    String(String),
    /// List value.
    List(Vec<ParamValue>),
    /// Null value; treated as "not supplied".
    Null,
}

impl ParamValue {
    /// Convert to i64 if possible.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Convert to bool if possible.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to list if possible.
    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(v) => Some(v),
            _ => None,
        }
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Short name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Integer(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::String(_) => "string",
            ParamValue::List(_) => "list",
            ParamValue::Null => "null",
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Integer(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::String(v) => write!(f, "{}", v),
            ParamValue::List(v) => {
                let strs: Vec<String> = v.iter().map(|pv| pv.to_string()).collect();
                write!(f, "[{}]", strs.join(", "))
            }
            ParamValue::Null => write!(f, "null"),
        }
    }
}

// ============================================================================
// From implementations for ParamValue
// ============================================================================

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(v: Vec<T>) -> Self {
        ParamValue::List(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_deserialize() {
        let values: Vec<ParamValue> =
            serde_json::from_str(r#"[1, true, "x", 1.5, ["/", "/a"], null]"#).unwrap();
        assert_eq!(values[0], ParamValue::Integer(1));
        assert_eq!(values[1], ParamValue::Bool(true));
        assert_eq!(values[2], ParamValue::String("x".into()));
        assert_eq!(values[3], ParamValue::Float(1.5));
        assert_eq!(values[4], ParamValue::from(vec!["/", "/a"]));
        assert!(values[5].is_null());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(ParamValue::Integer(7).as_i64(), Some(7));
        assert_eq!(ParamValue::String("7".into()).as_i64(), None);
        assert_eq!(ParamValue::Bool(false).as_bool(), Some(false));
        assert_eq!(ParamValue::Float(2.0).type_name(), "float");
        assert_eq!(ParamValue::from(vec!["/"]).to_string(), "[/]");
    }
}
