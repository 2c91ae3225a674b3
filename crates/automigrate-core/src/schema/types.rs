use serde::{Deserialize, Serialize};

/// Portable column types. Each dialect renders its own declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    /// UUID type
    Uuid,
    /// Variable-length string with optional max length
    Varchar(Option<u32>),
    /// Unlimited text
    Text,
    /// 32-bit integer
    Integer,
    /// 64-bit integer
    BigInt,
    /// 32-bit floating point
    Real,
    /// 64-bit floating point
    DoublePrecision,
    /// Boolean
    Boolean,
    /// Timestamp with timezone
    Timestamptz,
    /// Date without time
    Date,
    /// Decimal with precision and scale
    Decimal(u8, u8),
    /// Structured JSON document
    Jsonb,
    /// Byte array
    Bytea,
}

/// Rust type of a model field, as written in schema declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RustType {
    /// String type
    String,
    /// UUID from uuid crate
    Uuid,
    /// 32-bit integer
    I32,
    /// 64-bit integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Boolean
    Bool,
    /// Chrono DateTime
    DateTime,
    /// Chrono NaiveDate
    Date,
    /// Decimal with precision and scale
    Decimal(u8, u8),
    /// serde_json::Value
    Json,
    /// Vec<u8>
    Bytes,
    /// Option wrapper
    Option(Box<RustType>),
    /// Vec wrapper, stored as a JSON document
    Vec(Box<RustType>),
}

impl RustType {
    /// Parse a Rust type string. Returns `None` for types with no column mapping.
    pub fn from_type_string(type_str: &str) -> Option<Self> {
        let ty = match type_str.trim() {
            "String" | "&str" => RustType::String,
            "Uuid" => RustType::Uuid,
            "i32" | "u32" | "i16" | "u16" | "i8" | "u8" => RustType::I32,
            "i64" | "u64" | "isize" | "usize" => RustType::I64,
            "f32" => RustType::F32,
            "f64" => RustType::F64,
            "bool" => RustType::Bool,
            "DateTime<Utc>" | "DateTime" | "Timestamp" => RustType::DateTime,
            "NaiveDate" | "Date" => RustType::Date,
            "Decimal" => RustType::Decimal(20, 8),
            "Value" | "Json" => RustType::Json,
            "Vec<u8>" => RustType::Bytes,
            s if s.starts_with("Option<") && s.ends_with('>') => {
                let inner = &s[7..s.len() - 1];
                RustType::Option(Box::new(RustType::from_type_string(inner)?))
            }
            s if s.starts_with("Vec<") && s.ends_with('>') => {
                let inner = &s[4..s.len() - 1];
                RustType::Vec(Box::new(RustType::from_type_string(inner)?))
            }
            _ => return None,
        };
        Some(ty)
    }

    /// Map to corresponding SQL type.
    pub fn to_sql_type(&self) -> SqlType {
        match self {
            RustType::String => SqlType::Varchar(None),
            RustType::Uuid => SqlType::Uuid,
            RustType::I32 => SqlType::Integer,
            RustType::I64 => SqlType::BigInt,
            RustType::F32 => SqlType::Real,
            RustType::F64 => SqlType::DoublePrecision,
            RustType::Bool => SqlType::Boolean,
            RustType::DateTime => SqlType::Timestamptz,
            RustType::Date => SqlType::Date,
            RustType::Decimal(p, s) => SqlType::Decimal(*p, *s),
            RustType::Json => SqlType::Jsonb,
            RustType::Bytes => SqlType::Bytea,
            RustType::Option(inner) => inner.to_sql_type(),
            RustType::Vec(_) => SqlType::Jsonb,
        }
    }

    /// Check if this type is nullable.
    pub fn is_nullable(&self) -> bool {
        matches!(self, RustType::Option(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_type_parsing() {
        assert_eq!(RustType::from_type_string("String"), Some(RustType::String));
        assert_eq!(RustType::from_type_string("Uuid"), Some(RustType::Uuid));
        assert_eq!(
            RustType::from_type_string("Option<String>"),
            Some(RustType::Option(Box::new(RustType::String)))
        );
        assert_eq!(
            RustType::from_type_string("Vec<i32>"),
            Some(RustType::Vec(Box::new(RustType::I32)))
        );
        assert_eq!(RustType::from_type_string("Vec<u8>"), Some(RustType::Bytes));
    }

    #[test]
    fn test_unknown_types_are_rejected() {
        assert_eq!(RustType::from_type_string("HashMap<String, i32>"), None);
        assert_eq!(RustType::from_type_string("Option<Widget>"), None);
    }

    #[test]
    fn test_rust_type_to_sql() {
        assert_eq!(RustType::String.to_sql_type(), SqlType::Varchar(None));
        assert_eq!(RustType::Uuid.to_sql_type(), SqlType::Uuid);
        assert_eq!(RustType::I64.to_sql_type(), SqlType::BigInt);
        assert_eq!(
            RustType::Option(Box::new(RustType::DateTime)).to_sql_type(),
            SqlType::Timestamptz
        );
        assert_eq!(
            RustType::Vec(Box::new(RustType::String)).to_sql_type(),
            SqlType::Jsonb
        );
    }

    #[test]
    fn test_nullability() {
        assert!(RustType::Option(Box::new(RustType::I32)).is_nullable());
        assert!(!RustType::I32.is_nullable());
    }
}
