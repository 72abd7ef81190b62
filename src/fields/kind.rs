use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextContentType {
    Text,
    RichText,
    Email,
    PhoneNumber,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberType {
    Integer,
    Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateTimeType {
    Time,
    Date,
    DateTime,
}

/// Kind tag of a field, including its subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Text(TextContentType),
    Number(NumberType),
    DateTime(DateTimeType),
    Boolean,
    Lookup,
}

impl FieldKind {
    /// Custom element tag that hosts this kind of control
    pub fn host_tag(&self) -> &'static str {
        match self {
            FieldKind::Text(TextContentType::Text) => "crt-input",
            FieldKind::Text(TextContentType::RichText) => "crt-rich-text-editor",
            FieldKind::Text(TextContentType::Email) => "crt-email-input",
            FieldKind::Text(TextContentType::PhoneNumber) => "crt-phone-input",
            FieldKind::Text(TextContentType::Link) => "crt-web-input",
            FieldKind::Number(_) => "crt-number-input",
            FieldKind::DateTime(DateTimeType::Time) => "crt-time-picker",
            FieldKind::DateTime(DateTimeType::Date) => "crt-date-picker",
            FieldKind::DateTime(DateTimeType::DateTime) => "crt-datetime-picker",
            FieldKind::Boolean => "crt-checkbox",
            FieldKind::Lookup => "crt-combobox",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text(_) => "Text",
            FieldKind::Number(_) => "Number",
            FieldKind::DateTime(_) => "DateTime",
            FieldKind::Boolean => "Boolean",
            FieldKind::Lookup => "Lookup",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text(subtype) => write!(f, "Text/{:?}", subtype),
            FieldKind::Number(subtype) => write!(f, "Number/{:?}", subtype),
            FieldKind::DateTime(subtype) => write!(f, "DateTime/{:?}", subtype),
            FieldKind::Boolean => f.write_str("Boolean"),
            FieldKind::Lookup => f.write_str("Lookup"),
        }
    }
}

impl TextContentType {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "richtext" => Some(Self::RichText),
            "email" => Some(Self::Email),
            "phonenumber" | "phone" => Some(Self::PhoneNumber),
            "link" | "url" => Some(Self::Link),
            _ => None,
        }
    }
}

impl NumberType {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Some(Self::Integer),
            "decimal" => Some(Self::Decimal),
            _ => None,
        }
    }
}

impl DateTimeType {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "time" => Some(Self::Time),
            "date" => Some(Self::Date),
            "datetime" => Some(Self::DateTime),
            _ => None,
        }
    }
}
