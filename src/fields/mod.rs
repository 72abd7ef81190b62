//! Field kinds and the closed [`Field`] enum over them.

pub mod base;
pub mod behavior;
pub mod boolean;
pub mod datetime;
pub mod kind;
pub mod lookup;
pub mod number;
pub mod text;

pub use base::{FieldCore, FieldSpec};
pub use behavior::FieldBehavior;
pub use boolean::BooleanField;
pub use datetime::DateTimeField;
pub use kind::{DateTimeType, FieldKind, NumberType, TextContentType};
pub use lookup::{LookupField, LookupOption};
pub use number::{NumberField, NumberValue};
pub use text::TextField;

use crate::errors::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::time::Duration;

/// Current value of a field, independent of its kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum FieldValue {
    Text(String),
    Number(NumberValue),
    DateTime(NaiveDateTime),
    Boolean(bool),
    Empty,
}

pub enum Field {
    Text(TextField),
    Number(NumberField),
    DateTime(DateTimeField),
    Boolean(BooleanField),
    Lookup(LookupField),
}

impl Field {
    pub fn behavior(&self) -> &dyn FieldBehavior {
        match self {
            Field::Text(field) => field,
            Field::Number(field) => field,
            Field::DateTime(field) => field,
            Field::Boolean(field) => field,
            Field::Lookup(field) => field,
        }
    }

    pub fn behavior_mut(&mut self) -> &mut dyn FieldBehavior {
        match self {
            Field::Text(field) => field,
            Field::Number(field) => field,
            Field::DateTime(field) => field,
            Field::Boolean(field) => field,
            Field::Lookup(field) => field,
        }
    }

    pub fn code(&self) -> &str {
        self.behavior().core().code()
    }

    pub fn title(&self) -> &str {
        self.behavior().core().title()
    }

    pub fn spec(&self) -> &FieldSpec {
        self.behavior().core().spec()
    }

    pub fn kind(&self) -> FieldKind {
        self.behavior().kind()
    }

    pub async fn exists(&mut self, debug: bool, timeout: Option<Duration>) -> bool {
        self.behavior_mut().exists(debug, timeout).await
    }

    pub async fn check_read_only(&mut self, debug: bool) -> Result<bool> {
        self.behavior_mut().check_read_only(debug).await
    }

    pub async fn check_required(&mut self, debug: bool) -> Result<bool> {
        self.behavior_mut().check_required(debug).await
    }

    pub async fn check_placeholder(&mut self, debug: bool) -> Result<bool> {
        self.behavior_mut().check_placeholder(debug).await
    }

    pub async fn check_field(&mut self, debug: bool, timeout: Option<Duration>) -> Result<bool> {
        self.behavior_mut().check_field(debug, timeout).await
    }

    /// Drop the cached container; required after the page re-renders.
    pub fn invalidate(&mut self) {
        self.behavior_mut().invalidate();
    }

    pub async fn read_value(&mut self, debug: bool) -> Result<FieldValue> {
        let value = match self {
            Field::Text(field) => {
                let text = field.get_value(debug).await?;
                if text.is_empty() {
                    FieldValue::Empty
                } else {
                    FieldValue::Text(text)
                }
            }
            Field::Number(field) => field
                .get_value(debug)
                .await?
                .map_or(FieldValue::Empty, FieldValue::Number),
            Field::DateTime(field) => field
                .get_value(debug)
                .await?
                .map_or(FieldValue::Empty, FieldValue::DateTime),
            Field::Boolean(field) => FieldValue::Boolean(field.get_value(debug).await?),
            Field::Lookup(field) => field
                .get_value(debug)
                .await?
                .map_or(FieldValue::Empty, FieldValue::Text),
        };
        Ok(value)
    }
}

/// Typed view of a [`Field`] variant.
pub trait FieldVariant: Sized {
    /// Kind family name, as used in error messages
    const KIND: &'static str;

    fn from_field(field: &Field) -> Option<&Self>;

    fn from_field_mut(field: &mut Field) -> Option<&mut Self>;
}

macro_rules! field_variant {
    ($variant:ident, $ty:ty) => {
        impl FieldVariant for $ty {
            const KIND: &'static str = stringify!($variant);

            fn from_field(field: &Field) -> Option<&Self> {
                match field {
                    Field::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_field_mut(field: &mut Field) -> Option<&mut Self> {
                match field {
                    Field::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Field {
            fn from(field: $ty) -> Self {
                Field::$variant(field)
            }
        }
    };
}

field_variant!(Text, TextField);
field_variant!(Number, NumberField);
field_variant!(DateTime, DateTimeField);
field_variant!(Boolean, BooleanField);
field_variant!(Lookup, LookupField);
