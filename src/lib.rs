//! Locate, inspect and drive the fields and buttons of component-rendered
//! business forms from tests.
//!
//! A [`PageDescriptor`] lists a page's fields and buttons. The
//! [`ControlFactory`] turns it into a [`PageContext`] bound to a live
//! [`PageHandle`], and tests then check and fill fields by code.

pub mod browser;
pub mod button;
pub mod core;
pub mod descriptor;
pub mod dom;
pub mod environment;
pub mod errors;
pub mod factory;
pub mod fields;
pub mod page;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use button::Button;
pub use crate::core::{
    AuthenticatedContext, EngineConfig, LogSink, Locator, LocatorRef, MemorySink, PageBinding,
    PageHandle, SessionProvider, TracingSink, WaitState,
};
pub use descriptor::{ButtonDescriptor, FieldDescriptor, PageCatalog, PageDescriptor};
pub use environment::{EnvironmentConfig, UserSession};
pub use errors::{EngineError, Result};
pub use factory::ControlFactory;
pub use fields::{
    BooleanField, DateTimeField, DateTimeType, Field, FieldBehavior, FieldKind, FieldSpec,
    FieldValue, FieldVariant, LookupField, NumberField, NumberType, NumberValue, TextContentType,
    TextField,
};
pub use page::{ButtonCheckReport, FieldCheckReport, PageContext};
pub use rust_decimal::Decimal;

#[cfg(feature = "chrome")]
pub use browser::{ChromeBrowser, ChromePage};
