use crate::button::Button;
use crate::core::PageBinding;
use crate::descriptor::{ButtonDescriptor, FieldDescriptor, PageDescriptor};
use crate::errors::{EngineError, Result};
use crate::fields::{
    BooleanField, DateTimeField, DateTimeType, Field, FieldKind, FieldSpec, LookupField,
    NumberField, NumberType, TextContentType, TextField,
};
use crate::page::PageContext;
use std::collections::HashMap;
use tracing::{debug, info};

impl From<&FieldDescriptor> for FieldSpec {
    fn from(descriptor: &FieldDescriptor) -> Self {
        FieldSpec {
            code: descriptor.code.clone(),
            title: descriptor.title.clone(),
            read_only: descriptor.read_only,
            required: descriptor.required,
            placeholder: descriptor.placeholder.clone(),
        }
    }
}

/// Resolve a descriptor's type and subtype names to a field kind.
///
/// Names match without regard to case. A missing subtype selects the
/// kind's default: `Text`, `Decimal` or `DateTime`.
pub fn resolve_kind(descriptor: &FieldDescriptor) -> Result<FieldKind> {
    let subtype = descriptor
        .subtype
        .as_deref()
        .map(str::trim)
        .filter(|subtype| !subtype.is_empty());
    let unknown_subtype = |subtype: &str| {
        EngineError::config(format!(
            "field '{}': unknown {} subtype '{}'",
            descriptor.code, descriptor.field_type, subtype
        ))
    };

    let kind = match descriptor.field_type.trim().to_ascii_lowercase().as_str() {
        "text" => FieldKind::Text(match subtype {
            Some(name) => TextContentType::parse(name).ok_or_else(|| unknown_subtype(name))?,
            None => TextContentType::Text,
        }),
        "number" => FieldKind::Number(match subtype {
            Some(name) => NumberType::parse(name).ok_or_else(|| unknown_subtype(name))?,
            None => NumberType::Decimal,
        }),
        "datetime" => FieldKind::DateTime(match subtype {
            Some(name) => DateTimeType::parse(name).ok_or_else(|| unknown_subtype(name))?,
            None => DateTimeType::DateTime,
        }),
        "boolean" => FieldKind::Boolean,
        "lookup" => FieldKind::Lookup,
        other => {
            return Err(EngineError::config(format!(
                "field '{}': unknown field type '{}'",
                descriptor.code, other
            )))
        }
    };
    Ok(kind)
}

/// Builds fields, buttons and page contexts bound to one page.
pub struct ControlFactory {
    binding: PageBinding,
}

impl ControlFactory {
    pub fn new(binding: PageBinding) -> Self {
        Self { binding }
    }

    pub fn binding(&self) -> &PageBinding {
        &self.binding
    }

    pub fn build_field(&self, descriptor: &FieldDescriptor) -> Result<Field> {
        let kind = resolve_kind(descriptor)?;
        let spec = FieldSpec::from(descriptor);
        let binding = self.binding.clone();
        debug!("Building {} field '{}'", kind, spec.code);

        let field: Field = match kind {
            FieldKind::Text(content_type) => TextField::new(spec, content_type, binding)?.into(),
            FieldKind::Number(number_type) => NumberField::new(spec, number_type, binding)?.into(),
            FieldKind::DateTime(date_time_type) => {
                DateTimeField::new(spec, date_time_type, binding)?.into()
            }
            FieldKind::Boolean => BooleanField::new(spec, binding)?.into(),
            FieldKind::Lookup => LookupField::new(spec, binding)?.into(),
        };
        Ok(field)
    }

    pub fn build_button(&self, descriptor: &ButtonDescriptor) -> Result<Button> {
        Button::new(
            descriptor.code.clone(),
            descriptor.title.clone(),
            self.binding.clone(),
        )
    }

    pub fn build_page(&self, descriptor: &PageDescriptor) -> Result<PageContext> {
        descriptor.validate()?;

        let mut fields = HashMap::with_capacity(descriptor.fields.len());
        for field in &descriptor.fields {
            fields.insert(field.code.clone(), self.build_field(field)?);
        }

        let mut buttons = HashMap::with_capacity(descriptor.buttons.len());
        for button in &descriptor.buttons {
            buttons.insert(button.code.clone(), self.build_button(button)?);
        }

        let context = PageContext::new(self.binding.clone(), descriptor.clone(), fields, buttons);
        info!(
            "Built page '{}' [{}] with {} field(s) and {} button(s)",
            descriptor.name,
            context.id(),
            descriptor.fields.len(),
            descriptor.buttons.len()
        );
        Ok(context)
    }
}
