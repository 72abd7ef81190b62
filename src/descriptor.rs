//! Declarative page descriptions: which fields and buttons a page carries
//! and what each field is expected to look like.

use crate::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCatalog {
    #[serde(default)]
    pub pages: Vec<PageDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    #[serde(default)]
    pub name: String,
    /// Path (or absolute URL) of the page, joined onto the environment's base URL
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub buttons: Vec<ButtonDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonDescriptor {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub code: String,
}

impl PageCatalog {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::config(format!(
                "cannot read page catalog '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let catalog: PageCatalog = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for (index, page) in self.pages.iter().enumerate() {
            page.validate()
                .map_err(|e| EngineError::config(format!("pages[{}]: {}", index, e.detail())))?;
            if !names.insert(page.name.as_str()) {
                return Err(EngineError::config(format!(
                    "pages[{}]: duplicate page name '{}'",
                    index, page.name
                )));
            }
        }
        Ok(())
    }

    pub fn page(&self, name: &str) -> Option<&PageDescriptor> {
        self.pages.iter().find(|page| page.name == name)
    }
}

impl PageDescriptor {
    pub fn from_json(raw: &str) -> Result<Self> {
        let page: PageDescriptor = serde_json::from_str(raw)?;
        page.validate()?;
        Ok(page)
    }

    /// Reject blank required properties and duplicate codes, naming the
    /// offending item and property.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::config("page 'name' must not be blank"));
        }
        if self.url.trim().is_empty() {
            return Err(EngineError::config(format!(
                "page '{}': 'url' must not be blank",
                self.name
            )));
        }

        let mut codes = HashSet::new();
        for (index, field) in self.fields.iter().enumerate() {
            for (property, value) in [
                ("type", &field.field_type),
                ("code", &field.code),
                ("title", &field.title),
            ] {
                if value.trim().is_empty() {
                    return Err(EngineError::config(format!(
                        "page '{}': fields[{}].{} must not be blank",
                        self.name, index, property
                    )));
                }
            }
            if !codes.insert(field.code.as_str()) {
                return Err(EngineError::config(format!(
                    "page '{}': fields[{}] repeats code '{}'",
                    self.name, index, field.code
                )));
            }
        }

        let mut codes = HashSet::new();
        for (index, button) in self.buttons.iter().enumerate() {
            if button.code.trim().is_empty() {
                return Err(EngineError::config(format!(
                    "page '{}': buttons[{}].code must not be blank",
                    self.name, index
                )));
            }
            if !codes.insert(button.code.as_str()) {
                return Err(EngineError::config(format!(
                    "page '{}': buttons[{}] repeats code '{}'",
                    self.name, index, button.code
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const CATALOG: &str = r#"{
        "pages": [
            {
                "name": "Accounts",
                "url": "/accounts/edit",
                "fields": [
                    { "type": "Text", "title": "Name", "code": "Name", "required": true,
                      "placeholder": "Company name" },
                    { "type": "Number", "subtype": "Integer", "title": "Employees", "code": "Employees" },
                    { "type": "Lookup", "title": "Owner", "code": "Owner", "readOnly": true }
                ],
                "buttons": [ { "title": "Save", "code": "SaveButton" }, { "code": "Close" } ]
            }
        ]
    }"#;

    #[test]
    fn test_catalog_parses_camel_case() {
        let catalog = PageCatalog::from_json(CATALOG).unwrap();
        let page = catalog.page("Accounts").unwrap();
        assert_eq!(page.fields.len(), 3);
        assert_eq!(page.fields[0].placeholder.as_deref(), Some("Company name"));
        assert_eq!(page.fields[1].subtype.as_deref(), Some("Integer"));
        assert!(page.fields[2].read_only);
        assert_eq!(page.buttons[1].title, None);
        assert!(catalog.page("accounts").is_none());
    }

    #[test]
    fn test_blank_property_is_named() {
        let raw = r#"{ "name": "Accounts", "url": "/a",
            "fields": [ { "type": "Text", "title": "Name", "code": "Name" },
                        { "type": "Text", "title": " ", "code": "Other" } ] }"#;
        let err = PageDescriptor::from_json(raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: page 'Accounts': fields[1].title must not be blank"
        );
    }

    #[test]
    fn test_duplicate_codes_are_rejected() {
        let page = PageDescriptor {
            name: "Accounts".into(),
            url: "/a".into(),
            buttons: vec![
                ButtonDescriptor {
                    title: None,
                    code: "Save".into(),
                },
                ButtonDescriptor {
                    title: Some("Save".into()),
                    code: "Save".into(),
                },
            ],
            ..Default::default()
        };
        let err = page.validate().unwrap_err();
        assert!(err.to_string().contains("buttons[1] repeats code 'Save'"));
    }

    #[test]
    fn test_catalog_errors_name_the_page_index() {
        let err = PageCatalog::from_json(r#"{ "pages": [ { "name": "A", "url": "" } ] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("pages[0]: page 'A': 'url' must not be blank"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        let catalog = PageCatalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.pages.len(), 1);

        let err = PageCatalog::from_file("/nonexistent/catalog.json").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }
}
