use crate::button::Button;
use crate::core::{PageBinding, PageHandle};
use crate::descriptor::PageDescriptor;
use crate::errors::{EngineError, Result};
use crate::fields::{
    BooleanField, DateTimeField, Field, FieldVariant, LookupField, NumberField, TextField,
};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

/// Outcome of checking one field against its declared expectations.
///
/// State checks are `None` when the field was not found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCheckReport {
    pub code: String,
    pub title: String,
    pub kind: String,
    pub exists: bool,
    pub read_only: Option<bool>,
    pub required: Option<bool>,
    pub placeholder: Option<bool>,
    pub error: Option<String>,
}

impl FieldCheckReport {
    pub fn passed(&self) -> bool {
        self.exists
            && self.error.is_none()
            && [self.read_only, self.required, self.placeholder]
                .iter()
                .all(|outcome| *outcome == Some(true))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonCheckReport {
    pub code: String,
    pub title: Option<String>,
    pub exists: bool,
}

/// One page: its handle, its descriptor and the fields and buttons built from it.
///
/// Codes are compared exactly. The maps are fixed once the context is built.
pub struct PageContext {
    id: Uuid,
    binding: PageBinding,
    descriptor: PageDescriptor,
    fields: HashMap<String, Field>,
    buttons: HashMap<String, Button>,
}

impl fmt::Debug for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("id", &self.id)
            .field("name", &self.descriptor.name)
            .field("fields", &self.field_codes())
            .field("buttons", &self.button_codes())
            .finish()
    }
}

/// Resolve a descriptor URL below `base_url`.
///
/// Descriptor paths are relative to the application root even when written
/// with a leading `/`, so the base path is always kept. Absolute URLs are
/// taken as they are.
pub fn resolve_page_url(base_url: &Url, path: &str) -> std::result::Result<Url, url::ParseError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    let path = path.trim();
    match Url::parse(path) {
        Ok(absolute) => Ok(absolute),
        Err(_) => base.join(path.trim_start_matches('/')),
    }
}

impl PageContext {
    pub(crate) fn new(
        binding: PageBinding,
        descriptor: PageDescriptor,
        fields: HashMap<String, Field>,
        buttons: HashMap<String, Button>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            binding,
            descriptor,
            fields,
            buttons,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &PageDescriptor {
        &self.descriptor
    }

    pub fn page(&self) -> &Arc<dyn PageHandle> {
        &self.binding.page
    }

    /// Field codes in sorted order
    pub fn field_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn button_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.buttons.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn try_field(&mut self, code: &str) -> Option<&mut Field> {
        self.fields.get_mut(code)
    }

    pub fn field(&mut self, code: &str) -> Result<&mut Field> {
        let page = self.descriptor.name.clone();
        self.fields
            .get_mut(code)
            .ok_or_else(|| EngineError::UnknownField {
                page,
                code: code.to_string(),
            })
    }

    pub fn try_field_as<T: FieldVariant>(&mut self, code: &str) -> Option<&mut T> {
        self.fields.get_mut(code).and_then(T::from_field_mut)
    }

    /// Field of a specific kind; a field of another kind is an error.
    pub fn field_as<T: FieldVariant>(&mut self, code: &str) -> Result<&mut T> {
        let field = self.field(code)?;
        let actual = field.kind().name();
        T::from_field_mut(field).ok_or_else(|| EngineError::FieldKindMismatch {
            code: code.to_string(),
            actual: actual.to_string(),
            requested: T::KIND.to_string(),
        })
    }

    pub fn text_field(&mut self, code: &str) -> Result<&mut TextField> {
        self.field_as(code)
    }

    pub fn number_field(&mut self, code: &str) -> Result<&mut NumberField> {
        self.field_as(code)
    }

    pub fn date_time_field(&mut self, code: &str) -> Result<&mut DateTimeField> {
        self.field_as(code)
    }

    pub fn boolean_field(&mut self, code: &str) -> Result<&mut BooleanField> {
        self.field_as(code)
    }

    pub fn lookup_field(&mut self, code: &str) -> Result<&mut LookupField> {
        self.field_as(code)
    }

    pub fn try_button(&self, code: &str) -> Option<&Button> {
        self.buttons.get(code)
    }

    pub fn button(&self, code: &str) -> Result<&Button> {
        self.buttons.get(code).ok_or_else(|| EngineError::UnknownButton {
            page: self.descriptor.name.clone(),
            code: code.to_string(),
        })
    }

    /// Forget every cached field container.
    pub fn invalidate_all(&mut self) {
        for field in self.fields.values_mut() {
            field.invalidate();
        }
    }

    /// Navigate to the descriptor's URL resolved against `base_url`.
    pub async fn open(&mut self, base_url: &Url) -> Result<()> {
        let target = resolve_page_url(base_url, &self.descriptor.url).map_err(|e| {
            EngineError::config(format!(
                "page '{}': cannot resolve url '{}' against '{}': {}",
                self.descriptor.name, self.descriptor.url, base_url, e
            ))
        })?;
        info!("[{}] Opening page '{}' at {}", self.id, self.descriptor.name, target);
        self.binding.page.goto(target.as_str()).await?;
        self.invalidate_all();
        Ok(())
    }

    /// Run every state check on every field, in code order.
    ///
    /// Unlike [`Field::check_field`] nothing short-circuits, so the report
    /// shows each outcome. Check failures are recorded, not returned.
    pub async fn check_all_fields(&mut self, debug: bool) -> Vec<FieldCheckReport> {
        let mut codes: Vec<String> = self.fields.keys().cloned().collect();
        codes.sort_unstable();

        let mut reports = Vec::with_capacity(codes.len());
        for code in codes {
            let Some(field) = self.fields.get_mut(&code) else {
                continue;
            };
            let report = check_one(field, debug).await;
            if !report.passed() {
                warn!("[{}] Field '{}' failed its checks", self.id, code);
            }
            reports.push(report);
        }
        reports
    }

    pub async fn check_all_buttons(&self, debug: bool) -> Vec<ButtonCheckReport> {
        let mut buttons: Vec<&Button> = self.buttons.values().collect();
        buttons.sort_unstable_by(|a, b| a.code().cmp(b.code()));

        let mut reports = Vec::with_capacity(buttons.len());
        for button in buttons {
            reports.push(ButtonCheckReport {
                code: button.code().to_string(),
                title: button.title().map(str::to_string),
                exists: button.exists(debug, None).await,
            });
        }
        reports
    }
}

async fn check_one(field: &mut Field, debug: bool) -> FieldCheckReport {
    let mut report = FieldCheckReport {
        code: field.code().to_string(),
        title: field.title().to_string(),
        kind: field.kind().to_string(),
        exists: false,
        read_only: None,
        required: None,
        placeholder: None,
        error: None,
    };

    report.exists = field.exists(debug, None).await;
    if !report.exists {
        return report;
    }

    let outcome: Result<()> = async {
        report.read_only = Some(field.check_read_only(debug).await?);
        report.required = Some(field.check_required(debug).await?);
        report.placeholder = Some(field.check_placeholder(debug).await?);
        Ok::<(), EngineError>(())
    }
    .await;
    if let Err(e) = outcome {
        report.error = Some(e.to_string());
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ButtonDescriptor, FieldDescriptor};
    use crate::dom::selectors;
    use crate::factory::ControlFactory;
    use crate::fields::{FieldBehavior, FieldKind};
    use crate::testing::{field_container, FakeElement, FakePage};

    fn field(field_type: &str, code: &str, title: &str) -> FieldDescriptor {
        FieldDescriptor {
            field_type: field_type.to_string(),
            code: code.to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn accounts() -> PageDescriptor {
        PageDescriptor {
            name: "Accounts".to_string(),
            url: "accounts/edit".to_string(),
            fields: vec![
                field("Text", "Name", "Name"),
                field("Boolean", "IsActive", "Active"),
                field("Lookup", "Owner", "Owner"),
            ],
            buttons: vec![ButtonDescriptor {
                title: Some("Save".to_string()),
                code: "Save".to_string(),
            }],
        }
    }

    fn context(page: &FakePage) -> PageContext {
        let mut config = crate::core::EngineConfig::default();
        config.resolution.timeouts_ms = vec![200];
        config.actions.timeout_ms = 200;
        ControlFactory::new(PageBinding::new(page.handle()).with_config(config))
            .build_page(&accounts())
            .unwrap()
    }

    #[test]
    fn test_lookups_by_code() {
        let page = FakePage::new();
        let mut ctx = context(&page);

        assert_eq!(ctx.field_codes(), vec!["IsActive", "Name", "Owner"]);
        assert!(ctx.try_field("Name").is_some());
        assert!(ctx.try_field("name").is_none());
        assert!(matches!(
            ctx.field("Missing"),
            Err(EngineError::UnknownField { .. })
        ));
        assert!(ctx.button("Save").is_ok());
        assert!(ctx.try_button("Cancel").is_none());
        assert!(matches!(
            ctx.button("Cancel"),
            Err(EngineError::UnknownButton { .. })
        ));
    }

    #[test]
    fn test_typed_lookups() {
        let page = FakePage::new();
        let mut ctx = context(&page);

        assert!(ctx.lookup_field("Owner").is_ok());
        assert_eq!(ctx.boolean_field("IsActive").unwrap().kind(), FieldKind::Boolean);
        assert!(ctx.try_field_as::<TextField>("Owner").is_none());

        let err = ctx.text_field("Owner").err().unwrap();
        assert_eq!(
            err.to_string(),
            "Field 'Owner' is a Lookup field, not a Text field"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_navigates_and_invalidates() {
        let page = FakePage::new();
        page.add(
            &selectors::by_code("crt-input", "Name"),
            field_container("Name").with_child(selectors::TEXT_VALUE, FakeElement::new()),
        );
        let mut ctx = context(&page);
        let name_selector = selectors::by_code("crt-input", "Name");

        assert!(ctx.field("Name").unwrap().exists(false, None).await);
        assert!(ctx.field("Name").unwrap().exists(false, None).await);
        assert_eq!(page.wait_count(&name_selector), 1);

        let base = Url::parse("https://staging.example.com/app/").unwrap();
        ctx.open(&base).await.unwrap();
        assert_eq!(
            page.visited(),
            vec!["https://staging.example.com/app/accounts/edit"]
        );
        assert_eq!(
            ctx.page().url().await.unwrap(),
            "https://staging.example.com/app/accounts/edit"
        );

        assert!(ctx.field("Name").unwrap().exists(false, None).await);
        assert_eq!(page.wait_count(&name_selector), 2);
    }

    #[test]
    fn test_page_urls_stay_below_the_base_path() {
        let resolve = |base: &str, path: &str| {
            resolve_page_url(&Url::parse(base).unwrap(), path)
                .unwrap()
                .to_string()
        };
        assert_eq!(
            resolve("https://staging.example.com/app/", "/accounts/edit"),
            "https://staging.example.com/app/accounts/edit"
        );
        assert_eq!(
            resolve("https://staging.example.com/app", "accounts/edit?id=7"),
            "https://staging.example.com/app/accounts/edit?id=7"
        );
        assert_eq!(
            resolve("https://staging.example.com", "/accounts"),
            "https://staging.example.com/accounts"
        );
        assert_eq!(
            resolve("https://staging.example.com/app/", "https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_keeps_base_path_for_rooted_urls() {
        let page = FakePage::new();
        let mut descriptor = accounts();
        descriptor.url = "/accounts/edit".to_string();
        let mut ctx = ControlFactory::new(PageBinding::new(page.handle()))
            .build_page(&descriptor)
            .unwrap();

        let base = Url::parse("https://staging.example.com/app/").unwrap();
        ctx.open(&base).await.unwrap();
        assert_eq!(
            page.visited(),
            vec!["https://staging.example.com/app/accounts/edit"]
        );
    }

    #[test]
    fn test_debug_lists_codes() {
        let page = FakePage::new();
        let ctx = context(&page);
        let rendered = format!("{:?}", ctx);
        assert!(rendered.contains("Accounts"));
        assert!(rendered.contains(r#"["IsActive", "Name", "Owner"]"#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_all_fields_reports_each_field() {
        let page = FakePage::new();
        page.add(
            &selectors::by_code("crt-input", "Name"),
            field_container("Name").with_child(selectors::TEXT_VALUE, FakeElement::new()),
        );
        page.add(
            &selectors::by_code("crt-checkbox", "IsActive"),
            field_container("Active").with_child(
                selectors::CHECKBOX_INPUT,
                FakeElement::new().with_attr("disabled", ""),
            ),
        );
        page.add(&selectors::button("Save"), FakeElement::new().with_text("Save"));
        let mut ctx = context(&page);

        let reports = ctx.check_all_fields(false).await;
        let codes: Vec<&str> = reports.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["IsActive", "Name", "Owner"]);

        let active = &reports[0];
        assert!(active.exists);
        assert_eq!(active.read_only, Some(false));
        assert!(!active.passed());

        assert!(reports[1].passed());

        let owner = &reports[2];
        assert!(!owner.exists);
        assert_eq!(owner.read_only, None);
        assert!(!owner.passed());

        let buttons = ctx.check_all_buttons(false).await;
        assert_eq!(buttons.len(), 1);
        assert!(buttons[0].exists);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = FieldCheckReport {
            code: "Name".into(),
            title: "Name".into(),
            kind: "Text/Text".into(),
            exists: true,
            read_only: Some(true),
            required: Some(true),
            placeholder: Some(true),
            error: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["readOnly"], serde_json::json!(true));
        assert!(report.passed());
    }

    #[test]
    fn test_ids_are_unique() {
        let page = FakePage::new();
        assert_ne!(context(&page).id(), context(&page).id());
    }
}
