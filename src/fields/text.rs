use crate::core::{LocatorRef, PageBinding, WaitState};
use crate::dom::selectors;
use crate::errors::{EngineError, Result};
use crate::fields::base::{FieldCore, FieldSpec};
use crate::fields::behavior::FieldBehavior;
use crate::fields::kind::{FieldKind, TextContentType};
use async_trait::async_trait;

/// Free-text field: plain text, rich text, email, phone number or link.
pub struct TextField {
    core: FieldCore,
    content_type: TextContentType,
}

impl TextField {
    pub fn new(spec: FieldSpec, content_type: TextContentType, binding: PageBinding) -> Result<Self> {
        Ok(Self {
            core: FieldCore::new(spec, binding)?,
            content_type,
        })
    }

    pub fn content_type(&self) -> TextContentType {
        self.content_type
    }

    pub async fn set_value(&mut self, value: &str, debug: bool) -> Result<()> {
        let container = self.require_container(debug).await?;
        if self.content_type == TextContentType::Email {
            return self.set_email(&container, value, debug).await;
        }

        let input = container.locator(self.value_selector()).first();
        self.core.enter_text(&input, value, debug).await
    }

    pub async fn get_value(&mut self, debug: bool) -> Result<String> {
        let container = self.require_container(debug).await?;
        match self.content_type {
            TextContentType::Email => self.get_email(&container, debug).await,
            TextContentType::RichText => {
                container.locator(self.value_selector()).first().text().await
            }
            _ => {
                container
                    .locator(self.value_selector())
                    .first()
                    .input_value()
                    .await
            }
        }
    }

    /// Empty email fields render an "add" trigger instead of the input.
    async fn set_email(&self, container: &LocatorRef, value: &str, debug: bool) -> Result<()> {
        let input = container.locator(selectors::EMAIL_INPUT).first();
        if !input.is_visible().await? {
            self.core.trace(debug, "email input hidden, clicking add trigger");
            let timeout = self.core.config().actions.timeout();
            container
                .locator(selectors::EMAIL_ADD_TRIGGER)
                .first()
                .click(Some(timeout))
                .await?;
            input
                .wait_for(WaitState::Visible, timeout)
                .await
                .map_err(|_| EngineError::EmailInputHidden {
                    field: self.core.describe(),
                })?;
        }
        input.fill(value).await
    }

    async fn get_email(&self, container: &LocatorRef, debug: bool) -> Result<String> {
        let input = container.locator(selectors::EMAIL_INPUT).first();
        if input.count().await? > 0 && input.is_visible().await? {
            return input.input_value().await;
        }

        let link = container.locator(selectors::EMAIL_LINK).first();
        if link.count().await? == 0 {
            self.core.trace(debug, "email input hidden and no link rendered");
            return Ok(String::new());
        }
        let text = link.text().await?;
        let text = text.trim();
        Ok(text.strip_prefix("mailto:").unwrap_or(text).to_string())
    }
}

#[async_trait]
impl FieldBehavior for TextField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut FieldCore {
        &mut self.core
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Text(self.content_type)
    }

    fn value_selector(&self) -> &'static str {
        match self.content_type {
            TextContentType::RichText => selectors::RICH_TEXT_VALUE,
            TextContentType::Email => selectors::EMAIL_INPUT,
            _ => selectors::TEXT_VALUE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{field_container, FakeElement, FakePage};

    fn text_field(
        page: &FakePage,
        content_type: TextContentType,
        spec: FieldSpec,
    ) -> TextField {
        TextField::new(spec, content_type, PageBinding::new(page.handle())).unwrap()
    }

    fn mount(page: &FakePage, kind: FieldKind, code: &str, container: FakeElement) {
        page.add(&selectors::by_code(kind.host_tag(), code), container);
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_through_visible_input() {
        let page = FakePage::new();
        let input = FakeElement::new();
        mount(
            &page,
            FieldKind::Text(TextContentType::Text),
            "Name",
            field_container("Name").with_child(selectors::TEXT_VALUE, input.clone()),
        );
        let mut field = text_field(&page, TextContentType::Text, FieldSpec::new("Name", "Name"));

        field.set_value("Acme Ltd.", false).await.unwrap();
        assert_eq!(field.get_value(false).await.unwrap(), "Acme Ltd.");
        assert_eq!(input.fills(), vec!["Acme Ltd."]);
        assert!(input.evaluations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_input_falls_back_to_script() {
        let page = FakePage::new();
        let input = FakeElement::new().hidden();
        mount(
            &page,
            FieldKind::Text(TextContentType::PhoneNumber),
            "Phone",
            field_container("Phone").with_child(selectors::TEXT_VALUE, input.clone()),
        );
        let mut field = text_field(
            &page,
            TextContentType::PhoneNumber,
            FieldSpec::new("Phone", "Phone"),
        );

        field.set_value("+1 555 0100", false).await.unwrap();
        assert!(input.fills().is_empty());
        assert_eq!(input.evaluations().len(), 1);
        assert_eq!(field.get_value(false).await.unwrap(), "+1 555 0100");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rich_text_reads_rendered_text() {
        let page = FakePage::new();
        let editor = FakeElement::new().with_attr("contenteditable", "true");
        mount(
            &page,
            FieldKind::Text(TextContentType::RichText),
            "Notes",
            field_container("Notes").with_child(selectors::RICH_TEXT_VALUE, editor),
        );
        let mut field = text_field(
            &page,
            TextContentType::RichText,
            FieldSpec::new("Notes", "Notes"),
        );

        field.set_value("Call back on Monday", false).await.unwrap();
        assert_eq!(field.get_value(false).await.unwrap(), "Call back on Monday");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_email_is_revealed_before_typing() {
        let page = FakePage::new();
        let input = FakeElement::new().hidden();
        let trigger = FakeElement::new().on_click({
            let input = input.clone();
            move |_| input.set_visible(true)
        });
        mount(
            &page,
            FieldKind::Text(TextContentType::Email),
            "Email",
            field_container("Email")
                .with_child(selectors::EMAIL_INPUT, input.clone())
                .with_child(selectors::EMAIL_ADD_TRIGGER, trigger.clone()),
        );
        let mut field = text_field(&page, TextContentType::Email, FieldSpec::new("Email", "Email"));

        field.set_value("jane@example.com", false).await.unwrap();
        assert_eq!(trigger.click_count(), 1);
        assert_eq!(field.get_value(false).await.unwrap(), "jane@example.com");

        // Already visible: the trigger is left alone.
        field.set_value("john@example.com", false).await.unwrap();
        assert_eq!(trigger.click_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_email_input_that_never_appears_is_an_error() {
        let page = FakePage::new();
        mount(
            &page,
            FieldKind::Text(TextContentType::Email),
            "Email",
            field_container("Email")
                .with_child(selectors::EMAIL_INPUT, FakeElement::new().hidden())
                .with_child(selectors::EMAIL_ADD_TRIGGER, FakeElement::new()),
        );
        let mut field = text_field(&page, TextContentType::Email, FieldSpec::new("Email", "Email"));

        let err = field.set_value("jane@example.com", false).await.unwrap_err();
        assert!(matches!(err, EngineError::EmailInputHidden { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_email_is_read_from_link() {
        let page = FakePage::new();
        mount(
            &page,
            FieldKind::Text(TextContentType::Email),
            "Email",
            field_container("Email")
                .with_child(selectors::EMAIL_INPUT, FakeElement::new().hidden())
                .with_child(
                    selectors::EMAIL_LINK,
                    FakeElement::new().with_text(" mailto:jane@example.com "),
                ),
        );
        let mut field = text_field(&page, TextContentType::Email, FieldSpec::new("Email", "Email"));

        assert_eq!(field.get_value(false).await.unwrap(), "jane@example.com");
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_operations_on_missing_field_fail() {
        let page = FakePage::new();
        let mut field = text_field(&page, TextContentType::Text, FieldSpec::new("Name", "Name"));
        let err = field.get_value(false).await.unwrap_err();
        assert!(matches!(err, EngineError::FieldNotFound { .. }));
        assert_eq!(err.to_string(), "Field 'Name' (Name) was not found on the page");
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_field_follows_each_expectation() {
        let page = FakePage::new();
        let input = FakeElement::new()
            .with_attr("required", "")
            .with_attr("placeholder", "Company name");
        mount(
            &page,
            FieldKind::Text(TextContentType::Text),
            "Name",
            field_container("Name *").with_child(selectors::TEXT_VALUE, input),
        );
        let matching = FieldSpec::new("Name", "Name")
            .required(true)
            .placeholder("Company name");

        let mut field = text_field(&page, TextContentType::Text, matching.clone());
        assert!(field.check_field(false, None).await.unwrap());

        let mut wrong_read_only =
            text_field(&page, TextContentType::Text, matching.clone().read_only(true));
        assert!(!wrong_read_only.check_field(false, None).await.unwrap());
        assert!(!wrong_read_only.check_read_only(false).await.unwrap());
        assert!(wrong_read_only.check_required(false).await.unwrap());
        assert!(wrong_read_only.check_placeholder(false).await.unwrap());

        let mut wrong_required =
            text_field(&page, TextContentType::Text, matching.clone().required(false));
        assert!(!wrong_required.check_field(false, None).await.unwrap());
        assert!(wrong_required.check_read_only(false).await.unwrap());
        assert!(!wrong_required.check_required(false).await.unwrap());

        let mut wrong_placeholder =
            text_field(&page, TextContentType::Text, matching.clone().placeholder("Name"));
        assert!(!wrong_placeholder.check_field(false, None).await.unwrap());
        assert!(!wrong_placeholder.check_placeholder(false).await.unwrap());

        let mut absent = text_field(
            &page,
            TextContentType::Text,
            FieldSpec::new("Missing", "Missing"),
        );
        assert!(!absent
            .check_field(false, Some(std::time::Duration::from_millis(100)))
            .await
            .unwrap());
    }
}
