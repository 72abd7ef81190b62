use crate::core::{LocatorRef, PageBinding};
use crate::dom::{selectors, text};
use crate::errors::{EngineError, Result};
use crate::fields::base::{self, FieldCore, FieldSpec};
use crate::fields::behavior::FieldBehavior;
use crate::fields::kind::FieldKind;
use async_trait::async_trait;

/// Checkbox field. It has no required or placeholder semantics, so those
/// checks always pass.
pub struct BooleanField {
    core: FieldCore,
}

impl BooleanField {
    pub fn new(spec: FieldSpec, binding: PageBinding) -> Result<Self> {
        Ok(Self {
            core: FieldCore::new(spec, binding)?,
        })
    }

    pub async fn get_value(&mut self, debug: bool) -> Result<bool> {
        let container = self.require_container(debug).await?;
        container.locator(selectors::CHECKBOX_INPUT).first().is_checked().await
    }

    /// Bring the checkbox to `value`, clicking only when it differs.
    pub async fn set_value(&mut self, value: bool, debug: bool) -> Result<()> {
        let container = self.require_container(debug).await?;
        let input = container.locator(selectors::CHECKBOX_INPUT).first();
        if input.is_checked().await? == value {
            self.core.trace(debug, format!("already {}", value));
            return Ok(());
        }

        let target = self.click_target(&container, &input).await?;
        self.core
            .trace(debug, format!("clicking {} to set {}", target.describe(), value));
        target
            .click(Some(self.core.config().actions.timeout()))
            .await?;

        let actual = input.is_checked().await?;
        if actual != value {
            return Err(EngineError::BooleanStateMismatch {
                field: self.core.describe(),
                expected: value,
                actual,
            });
        }
        Ok(())
    }

    /// The styled box takes the click when rendered, then the caption,
    /// then the raw input.
    async fn click_target(&self, container: &LocatorRef, input: &LocatorRef) -> Result<LocatorRef> {
        for selector in [selectors::CHECKBOX_WRAPPER, selectors::CHECKBOX_LABEL] {
            let candidate = container.locator(selector).first();
            if candidate.count().await? > 0 && candidate.is_visible().await? {
                return Ok(candidate);
            }
        }
        Ok(input.clone())
    }
}

#[async_trait]
impl FieldBehavior for BooleanField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut FieldCore {
        &mut self.core
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Boolean
    }

    fn value_selector(&self) -> &'static str {
        selectors::CHECKBOX_INPUT
    }

    async fn observe_read_only(&self, container: &LocatorRef) -> Result<bool> {
        if let Some(input) = base::value_element(container, selectors::CHECKBOX_INPUT).await? {
            if text::is_truthy_attribute(input.attribute("disabled").await?.as_deref()) {
                return Ok(true);
            }
            if input.is_disabled().await? {
                return Ok(true);
            }
        }
        if text::has_disabled_marker(container.attribute("class").await?.as_deref()) {
            return Ok(true);
        }
        let wrapper = container.locator(selectors::CHECKBOX_WRAPPER).first();
        if wrapper.count().await? > 0 {
            return Ok(text::has_disabled_marker(
                wrapper.attribute("class").await?.as_deref(),
            ));
        }
        Ok(false)
    }

    async fn check_required(&mut self, debug: bool) -> Result<bool> {
        self.core.trace(debug, "required check skipped for checkbox");
        Ok(true)
    }

    async fn check_placeholder(&mut self, debug: bool) -> Result<bool> {
        self.core.trace(debug, "placeholder check skipped for checkbox");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{field_container, FakeElement, FakePage};

    struct Fixture {
        field: BooleanField,
        input: FakeElement,
        container: FakeElement,
    }

    fn mounted(page: &FakePage, spec: FieldSpec) -> Fixture {
        let input = FakeElement::new().with_attr("type", "checkbox");
        let container =
            field_container("Active").with_child(selectors::CHECKBOX_INPUT, input.clone());
        page.add(
            &selectors::by_code("crt-checkbox", "IsActive"),
            container.clone(),
        );
        Fixture {
            field: BooleanField::new(spec, PageBinding::new(page.handle())).unwrap(),
            input,
            container,
        }
    }

    fn toggles(input: &FakeElement) -> FakeElement {
        let input = input.clone();
        FakeElement::new().on_click(move |_| input.set_checked(!input.is_checked()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrapper_takes_the_click() {
        let page = FakePage::new();
        let mut fx = mounted(&page, FieldSpec::new("IsActive", "Active"));
        let wrapper = toggles(&fx.input);
        fx.container.add_child(selectors::CHECKBOX_WRAPPER, wrapper.clone());

        fx.field.set_value(true, false).await.unwrap();
        assert!(fx.field.get_value(false).await.unwrap());
        assert_eq!(wrapper.click_count(), 1);
        assert_eq!(fx.input.click_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_matching_state_is_a_no_op() {
        let page = FakePage::new();
        let mut fx = mounted(&page, FieldSpec::new("IsActive", "Active"));
        fx.input.set_checked(true);
        let wrapper = toggles(&fx.input);
        fx.container.add_child(selectors::CHECKBOX_WRAPPER, wrapper.clone());

        fx.field.set_value(true, false).await.unwrap();
        assert_eq!(wrapper.click_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_label_is_used_without_wrapper() {
        let page = FakePage::new();
        let mut fx = mounted(&page, FieldSpec::new("IsActive", "Active"));
        fx.input.set_checked(true);
        let label = toggles(&fx.input);
        fx.container.add_child(selectors::CHECKBOX_LABEL, label.clone());

        fx.field.set_value(false, false).await.unwrap();
        assert!(!fx.field.get_value(false).await.unwrap());
        assert_eq!(label.click_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_state_after_click_is_an_error() {
        let page = FakePage::new();
        let mut fx = mounted(&page, FieldSpec::new("IsActive", "Active"));

        let err = fx.field.set_value(true, false).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::BooleanStateMismatch {
                expected: true,
                actual: false,
                ..
            }
        ));
        assert_eq!(fx.input.click_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_only_detection() {
        let page = FakePage::new();
        let mut fx = mounted(&page, FieldSpec::new("IsActive", "Active").read_only(true));
        assert!(!fx.field.check_read_only(false).await.unwrap());

        fx.input.set_attr("disabled", "");
        assert!(fx.field.check_read_only(false).await.unwrap());
        fx.input.remove_attr("disabled");

        let wrapper = FakeElement::new().with_attr("class", "crt-checkbox-box crt-checkbox-disabled");
        fx.container.add_child(selectors::CHECKBOX_WRAPPER, wrapper);
        assert!(fx.field.check_read_only(false).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_required_and_placeholder_always_pass() {
        let page = FakePage::new();
        let mut fx = mounted(
            &page,
            FieldSpec::new("IsActive", "Active")
                .required(true)
                .placeholder("never rendered"),
        );
        assert!(fx.field.check_required(false).await.unwrap());
        assert!(fx.field.check_placeholder(false).await.unwrap());
        assert!(fx.field.check_field(false, None).await.unwrap());
    }
}
