use crate::core::{EngineConfig, LocatorRef, PageBinding, PageHandle, WaitState};
use crate::dom::{scripts, selectors, text};
use crate::errors::{EngineError, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Identity and declared expectations of a field, usually taken from a page descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub code: String,
    pub title: String,
    pub read_only: bool,
    pub required: bool,
    pub placeholder: Option<String>,
}

impl FieldSpec {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            read_only: false,
            required: false,
            placeholder: None,
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(EngineError::config("field code must not be blank"));
        }
        if self.title.trim().is_empty() {
            return Err(EngineError::config(format!(
                "field '{}' must have a title",
                self.code
            )));
        }
        Ok(())
    }
}

/// State shared by every field kind: spec, page binding and the container cache.
///
/// The cached container is never re-validated against the live page. Call
/// [`FieldCore::invalidate`] after anything that re-renders the form, such as
/// a full page reload.
pub struct FieldCore {
    spec: FieldSpec,
    container: Option<LocatorRef>,
    binding: PageBinding,
}

impl FieldCore {
    pub fn new(spec: FieldSpec, binding: PageBinding) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            container: None,
            binding,
        })
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn code(&self) -> &str {
        &self.spec.code
    }

    pub fn title(&self) -> &str {
        &self.spec.title
    }

    /// `'Title' (code)`, the form every field error uses
    pub fn describe(&self) -> String {
        format!("'{}' ({})", self.spec.title, self.spec.code)
    }

    pub fn binding(&self) -> &PageBinding {
        &self.binding
    }

    pub fn page(&self) -> &Arc<dyn PageHandle> {
        &self.binding.page
    }

    pub fn config(&self) -> &EngineConfig {
        &self.binding.config
    }

    pub fn cached_container(&self) -> Option<&LocatorRef> {
        self.container.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.container = None;
    }

    pub fn not_found(&self) -> EngineError {
        EngineError::FieldNotFound {
            field: self.describe(),
        }
    }

    pub(crate) fn trace(&self, debug: bool, message: impl AsRef<str>) {
        if debug {
            self.binding
                .sink
                .log(&format!("[field {}] {}", self.describe(), message.as_ref()));
        }
    }

    /// Type into a visible input; assign hidden ones by script.
    pub(crate) async fn enter_text(&self, input: &LocatorRef, value: &str, debug: bool) -> Result<()> {
        if input.is_visible().await? {
            self.trace(debug, format!("typing '{}'", value));
            return input.fill(value).await;
        }
        self.trace(debug, format!("value input hidden, assigning '{}' by script", value));
        input
            .evaluate(scripts::ASSIGN_VALUE, Value::String(value.to_string()))
            .await?;
        Ok(())
    }

    /// Locate the container whose label matches this field's title.
    ///
    /// Each timeout tier waits for any candidate to become visible and then
    /// compares every candidate's normalized label with the normalized title.
    /// Transient driver failures and label misses move on to the next tier;
    /// any other error aborts the search. `Ok(None)` means the field is absent.
    pub async fn resolve_container(
        &mut self,
        selector: &str,
        debug: bool,
        timeout: Option<Duration>,
    ) -> Result<Option<LocatorRef>> {
        if let Some(container) = &self.container {
            return Ok(Some(container.clone()));
        }

        let candidates = self.binding.page.locator(selector);
        let tiers = match timeout {
            Some(timeout) => vec![timeout],
            None => self.binding.config.resolution.tiers(),
        };

        for (attempt, tier) in tiers.iter().enumerate() {
            self.trace(
                debug,
                format!(
                    "attempt {}/{}: waiting up to {}ms for {}",
                    attempt + 1,
                    tiers.len(),
                    tier.as_millis(),
                    selector
                ),
            );

            let outcome = match candidates.wait_for(WaitState::Visible, *tier).await {
                Ok(()) => self.match_by_label(&candidates, debug).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(Some(container)) => {
                    self.trace(debug, "container resolved");
                    self.container = Some(container.clone());
                    return Ok(Some(container));
                }
                Ok(None) => {
                    self.trace(debug, format!("attempt {}: no label matched", attempt + 1));
                }
                Err(e) if e.is_transient() => {
                    self.trace(debug, format!("attempt {} failed: {}", attempt + 1, e));
                }
                Err(e) => {
                    self.trace(debug, format!("resolution aborted: {}", e));
                    return Err(e);
                }
            }
        }

        self.trace(debug, "container not found");
        Ok(None)
    }

    async fn match_by_label(
        &self,
        candidates: &LocatorRef,
        debug: bool,
    ) -> Result<Option<LocatorRef>> {
        let expected = text::normalize_label(&self.spec.title);
        let all = candidates.all().await?;
        self.trace(debug, format!("{} candidate(s) share this code", all.len()));

        for candidate in all {
            if let Some(label) = label_text(&candidate).await? {
                if text::normalize_label(&label) == expected {
                    return Ok(Some(candidate));
                }
            }
        }
        Ok(None)
    }
}

/// Caption of a container: the first `label` inside it, else its `aria-label`.
pub async fn label_text(container: &LocatorRef) -> Result<Option<String>> {
    let label = container.locator(selectors::LABEL).first();
    if label.count().await? > 0 {
        return Ok(Some(label.text().await?));
    }
    container.attribute(selectors::LABEL_ATTRIBUTE).await
}

/// First element matching `value_selector` inside the container, if any.
pub async fn value_element(
    container: &LocatorRef,
    value_selector: &str,
) -> Result<Option<LocatorRef>> {
    let value = container.locator(value_selector).first();
    if value.count().await? == 0 {
        return Ok(None);
    }
    Ok(Some(value))
}

pub async fn observe_read_only(container: &LocatorRef, value_selector: &str) -> Result<bool> {
    if text::is_truthy_attribute(container.attribute("readonly").await?.as_deref()) {
        return Ok(true);
    }

    if let Some(value) = value_element(container, value_selector).await? {
        if text::is_truthy_attribute(value.attribute("readonly").await?.as_deref()) {
            return Ok(true);
        }
        if value.attribute("aria-readonly").await?.as_deref() == Some("true") {
            return Ok(true);
        }
        if value.is_disabled().await? {
            return Ok(true);
        }
    }

    Ok(container.locator(selectors::LOCK_ICON).count().await? > 0)
}

pub async fn observe_required(container: &LocatorRef, value_selector: &str) -> Result<bool> {
    if let Some(value) = value_element(container, value_selector).await? {
        if text::is_truthy_attribute(value.attribute("required").await?.as_deref()) {
            return Ok(true);
        }
        if value.attribute("aria-required").await?.as_deref() == Some("true") {
            return Ok(true);
        }
        if text::has_required_marker(value.attribute("class").await?.as_deref()) {
            return Ok(true);
        }
    }

    let label = container.locator(selectors::LABEL).first();
    if label.count().await? > 0 {
        return Ok(text::has_required_marker(
            label.attribute("class").await?.as_deref(),
        ));
    }
    Ok(false)
}

pub async fn observe_placeholder(
    container: &LocatorRef,
    value_selector: &str,
) -> Result<Option<String>> {
    let Some(value) = value_element(container, value_selector).await? else {
        return Ok(None);
    };
    let data_placeholder = value.attribute("data-placeholder").await?;
    if let Some(placeholder) = text::normalize_placeholder(data_placeholder.as_deref()) {
        return Ok(Some(placeholder));
    }
    let placeholder = value.attribute("placeholder").await?;
    Ok(text::normalize_placeholder(placeholder.as_deref()))
}
