use crate::core::{LocatorRef, PageBinding, WaitState};
use crate::dom::selectors;
use crate::errors::{EngineError, Result};
use std::time::Duration;

/// A page button identified by code and, optionally, its caption.
///
/// Buttons keep no resolved handle: every call queries the page again, so
/// a button survives re-renders without explicit invalidation.
#[derive(Clone)]
pub struct Button {
    code: String,
    title: Option<String>,
    binding: PageBinding,
}

impl Button {
    pub fn new(code: impl Into<String>, title: Option<String>, binding: PageBinding) -> Result<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(EngineError::config("button code must not be blank"));
        }
        let title = title.filter(|title| !title.trim().is_empty());
        Ok(Self {
            code,
            title,
            binding,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn describe(&self) -> String {
        match &self.title {
            Some(title) => format!("'{}' ({})", title, self.code),
            None => format!("({})", self.code),
        }
    }

    /// Visible within `timeout` (the action timeout by default) and, when a
    /// title is set, captioned with it ignoring case.
    pub async fn exists(&self, debug: bool, timeout: Option<Duration>) -> bool {
        match self.locate(debug, timeout).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                self.trace(debug, format!("lookup failed: {}", e));
                false
            }
        }
    }

    pub async fn click(&self, debug: bool) -> Result<()> {
        let Some(button) = self.locate(debug, None).await? else {
            return Err(EngineError::ButtonNotFound(self.describe()));
        };
        if button.is_disabled().await? {
            self.trace(debug, "button is disabled");
            return Err(EngineError::ButtonDisabled(self.describe()));
        }
        self.trace(debug, "clicking");
        button
            .click(Some(self.binding.config.actions.timeout()))
            .await
    }

    async fn locate(&self, debug: bool, timeout: Option<Duration>) -> Result<Option<LocatorRef>> {
        let selector = selectors::button(&self.code);
        let candidates = self.binding.page.locator(&selector);
        let timeout = timeout.unwrap_or_else(|| self.binding.config.actions.timeout());

        if let Err(e) = candidates.wait_for(WaitState::Visible, timeout).await {
            self.trace(debug, format!("not visible within {}ms: {}", timeout.as_millis(), e));
            return Ok(None);
        }

        for candidate in candidates.all().await? {
            if !candidate.is_visible().await? {
                continue;
            }
            match &self.title {
                None => return Ok(Some(candidate)),
                Some(title) => {
                    let caption = candidate.text().await?;
                    if caption.trim().to_lowercase() == title.trim().to_lowercase() {
                        return Ok(Some(candidate));
                    }
                    self.trace(debug, format!("caption '{}' does not match", caption.trim()));
                }
            }
        }
        Ok(None)
    }

    fn trace(&self, debug: bool, message: impl AsRef<str>) {
        if debug {
            self.binding
                .sink
                .log(&format!("[button {}] {}", self.describe(), message.as_ref()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemorySink;
    use crate::testing::{FakeElement, FakePage};
    use std::sync::Arc;

    fn button(page: &FakePage, title: Option<&str>) -> Button {
        Button::new(
            "Save",
            title.map(str::to_string),
            PageBinding::new(page.handle()),
        )
        .unwrap()
    }

    #[test]
    fn test_blank_title_means_code_only() {
        let page = FakePage::new();
        let save = button(&page, Some("  "));
        assert_eq!(save.title(), None);
        assert_eq!(save.describe(), "(Save)");
        assert!(Button::new(" ", None, PageBinding::new(page.handle())).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_caption_is_matched_ignoring_case() {
        let page = FakePage::new();
        page.add(&selectors::button("Save"), FakeElement::new().with_text(" SAVE "));

        assert!(button(&page, Some("Save")).exists(false, None).await);
        assert!(button(&page, None).exists(false, None).await);
        assert!(!button(&page, Some("Save and close")).exists(false, None).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_button_does_not_exist() {
        let page = FakePage::new();
        page.add(&selectors::button("Save"), FakeElement::new().hidden());
        let started = tokio::time::Instant::now();

        assert!(!button(&page, None)
            .exists(false, Some(Duration::from_secs(2)))
            .await);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click() {
        let page = FakePage::new();
        let element = FakeElement::new().with_text("Save");
        page.add(&selectors::button("Save"), element.clone());

        button(&page, Some("Save")).click(false).await.unwrap();
        assert_eq!(element.click_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_button_is_not_clicked() {
        let page = FakePage::new();
        let element = FakeElement::new().with_text("Save").disabled();
        page.add(&selectors::button("Save"), element.clone());

        let err = button(&page, None).click(false).await.unwrap_err();
        assert!(matches!(err, EngineError::ButtonDisabled(_)));
        assert_eq!(element.click_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_button_is_reported() {
        let page = FakePage::new();
        let err = button(&page, Some("Save")).click(false).await.unwrap_err();
        assert!(matches!(err, EngineError::ButtonNotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_call_queries_the_page() {
        let page = FakePage::new();
        page.add(&selectors::button("Save"), FakeElement::new());
        let sink = Arc::new(MemorySink::new());
        let save = Button::new(
            "Save",
            None,
            PageBinding::new(page.handle()).with_sink(sink.clone()),
        )
        .unwrap();

        assert!(save.exists(true, None).await);
        assert!(save.exists(true, None).await);
        assert_eq!(page.wait_count(&selectors::button("Save")), 2);

        page.remove_all(&selectors::button("Save"));
        assert!(!save.exists(true, Some(Duration::from_millis(100))).await);
        assert!(sink.contains("not visible within 100ms"));
    }
}
