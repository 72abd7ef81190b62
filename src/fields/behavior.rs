use crate::core::LocatorRef;
use crate::dom::{selectors, text};
use crate::errors::Result;
use crate::fields::base::{self, FieldCore};
use crate::fields::kind::FieldKind;
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Behaviour shared by every field kind.
///
/// Kinds supply their identity and markup through the required methods and
/// may override the detection rules; the checks themselves are provided.
#[async_trait]
pub trait FieldBehavior: Send + Sync {
    fn core(&self) -> &FieldCore;

    fn core_mut(&mut self) -> &mut FieldCore;

    fn kind(&self) -> FieldKind;

    fn container_selector(&self) -> String {
        selectors::by_code(self.kind().host_tag(), self.core().code())
    }

    /// Element holding the value inside the container
    fn value_selector(&self) -> &'static str {
        selectors::TEXT_VALUE
    }

    async fn observe_read_only(&self, container: &LocatorRef) -> Result<bool> {
        base::observe_read_only(container, self.value_selector()).await
    }

    async fn observe_required(&self, container: &LocatorRef) -> Result<bool> {
        base::observe_required(container, self.value_selector()).await
    }

    async fn observe_placeholder(&self, container: &LocatorRef) -> Result<Option<String>> {
        base::observe_placeholder(container, self.value_selector()).await
    }

    async fn container(
        &mut self,
        debug: bool,
        timeout: Option<Duration>,
    ) -> Result<Option<LocatorRef>> {
        let selector = self.container_selector();
        self.core_mut()
            .resolve_container(&selector, debug, timeout)
            .await
    }

    /// Container for value operations, which assume the field exists.
    async fn require_container(&mut self, debug: bool) -> Result<LocatorRef> {
        match self.container(debug, None).await? {
            Some(container) => Ok(container),
            None => Err(self.core().not_found()),
        }
    }

    /// False when the field is absent or resolution was aborted.
    async fn exists(&mut self, debug: bool, timeout: Option<Duration>) -> bool {
        match self.container(debug, timeout).await {
            Ok(container) => container.is_some(),
            Err(e) => {
                warn!("Field {} could not be resolved: {}", self.core().describe(), e);
                false
            }
        }
    }

    async fn check_read_only(&mut self, debug: bool) -> Result<bool> {
        let Some(container) = self.container(debug, None).await? else {
            return Ok(false);
        };
        let observed = self.observe_read_only(&container).await?;
        let expected = self.core().spec().read_only;
        self.core().trace(
            debug,
            format!("read-only expected {}, observed {}", expected, observed),
        );
        Ok(observed == expected)
    }

    async fn check_required(&mut self, debug: bool) -> Result<bool> {
        let Some(container) = self.container(debug, None).await? else {
            return Ok(false);
        };
        let observed = self.observe_required(&container).await?;
        let expected = self.core().spec().required;
        self.core().trace(
            debug,
            format!("required expected {}, observed {}", expected, observed),
        );
        Ok(observed == expected)
    }

    async fn check_placeholder(&mut self, debug: bool) -> Result<bool> {
        let Some(container) = self.container(debug, None).await? else {
            return Ok(false);
        };
        let observed = self.observe_placeholder(&container).await?;
        let expected = text::normalize_placeholder(self.core().spec().placeholder.as_deref());
        self.core().trace(
            debug,
            format!("placeholder expected {:?}, observed {:?}", expected, observed),
        );
        Ok(observed == expected)
    }

    /// Existence, read-only, required and placeholder, stopping at the first failure.
    async fn check_field(&mut self, debug: bool, timeout: Option<Duration>) -> Result<bool> {
        if self.container(debug, timeout).await?.is_none() {
            self.core().trace(debug, "check failed: field not found");
            return Ok(false);
        }
        if !self.check_read_only(debug).await? {
            self.core().trace(debug, "check failed: read-only state");
            return Ok(false);
        }
        if !self.check_required(debug).await? {
            self.core().trace(debug, "check failed: required state");
            return Ok(false);
        }
        if !self.check_placeholder(debug).await? {
            self.core().trace(debug, "check failed: placeholder");
            return Ok(false);
        }
        Ok(true)
    }

    fn invalidate(&mut self) {
        self.core_mut().invalidate();
    }
}
