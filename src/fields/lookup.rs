use crate::core::{LocatorRef, PageBinding, WaitState};
use crate::dom::{selectors, text};
use crate::errors::{EngineError, Result};
use crate::fields::base::{FieldCore, FieldSpec};
use crate::fields::behavior::FieldBehavior;
use crate::fields::kind::FieldKind;
use async_trait::async_trait;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupState {
    Idle,
    Cleared,
    Typing,
    AwaitingPanel,
    Polling,
    Selected,
    NotFound,
}

/// An option as rendered in the autocomplete panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOption {
    pub id: Option<String>,
    pub text: String,
    pub disabled: bool,
}

impl LookupOption {
    /// "Add new record" style affordances that must never be selected.
    pub fn is_service(&self) -> bool {
        let id_marks_service = self.id.as_deref().is_some_and(|id| {
            id == selectors::SERVICE_OPTION_ID || id.starts_with(selectors::ADD_NEW_ID_PREFIX)
        });
        id_marks_service || self.text.starts_with(selectors::ADD_NEW_TEXT_PREFIX)
    }

    pub fn is_selectable(&self) -> bool {
        !self.disabled && !self.is_service()
    }
}

/// Index of the option to pick: exact text first, then ignoring case.
pub fn match_option(options: &[LookupOption], wanted: &str) -> Option<usize> {
    let selectable = || {
        options
            .iter()
            .enumerate()
            .filter(|(_, option)| option.is_selectable())
    };
    if let Some((index, _)) = selectable().find(|(_, option)| option.text == wanted) {
        return Some(index);
    }
    let wanted = wanted.to_lowercase();
    selectable()
        .find(|(_, option)| option.text.to_lowercase() == wanted)
        .map(|(index, _)| index)
}

/// Single-select autocomplete backed by asynchronously loaded options.
pub struct LookupField {
    core: FieldCore,
}

impl LookupField {
    pub fn new(spec: FieldSpec, binding: PageBinding) -> Result<Self> {
        Ok(Self {
            core: FieldCore::new(spec, binding)?,
        })
    }

    /// Selected display text, `None` when nothing is selected.
    pub async fn get_value(&mut self, debug: bool) -> Result<Option<String>> {
        let container = self.require_container(debug).await?;
        let raw = container
            .locator(selectors::LOOKUP_VALUE)
            .first()
            .input_value()
            .await?;
        let value = raw.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    pub async fn clear_value(&mut self, debug: bool) -> Result<()> {
        let container = self.require_container(debug).await?;
        self.enter(LookupState::Idle, debug);
        self.clear(&container, debug).await
    }

    /// Select the option whose display text is `text`.
    ///
    /// Fails when no panel appears, when no selectable option matches
    /// within the poll budget, or when the click did not take: the panel
    /// is still open or the field is blank afterwards.
    pub async fn set_value(&mut self, text: &str, debug: bool) -> Result<()> {
        let container = self.require_container(debug).await?;
        self.enter(LookupState::Idle, debug);
        self.clear(&container, debug).await?;

        self.enter(LookupState::Typing, debug);
        let input = container.locator(selectors::LOOKUP_VALUE).first();
        let lookup = self.core.config().lookup.clone();
        input.click(Some(self.core.config().actions.timeout())).await?;
        input.fill(text).await?;

        self.enter(LookupState::AwaitingPanel, debug);
        let panel = self.core.page().locator(selectors::AUTOCOMPLETE_PANEL);
        let panel_timeout = lookup.panel_timeout();
        if let Err(e) = panel.wait_for(WaitState::Visible, panel_timeout).await {
            self.core.trace(debug, format!("panel never appeared: {}", e));
            return Err(EngineError::PanelNotShown {
                field: self.core.describe(),
                text: text.to_string(),
                timeout_ms: panel_timeout.as_millis() as u64,
            });
        }

        self.enter(LookupState::Polling, debug);
        let budget = lookup.poll_budget();
        let deadline = Instant::now() + budget;
        let mut polls = 0usize;
        let option = loop {
            polls += 1;
            let (handles, options): (Vec<_>, Vec<_>) =
                self.scan(&panel, debug).await?.into_iter().unzip();
            if let Some(index) = match_option(&options, text) {
                if let Some(option) = handles.into_iter().nth(index) {
                    break option;
                }
            }
            if Instant::now() >= deadline {
                self.enter(LookupState::NotFound, debug);
                return Err(EngineError::OptionNotFound {
                    field: self.core.describe(),
                    text: text.to_string(),
                    budget_ms: budget.as_millis() as u64,
                });
            }
            self.core.page().wait_for_timeout(lookup.poll_interval()).await;
        };
        self.core
            .trace(debug, format!("'{}' offered after {} poll(s)", text, polls));

        option.click(Some(self.core.config().actions.timeout())).await?;
        self.core.page().wait_for_timeout(lookup.settle_delay()).await;

        // The search text keeps the input non-blank; only a closed panel marks a selection.
        let panel_open = panel.is_visible().await?;
        let selected = self.get_value(debug).await?;
        match selected {
            Some(selected) if !panel_open => {
                self.enter(LookupState::Selected, debug);
                self.core.trace(debug, format!("selected '{}'", selected));
                Ok(())
            }
            selected => {
                self.core.trace(
                    debug,
                    format!(
                        "selection not applied: panel open {}, value {:?}",
                        panel_open, selected
                    ),
                );
                Err(EngineError::SelectionNotApplied {
                    field: self.core.describe(),
                    text: text.to_string(),
                })
            }
        }
    }

    /// Texts of the selectable options currently rendered, without selecting any.
    pub async fn available_options(&mut self, debug: bool) -> Result<Vec<String>> {
        let panel = self.core.page().locator(selectors::AUTOCOMPLETE_PANEL);
        let scanned = self.scan(&panel, debug).await?;
        Ok(scanned
            .into_iter()
            .map(|(_, option)| option)
            .filter(LookupOption::is_selectable)
            .map(|option| option.text)
            .collect())
    }

    async fn clear(&self, container: &LocatorRef, debug: bool) -> Result<()> {
        let icon = container.locator(selectors::CLEAR_ICON).first();
        if icon.count().await? > 0 && icon.is_visible().await? {
            self.core.trace(debug, "clearing via clear icon");
            icon.click(Some(self.core.config().actions.timeout())).await?;
        } else {
            container
                .locator(selectors::LOOKUP_VALUE)
                .first()
                .fill("")
                .await?;
        }
        self.enter(LookupState::Cleared, debug);
        Ok(())
    }

    /// Options that vanish or fail mid-read are skipped.
    async fn scan(
        &self,
        panel: &LocatorRef,
        debug: bool,
    ) -> Result<Vec<(LocatorRef, LookupOption)>> {
        let rendered = panel.locator(selectors::AUTOCOMPLETE_OPTION).all().await?;
        let mut options = Vec::with_capacity(rendered.len());
        for handle in rendered {
            match read_option(&handle).await {
                Ok(option) => options.push((handle, option)),
                Err(e) => self.core.trace(debug, format!("skipping unreadable option: {}", e)),
            }
        }
        Ok(options)
    }

    fn enter(&self, state: LookupState, debug: bool) {
        self.core.trace(debug, format!("lookup state: {:?}", state));
    }
}

async fn read_option(option: &LocatorRef) -> Result<LookupOption> {
    let mut id = None;
    for attribute in selectors::OPTION_ID_ATTRIBUTES {
        if let Some(value) = option.attribute(attribute).await? {
            if !value.trim().is_empty() {
                id = Some(value);
                break;
            }
        }
    }
    let disabled = option.attribute("aria-disabled").await?.as_deref() == Some("true")
        || text::has_disabled_marker(option.attribute("class").await?.as_deref())
        || option.is_disabled().await?;
    let text = option.text().await?.trim().to_string();
    Ok(LookupOption { id, text, disabled })
}

#[async_trait]
impl FieldBehavior for LookupField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut FieldCore {
        &mut self.core
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Lookup
    }

    fn value_selector(&self) -> &'static str {
        selectors::LOOKUP_VALUE
    }
}
