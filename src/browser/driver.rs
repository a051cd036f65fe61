use super::action::{
    Action, ActionKind, ActionType, ClickAction, PressKeyAction, ScrollAction, SelectAction,
    TypeAction, WaitAction,
};
use super::selector::ElementSelector;
use crate::error::DriverError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A live browser session. Receives actions that have already passed
/// `Action::validate`, so implementations do not re-check invariants.
///
/// Every call may suspend on I/O; callers await each one before issuing the
/// next.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    fn name(&self) -> &str;

    async fn navigate(&self, url: &str, wait_until: &str, timeout_ms: u64)
    -> Result<Value, DriverError>;

    async fn click(&self, action: &ClickAction) -> Result<Value, DriverError>;

    async fn type_text(&self, action: &TypeAction) -> Result<Value, DriverError>;

    async fn scroll(&self, action: &ScrollAction) -> Result<Value, DriverError>;

    async fn wait_for(&self, action: &WaitAction) -> Result<Value, DriverError>;

    async fn press_key(&self, action: &PressKeyAction) -> Result<Value, DriverError>;

    async fn hover(&self, selector: &ElementSelector) -> Result<Value, DriverError>;

    async fn select_option(&self, action: &SelectAction) -> Result<Value, DriverError>;

    /// PNG bytes of the viewport, or the whole page when `full_page` is set.
    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>, DriverError>;

    async fn evaluate_script(&self, code: &str) -> Result<Value, DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    async fn title(&self) -> Result<String, DriverError>;
}

/// Outcome of one executed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutput {
    pub index: usize,
    pub action_type: ActionType,
    pub output: Value,
}

/// Dispatch a validated action to the matching driver call.
pub async fn perform(
    driver: &dyn BrowserDriver,
    index: usize,
    action: &Action,
) -> Result<ActionOutput, DriverError> {
    let output = match action.kind() {
        ActionKind::Click(click) => driver.click(click).await?,
        ActionKind::Type(typing) => driver.type_text(typing).await?,
        ActionKind::Scroll(scroll) => driver.scroll(scroll).await?,
        ActionKind::Navigate(navigate) => {
            driver
                .navigate(&navigate.url, &navigate.wait_until, navigate.timeout_ms)
                .await?
        }
        ActionKind::Wait(wait) => driver.wait_for(wait).await?,
        ActionKind::PressKey(press) => driver.press_key(press).await?,
        ActionKind::Hover(hover) => {
            let selector = hover.selector.as_ref().ok_or_else(|| {
                DriverError::InvalidArgument("hover without a selector".into())
            })?;
            driver.hover(selector).await?
        }
        ActionKind::Select(select) => driver.select_option(select).await?,
    };

    Ok(ActionOutput {
        index,
        action_type: action.action_type(),
        output,
    })
}
