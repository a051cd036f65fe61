mod validate;


use super::selector::ElementSelector;
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString, IntoStaticStr};

pub const VALID_BUTTONS: &[&str] = &["left", "right", "middle"];
pub const VALID_MODIFIERS: &[&str] = &["Alt", "Control", "Meta", "Shift"];
pub const VALID_WAIT_UNTIL: &[&str] = &["load", "networkidle", "domcontentloaded"];
pub const ALLOWED_URL_SCHEMES: &[&str] = &["http", "https", "file", "about"];
/// Exact, case-sensitive prefixes a navigation URL must start with.
pub const ALLOWED_URL_PREFIXES: &[&str] = &["http://", "https://", "file://", "about:"];

/// Discriminant of an [`Action`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionType {
    Click,
    Type,
    Scroll,
    Navigate,
    Wait,
    PressKey,
    Hover,
    Select,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    #[default]
    Down,
    Left,
    Right,
    Top,
    Bottom,
}

impl ScrollDirection {
    /// Top/Bottom jump to an edge and ignore the amount.
    pub fn is_directional(self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::Left | Self::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WaitCondition {
    ElementVisible,
    ElementHidden,
    ElementExists,
    Timeout,
    Networkidle,
    Load,
}

impl WaitCondition {
    pub fn needs_selector(self) -> bool {
        matches!(
            self,
            Self::ElementVisible | Self::ElementHidden | Self::ElementExists
        )
    }
}

/// Common key names accepted by drivers. `PressKey` takes any non-blank key,
/// these are just the ones planners usually emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum KeyboardKey {
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
}

fn default_button() -> String {
    "left".into()
}

fn default_click_count() -> u32 {
    1
}

fn default_scroll_amount() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

fn default_wait_until() -> String {
    "load".into()
}

fn default_navigate_timeout_ms() -> u64 {
    30_000
}

fn default_wait_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickAction {
    #[serde(default)]
    pub selector: Option<ElementSelector>,
    #[serde(default = "default_button")]
    pub button: String,
    #[serde(default = "default_click_count")]
    pub click_count: u32,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAction {
    #[serde(default)]
    pub selector: Option<ElementSelector>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub clear_first: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollAction {
    #[serde(default)]
    pub direction: ScrollDirection,
    #[serde(default = "default_scroll_amount")]
    pub amount: u32,
    #[serde(default)]
    pub selector: Option<ElementSelector>,
    #[serde(default = "default_true")]
    pub smooth: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigateAction {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_wait_until")]
    pub wait_until: String,
    #[serde(default = "default_navigate_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitAction {
    #[serde(default)]
    pub condition: Option<WaitCondition>,
    #[serde(default)]
    pub selector: Option<ElementSelector>,
    #[serde(default = "default_wait_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressKeyAction {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverAction {
    #[serde(default)]
    pub selector: Option<ElementSelector>,
}

/// Exactly one of `value`, `label`, `index` must be set; enforced by
/// `validate()`, not by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectAction {
    #[serde(default)]
    pub selector: Option<ElementSelector>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
}

/// The closed set of atomic browser operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Click(ClickAction),
    Type(TypeAction),
    Scroll(ScrollAction),
    Navigate(NavigateAction),
    Wait(WaitAction),
    PressKey(PressKeyAction),
    Hover(HoverAction),
    Select(SelectAction),
}

impl ActionKind {
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Click(_) => ActionType::Click,
            Self::Type(_) => ActionType::Type,
            Self::Scroll(_) => ActionType::Scroll,
            Self::Navigate(_) => ActionType::Navigate,
            Self::Wait(_) => ActionType::Wait,
            Self::PressKey(_) => ActionType::PressKey,
            Self::Hover(_) => ActionType::Hover,
            Self::Select(_) => ActionType::Select,
        }
    }
}

/// One atomic browser operation plus its creation time and caller metadata.
///
/// The variant is fixed when the action is built; there is no way to swap it
/// afterwards, so the discriminant can never disagree with the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(flatten)]
    kind: ActionKind,
    #[serde(rename = "timestamp", default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            created_at: Utc::now(),
            metadata: Map::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn action_type(&self) -> ActionType {
        self.kind.action_type()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Re-check every invariant of the variant. Reports the first violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::validate_kind(&self.kind)
    }

    /// Canonical structured form: `type`, variant fields, ISO-8601 `timestamp`
    /// and `metadata`.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            tracing::error!(error = %err, "action serialization failed");
            Value::Null
        })
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    // ── Convenience constructors ────────────────────────────────────────

    pub fn click(selector: ElementSelector) -> Self {
        Self::new(ActionKind::Click(ClickAction {
            selector: Some(selector),
            button: default_button(),
            click_count: default_click_count(),
            modifiers: Vec::new(),
        }))
    }

    pub fn type_text(selector: ElementSelector, text: impl Into<String>) -> Self {
        Self::new(ActionKind::Type(TypeAction {
            selector: Some(selector),
            text: text.into(),
            delay_ms: 0,
            clear_first: false,
        }))
    }

    pub fn scroll(direction: ScrollDirection, amount: u32) -> Self {
        Self::new(ActionKind::Scroll(ScrollAction {
            direction,
            amount,
            selector: None,
            smooth: true,
        }))
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self::new(ActionKind::Navigate(NavigateAction {
            url: url.into(),
            wait_until: default_wait_until(),
            timeout_ms: default_navigate_timeout_ms(),
        }))
    }

    pub fn wait(condition: WaitCondition, timeout_ms: u64) -> Self {
        Self::new(ActionKind::Wait(WaitAction {
            condition: Some(condition),
            selector: None,
            timeout_ms,
        }))
    }

    pub fn wait_for_element(
        condition: WaitCondition,
        selector: ElementSelector,
        timeout_ms: u64,
    ) -> Self {
        Self::new(ActionKind::Wait(WaitAction {
            condition: Some(condition),
            selector: Some(selector),
            timeout_ms,
        }))
    }

    pub fn press_key(key: impl Into<String>) -> Self {
        Self::new(ActionKind::PressKey(PressKeyAction {
            key: key.into(),
            modifiers: Vec::new(),
        }))
    }

    pub fn hover(selector: ElementSelector) -> Self {
        Self::new(ActionKind::Hover(HoverAction {
            selector: Some(selector),
        }))
    }

    pub fn select_value(selector: ElementSelector, value: impl Into<String>) -> Self {
        Self::new(ActionKind::Select(SelectAction {
            selector: Some(selector),
            value: Some(value.into()),
            label: None,
            index: None,
        }))
    }

    pub fn select_label(selector: ElementSelector, label: impl Into<String>) -> Self {
        Self::new(ActionKind::Select(SelectAction {
            selector: Some(selector),
            value: None,
            label: Some(label.into()),
            index: None,
        }))
    }

    pub fn select_index(selector: ElementSelector, index: u32) -> Self {
        Self::new(ActionKind::Select(SelectAction {
            selector: Some(selector),
            value: None,
            label: None,
            index: Some(index),
        }))
    }
}

impl From<ActionKind> for Action {
    fn from(kind: ActionKind) -> Self {
        Self::new(kind)
    }
}
