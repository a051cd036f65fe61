use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString, IntoStaticStr};

/// How an [`ElementSelector`] locates its target.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SelectorStrategy {
    #[default]
    Css,
    Xpath,
    Text,
    AriaLabel,
}

/// Identifies a target element in a document.
///
/// Validated once at construction; a selector that exists is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSelector", into = "RawSelector")]
pub struct ElementSelector {
    value: String,
    strategy: SelectorStrategy,
}

impl ElementSelector {
    pub fn new(
        value: impl Into<String>,
        strategy: SelectorStrategy,
    ) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::new(
                "selector",
                "selector value cannot be empty",
            ));
        }
        Ok(Self { value, strategy })
    }

    pub fn css(value: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(value, SelectorStrategy::Css)
    }

    pub fn xpath(value: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(value, SelectorStrategy::Xpath)
    }

    pub fn text(value: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(value, SelectorStrategy::Text)
    }

    pub fn aria_label(value: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(value, SelectorStrategy::AriaLabel)
    }

    /// Build from an untyped strategy name (`css`, `xpath`, `text`, `aria-label`).
    pub fn parse(value: impl Into<String>, strategy: &str) -> Result<Self, ValidationError> {
        let strategy = SelectorStrategy::from_str(strategy).map_err(|_| {
            ValidationError::new(
                "strategy",
                format!(
                    "invalid selector type: {strategy}. Must be one of css, xpath, text, aria-label"
                ),
            )
        })?;
        Self::new(value, strategy)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn strategy(&self) -> SelectorStrategy {
        self.strategy
    }
}

#[derive(Serialize, Deserialize)]
struct RawSelector {
    value: String,
    #[serde(rename = "type", default = "default_strategy")]
    strategy: String,
}

fn default_strategy() -> String {
    "css".into()
}

impl TryFrom<RawSelector> for ElementSelector {
    type Error = ValidationError;

    fn try_from(raw: RawSelector) -> Result<Self, Self::Error> {
        Self::parse(raw.value, &raw.strategy)
    }
}

impl From<ElementSelector> for RawSelector {
    fn from(selector: ElementSelector) -> Self {
        Self {
            value: selector.value,
            strategy: selector.strategy.to_string(),
        }
    }
}
