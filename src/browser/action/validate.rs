use super::{
    ALLOWED_URL_PREFIXES, ALLOWED_URL_SCHEMES, ActionKind, ClickAction, HoverAction,
    NavigateAction, PressKeyAction, ScrollAction, SelectAction, TypeAction, VALID_BUTTONS,
    VALID_MODIFIERS, VALID_WAIT_UNTIL, WaitAction,
};
use crate::browser::selector::ElementSelector;
use crate::error::ValidationError;

pub(super) fn validate_kind(kind: &ActionKind) -> Result<(), ValidationError> {
    match kind {
        ActionKind::Click(click) => validate_click(click),
        ActionKind::Type(typing) => validate_type(typing),
        ActionKind::Scroll(scroll) => validate_scroll(scroll),
        ActionKind::Navigate(navigate) => validate_navigate(navigate),
        ActionKind::Wait(wait) => validate_wait(wait),
        ActionKind::PressKey(press) => validate_press_key(press),
        ActionKind::Hover(hover) => validate_hover(hover),
        ActionKind::Select(select) => validate_select(select),
    }
}

fn require_selector(
    selector: Option<&ElementSelector>,
    variant: &str,
) -> Result<(), ValidationError> {
    if selector.is_none() {
        return Err(ValidationError::new(
            "selector",
            format!("{variant} requires a selector"),
        ));
    }
    Ok(())
}

fn validate_modifiers(modifiers: &[String]) -> Result<(), ValidationError> {
    if let Some(invalid) = modifiers
        .iter()
        .find(|m| !VALID_MODIFIERS.contains(&m.as_str()))
    {
        return Err(ValidationError::new(
            "modifiers",
            format!(
                "invalid modifier: {invalid}. Must be one of {}",
                VALID_MODIFIERS.join(", ")
            ),
        ));
    }
    Ok(())
}

fn validate_click(click: &ClickAction) -> Result<(), ValidationError> {
    require_selector(click.selector.as_ref(), "click")?;

    if !VALID_BUTTONS.contains(&click.button.as_str()) {
        return Err(ValidationError::new(
            "button",
            format!(
                "invalid button: {}. Must be one of {}",
                click.button,
                VALID_BUTTONS.join(", ")
            ),
        ));
    }

    if click.click_count < 1 {
        return Err(ValidationError::new(
            "click_count",
            "click_count must be >= 1",
        ));
    }

    validate_modifiers(&click.modifiers)
}

fn validate_type(typing: &TypeAction) -> Result<(), ValidationError> {
    // delay_ms is unsigned, so the non-negative rule holds by construction.
    require_selector(typing.selector.as_ref(), "type")
}

fn validate_scroll(scroll: &ScrollAction) -> Result<(), ValidationError> {
    if scroll.direction.is_directional() && scroll.amount == 0 {
        return Err(ValidationError::new(
            "amount",
            "amount must be > 0 for directional scrolls",
        ));
    }
    Ok(())
}

fn validate_navigate(navigate: &NavigateAction) -> Result<(), ValidationError> {
    let raw = navigate.url.trim();
    if raw.is_empty() {
        return Err(ValidationError::new("url", "url cannot be empty"));
    }

    if !ALLOWED_URL_PREFIXES
        .iter()
        .any(|prefix| raw.starts_with(prefix))
    {
        let scheme = raw.split_once(':').map_or(raw, |(scheme, _)| scheme);
        return Err(ValidationError::new(
            "url",
            format!(
                "invalid URL scheme: {scheme}. Must be one of {}",
                ALLOWED_URL_SCHEMES.join(", ")
            ),
        ));
    }

    url::Url::parse(raw)
        .map_err(|err| ValidationError::new("url", format!("malformed url {raw}: {err}")))?;

    if !VALID_WAIT_UNTIL.contains(&navigate.wait_until.as_str()) {
        return Err(ValidationError::new(
            "wait_until",
            format!(
                "invalid wait_until: {}. Must be one of {}",
                navigate.wait_until,
                VALID_WAIT_UNTIL.join(", ")
            ),
        ));
    }

    if navigate.timeout_ms == 0 {
        return Err(ValidationError::new("timeout_ms", "timeout_ms must be > 0"));
    }

    Ok(())
}

fn validate_wait(wait: &WaitAction) -> Result<(), ValidationError> {
    let Some(condition) = wait.condition else {
        return Err(ValidationError::new(
            "condition",
            "wait requires a condition",
        ));
    };

    if condition.needs_selector() && wait.selector.is_none() {
        return Err(ValidationError::new(
            "selector",
            format!("condition {condition} requires a selector"),
        ));
    }

    if wait.timeout_ms == 0 {
        return Err(ValidationError::new("timeout_ms", "timeout_ms must be > 0"));
    }

    Ok(())
}

fn validate_press_key(press: &PressKeyAction) -> Result<(), ValidationError> {
    if press.key.trim().is_empty() {
        return Err(ValidationError::new("key", "key cannot be empty"));
    }
    validate_modifiers(&press.modifiers)
}

fn validate_hover(hover: &HoverAction) -> Result<(), ValidationError> {
    require_selector(hover.selector.as_ref(), "hover")
}

fn validate_select(select: &SelectAction) -> Result<(), ValidationError> {
    require_selector(select.selector.as_ref(), "select")?;

    let provided = [
        select.value.is_some(),
        select.label.is_some(),
        select.index.is_some(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count();

    match provided {
        0 => Err(ValidationError::new(
            "option",
            "select requires one of: value, label, or index",
        )),
        1 => Ok(()),
        _ => Err(ValidationError::new(
            "option",
            "select accepts only one of: value, label, or index",
        )),
    }
}
