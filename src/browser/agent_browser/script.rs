//! JavaScript snippets for the interactions the CLI has no direct command
//! for. Every snippet is a self-invoking expression that throws when its
//! target element is missing.

use crate::browser::action::{ScrollAction, ScrollDirection};
use crate::browser::selector::{ElementSelector, SelectorStrategy};

fn js_string(raw: &str) -> String {
    serde_json::Value::String(raw.to_string()).to_string()
}

/// CLI selector argument for a strategy.
pub fn selector_arg(selector: &ElementSelector) -> String {
    match selector.strategy() {
        SelectorStrategy::Css => selector.value().to_string(),
        SelectorStrategy::Xpath => format!("xpath={}", selector.value()),
        SelectorStrategy::Text => format!("text={}", selector.value()),
        SelectorStrategy::AriaLabel => aria_css(selector.value()),
    }
}

fn aria_css(label: &str) -> String {
    format!("[aria-label=\"{}\"]", label.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Expression resolving to the selected element, or `null`.
pub fn locator(selector: &ElementSelector) -> String {
    let value = selector.value();
    match selector.strategy() {
        SelectorStrategy::Css => format!("document.querySelector({})", js_string(value)),
        SelectorStrategy::AriaLabel => {
            format!("document.querySelector({})", js_string(&aria_css(value)))
        }
        SelectorStrategy::Xpath => format!(
            "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
            js_string(value)
        ),
        SelectorStrategy::Text => format!(
            "Array.from(document.querySelectorAll('body *')).reverse().find(el => el.textContent && el.textContent.includes({}))",
            js_string(value)
        ),
    }
}

fn with_element(selector: &ElementSelector, body: &str) -> String {
    format!(
        "(() => {{ const el = {}; if (!el) throw new Error('element not found: ' + {}); {body} }})()",
        locator(selector),
        js_string(selector.value())
    )
}

pub fn mouse_button_index(button: &str) -> u8 {
    match button {
        "middle" => 1,
        "right" => 2,
        _ => 0,
    }
}

/// Dispatch a full mouse click sequence with an explicit button, count and
/// modifier state.
pub fn click(
    selector: &ElementSelector,
    button: &str,
    click_count: u32,
    modifiers: &[String],
) -> String {
    let button = mouse_button_index(button);
    let has = |name: &str| modifiers.iter().any(|m| m == name);
    let final_event = match button {
        0 => "click",
        2 => "contextmenu",
        _ => "auxclick",
    };
    let body = format!(
        "const base = {{ bubbles: true, cancelable: true, view: window, button: {button}, \
         altKey: {alt}, ctrlKey: {ctrl}, metaKey: {meta}, shiftKey: {shift} }}; \
         for (let i = 1; i <= {click_count}; i++) {{ \
         el.dispatchEvent(new MouseEvent('mousedown', {{ ...base, detail: i }})); \
         el.dispatchEvent(new MouseEvent('mouseup', {{ ...base, detail: i }})); \
         el.dispatchEvent(new MouseEvent('{final_event}', {{ ...base, detail: i }})); }} \
         if ({click_count} >= 2 && {button} === 0) {{ el.dispatchEvent(new MouseEvent('dblclick', {{ ...base, detail: 2 }})); }} \
         return true;",
        alt = has("Alt"),
        ctrl = has("Control"),
        meta = has("Meta"),
        shift = has("Shift"),
    );
    with_element(selector, &body)
}

/// Scroll the page, or the selected element when one is given.
pub fn scroll(action: &ScrollAction) -> String {
    let behavior = if action.smooth { "smooth" } else { "auto" };
    let amount = action.amount;
    let (method, left, top) = match action.direction {
        ScrollDirection::Up => ("scrollBy", "0".to_string(), format!("-{amount}")),
        ScrollDirection::Down => ("scrollBy", "0".to_string(), amount.to_string()),
        ScrollDirection::Left => ("scrollBy", format!("-{amount}"), "0".to_string()),
        ScrollDirection::Right => ("scrollBy", amount.to_string(), "0".to_string()),
        ScrollDirection::Top => ("scrollTo", "0".to_string(), "0".to_string()),
        ScrollDirection::Bottom => (
            "scrollTo",
            "0".to_string(),
            "target.scrollHeight".to_string(),
        ),
    };
    let call = format!("target.{method}({{ left: {left}, top: {top}, behavior: '{behavior}' }}); return true;");

    match &action.selector {
        Some(selector) => with_element(selector, &format!("const target = el; {call}")),
        None => format!(
            "(() => {{ const target = document.scrollingElement || document.documentElement; {call} }})()"
        ),
    }
}

pub fn select_by_label(selector: &ElementSelector, label: &str) -> String {
    let body = format!(
        "const opt = Array.from(el.options || []).find(o => o.text.trim() === {label}); \
         if (!opt) throw new Error('no option labelled ' + {label}); \
         el.value = opt.value; \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return opt.value;",
        label = js_string(label)
    );
    with_element(selector, &body)
}

pub fn select_by_index(selector: &ElementSelector, index: u32) -> String {
    let body = format!(
        "if (!el.options || {index} >= el.options.length) throw new Error('option index {index} out of range'); \
         el.selectedIndex = {index}; \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return el.value;"
    );
    with_element(selector, &body)
}

/// `true` when the element is attached to the document.
pub fn exists(selector: &ElementSelector) -> String {
    format!("(() => !!({}))()", locator(selector))
}

/// `true` when the element is attached and rendered.
pub fn visible(selector: &ElementSelector) -> String {
    format!(
        "(() => {{ const el = {}; if (!el) return false; const s = window.getComputedStyle(el); \
         return s.display !== 'none' && s.visibility !== 'hidden' && el.getClientRects().length > 0; }})()",
        locator(selector)
    )
}
