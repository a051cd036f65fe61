//! Parsing of planner output. Planners usually answer with JSON, sometimes
//! wrapped in a Markdown code fence.

use super::roadmap::RoadmapStep;
use crate::browser::action::Action;
use crate::error::PlanError;
use serde_json::Value;

/// Strip a surrounding Markdown code fence (```` ```json ```` or bare
/// ```` ``` ````) if present, returning the fenced body.
pub fn strip_code_fence(text: &str) -> &str {
    let body = if let Some((_, rest)) = text.split_once("```json") {
        rest
    } else if let Some((_, rest)) = text.split_once("```") {
        rest
    } else {
        return text.trim();
    };
    body.split_once("```").map_or(body, |(inner, _)| inner).trim()
}

/// Parse a JSON array of roadmap steps.
pub fn parse_roadmap(text: &str) -> Result<Vec<RoadmapStep>, PlanError> {
    serde_json::from_str(strip_code_fence(text))
        .map_err(|e| PlanError::Parse(format!("invalid roadmap: {e}")))
}

/// Parse a list of serialized actions from `{"steps": [...]}`,
/// `{"actions": [...]}`, or a bare array.
pub fn parse_action_plan(text: &str) -> Result<Vec<Action>, PlanError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| PlanError::Parse(format!("invalid action plan: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("steps").or_else(|| map.remove("actions")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(PlanError::Parse(
                    "action plan must contain a \"steps\" or \"actions\" array".into(),
                ));
            }
        },
        _ => {
            return Err(PlanError::Parse(
                "action plan must be an array or object".into(),
            ));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            Action::from_value(item)
                .map_err(|e| PlanError::Parse(format!("action {}: {e}", index + 1)))
        })
        .collect()
}
