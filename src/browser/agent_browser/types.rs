use serde::Deserialize;
use serde_json::Value;

/// Response from `agent-browser ... --json`
#[derive(Debug, Deserialize)]
pub struct AgentBrowserResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Read a boolean out of a response payload. Accepts a bare bool or an object
/// carrying one under `visible`, `result`, or `value`.
pub fn data_as_bool(data: &Value) -> Option<bool> {
    if let Some(flag) = data.as_bool() {
        return Some(flag);
    }
    ["visible", "result", "value"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_bool))
}

/// Read a string out of a response payload, bare or under `key`.
pub fn data_as_string(data: &Value, key: &str) -> Option<String> {
    data.as_str()
        .or_else(|| data.get(key).and_then(Value::as_str))
        .or_else(|| data.get("output").and_then(Value::as_str))
        .map(String::from)
}
