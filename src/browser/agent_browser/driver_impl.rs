use super::domain::NavigationPolicy;
use super::script;
use super::types::{AgentBrowserResponse, data_as_bool, data_as_string};
use crate::browser::action::{
    ClickAction, PressKeyAction, ScrollAction, SelectAction, TypeAction, WaitAction,
    WaitCondition,
};
use crate::browser::driver::BrowserDriver;
use crate::browser::screenshot;
use crate::browser::selector::ElementSelector;
use crate::config::BrowserConfig;
use crate::error::DriverError;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// [`BrowserDriver`] backed by the `agent-browser` CLI. Every call runs one
/// (or a few) `agent-browser <command> --json` processes against a named
/// session, so state lives in the CLI's browser daemon.
pub struct AgentBrowserDriver {
    binary: String,
    session_name: Option<String>,
    headless: bool,
    command_timeout_ms: u64,
    policy: NavigationPolicy,
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_string()).collect()
}

fn required<'a>(
    selector: Option<&'a ElementSelector>,
    action: &str,
) -> Result<&'a ElementSelector, DriverError> {
    selector.ok_or_else(|| DriverError::InvalidArgument(format!("{action} without a selector")))
}

fn remap_interaction(
    err: DriverError,
    map: impl FnOnce(String) -> DriverError,
) -> DriverError {
    match err {
        DriverError::Interaction { message, .. } => map(message),
        other => other,
    }
}

impl AgentBrowserDriver {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            session_name: config.session_name.clone(),
            headless: config.headless,
            command_timeout_ms: config.command_timeout_ms,
            policy: NavigationPolicy::from_config(config),
        }
    }

    /// Check that the CLI can be spawned
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok_and(|s| s.success())
    }

    /// Close the browser session
    pub async fn close(&self) -> Result<(), DriverError> {
        self.run_command("close", &args(&["close"]), self.command_timeout_ms)
            .await
            .map(|_| ())
    }

    pub(super) fn command_args(&self, args: &[String]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 4);
        if let Some(session) = &self.session_name {
            full.push("--session".to_string());
            full.push(session.clone());
        }
        if !self.headless {
            full.push("--headed".to_string());
        }
        full.extend(args.iter().cloned());
        full.push("--json".to_string());
        full
    }

    /// Run one CLI command and return its `data` payload.
    async fn run_command(
        &self,
        action: &str,
        args: &[String],
        timeout_ms: u64,
    ) -> Result<Value, DriverError> {
        let full = self.command_args(args);
        debug!(binary = %self.binary, args = %full.join(" "), "running browser command");

        let mut cmd = Command::new(&self.binary);
        cmd.args(&full)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_millis(timeout_ms), cmd.output())
            .await
            .map_err(|_| DriverError::Timeout {
                action: action.to_string(),
                timeout_ms,
            })?
            .map_err(|e| DriverError::Unavailable(format!("failed to run {}: {e}", self.binary)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "browser command stderr");
        }

        let response = serde_json::from_str::<AgentBrowserResponse>(stdout.trim())
            .unwrap_or_else(|_| {
                if output.status.success() {
                    AgentBrowserResponse {
                        success: true,
                        data: Some(json!({ "output": stdout.trim() })),
                        error: None,
                    }
                } else {
                    AgentBrowserResponse {
                        success: false,
                        data: None,
                        error: Some(stderr.trim().to_string()),
                    }
                }
            });

        if response.success {
            Ok(response.data.unwrap_or(Value::Null))
        } else {
            Err(DriverError::Interaction {
                action: action.to_string(),
                message: response
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "unknown error".to_string()),
            })
        }
    }

    async fn run(&self, action: &str, args: &[String]) -> Result<Value, DriverError> {
        self.run_command(action, args, self.command_timeout_ms).await
    }

    async fn eval(&self, action: &str, code: String) -> Result<Value, DriverError> {
        self.run(action, &["eval".to_string(), code]).await
    }

    async fn probe(&self, condition: WaitCondition, selector: &ElementSelector) -> Result<bool, DriverError> {
        let code = match condition {
            WaitCondition::ElementExists => script::exists(selector),
            _ => script::visible(selector),
        };
        let data = self.eval("wait", code).await?;
        let flag = data_as_bool(&data).unwrap_or(false);
        Ok(match condition {
            WaitCondition::ElementHidden => !flag,
            _ => flag,
        })
    }

    /// Poll an element condition until it holds or the timeout elapses.
    async fn poll_element(
        &self,
        condition: WaitCondition,
        selector: &ElementSelector,
        timeout_ms: u64,
    ) -> Result<Value, DriverError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.probe(condition, selector).await? {
                return Ok(json!({ "condition": condition, "satisfied": true }));
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    action: format!("wait for {condition}"),
                    timeout_ms,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BrowserDriver for AgentBrowserDriver {
    fn name(&self) -> &str {
        "agent-browser"
    }

    async fn navigate(
        &self,
        url: &str,
        wait_until: &str,
        timeout_ms: u64,
    ) -> Result<Value, DriverError> {
        self.policy
            .check(url)
            .map_err(|message| DriverError::Navigation {
                url: url.to_string(),
                message,
            })?;

        let to_navigation = |message: String| DriverError::Navigation {
            url: url.to_string(),
            message,
        };
        let data = self
            .run_command("navigate", &args(&["open", url]), timeout_ms)
            .await
            .map_err(|e| remap_interaction(e, to_navigation))?;

        if wait_until != "load" {
            self.run_command("navigate", &args(&["wait", "--load", wait_until]), timeout_ms)
                .await
                .map_err(|e| remap_interaction(e, to_navigation))?;
        }

        Ok(data)
    }

    async fn click(&self, action: &ClickAction) -> Result<Value, DriverError> {
        let selector = required(action.selector.as_ref(), "click")?;
        let target = script::selector_arg(selector);

        if action.button == "left" && action.modifiers.is_empty() {
            match action.click_count {
                1 => return self.run("click", &args(&["click", &target])).await,
                2 => return self.run("click", &args(&["dblclick", &target])).await,
                _ => {}
            }
        }

        let code = script::click(
            selector,
            &action.button,
            action.click_count,
            &action.modifiers,
        );
        self.eval("click", code).await
    }

    async fn type_text(&self, action: &TypeAction) -> Result<Value, DriverError> {
        let selector = required(action.selector.as_ref(), "type")?;
        let target = script::selector_arg(selector);

        if action.clear_first {
            self.run("type", &args(&["fill", &target, ""])).await?;
        }

        if action.delay_ms == 0 {
            self.run("type", &args(&["type", &target, &action.text]))
                .await?;
        } else {
            let delay = Duration::from_millis(action.delay_ms);
            let mut buf = [0u8; 4];
            for (i, ch) in action.text.chars().enumerate() {
                if i > 0 {
                    tokio::time::sleep(delay).await;
                }
                let key = ch.encode_utf8(&mut buf);
                self.run("type", &args(&["type", &target, key])).await?;
            }
        }

        Ok(json!({ "typed": action.text.chars().count() }))
    }

    async fn scroll(&self, action: &ScrollAction) -> Result<Value, DriverError> {
        if action.selector.is_none() && action.direction.is_directional() && !action.smooth {
            let direction = action.direction.to_string();
            let amount = action.amount.to_string();
            return self
                .run("scroll", &args(&["scroll", &direction, &amount]))
                .await;
        }
        self.eval("scroll", script::scroll(action)).await
    }

    async fn wait_for(&self, action: &WaitAction) -> Result<Value, DriverError> {
        let condition = action
            .condition
            .ok_or_else(|| DriverError::InvalidArgument("wait without a condition".into()))?;
        let timeout_ms = action.timeout_ms;

        match condition {
            WaitCondition::Timeout => {
                tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
                Ok(json!({ "waited_ms": timeout_ms }))
            }
            WaitCondition::Load | WaitCondition::Networkidle => {
                let state = condition.to_string();
                self.run_command(
                    "wait",
                    &args(&["wait", "--load", &state]),
                    timeout_ms.max(self.command_timeout_ms),
                )
                .await
            }
            WaitCondition::ElementVisible
            | WaitCondition::ElementHidden
            | WaitCondition::ElementExists => {
                let selector = required(action.selector.as_ref(), "wait")?;
                self.poll_element(condition, selector, timeout_ms).await
            }
        }
    }

    async fn press_key(&self, action: &PressKeyAction) -> Result<Value, DriverError> {
        let mut combo = action.modifiers.clone();
        combo.push(action.key.clone());
        let combo = combo.join("+");
        self.run("press_key", &args(&["press", &combo])).await
    }

    async fn hover(&self, selector: &ElementSelector) -> Result<Value, DriverError> {
        let target = script::selector_arg(selector);
        self.run("hover", &args(&["hover", &target])).await
    }

    async fn select_option(&self, action: &SelectAction) -> Result<Value, DriverError> {
        let selector = required(action.selector.as_ref(), "select")?;

        if let Some(value) = &action.value {
            let target = script::selector_arg(selector);
            return self.run("select", &args(&["select", &target, value])).await;
        }
        if let Some(label) = &action.label {
            return self.eval("select", script::select_by_label(selector, label)).await;
        }
        if let Some(index) = action.index {
            return self.eval("select", script::select_by_index(selector, index)).await;
        }
        Err(DriverError::InvalidArgument(
            "select without a value, label, or index".into(),
        ))
    }

    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>, DriverError> {
        let path = std::env::temp_dir().join(format!("stepwise-{}.png", uuid::Uuid::new_v4()));
        let path_arg = path.to_string_lossy().into_owned();

        let mut command = vec!["screenshot".to_string(), path_arg];
        if full_page {
            command.push("--full".to_string());
        }
        self.run("screenshot", &command)
            .await
            .map_err(|e| remap_interaction(e, DriverError::Screenshot))?;

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| DriverError::Screenshot(format!("failed to read {}: {e}", path.display())));
        let _ = tokio::fs::remove_file(&path).await;
        let bytes = bytes?;

        if !screenshot::is_valid(&bytes) {
            return Err(DriverError::Screenshot(
                "captured file is not a PNG or JPEG image".into(),
            ));
        }
        Ok(bytes)
    }

    async fn evaluate_script(&self, code: &str) -> Result<Value, DriverError> {
        self.eval("evaluate_script", code.to_string())
            .await
            .map_err(|e| remap_interaction(e, DriverError::Script))
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let data = self.run("get_url", &args(&["get", "url"])).await?;
        data_as_string(&data, "url").ok_or_else(|| DriverError::Interaction {
            action: "get_url".into(),
            message: format!("unexpected response: {data}"),
        })
    }

    async fn title(&self) -> Result<String, DriverError> {
        let data = self.run("get_title", &args(&["get", "title"])).await?;
        data_as_string(&data, "title").ok_or_else(|| DriverError::Interaction {
            action: "get_title".into(),
            message: format!("unexpected response: {data}"),
        })
    }
}
