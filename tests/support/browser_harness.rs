#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use stepwise::browser::{
    ClickAction, ElementSelector, PressKeyAction, ScrollAction, SelectAction, TypeAction,
    WaitAction,
};
use stepwise::config::ExecutorConfig;
use stepwise::error::{DriverError, GateError};
use stepwise::security::approval::{
    ApprovalVerdict, PolicyRequest, PolicyService, RiskLevel, SafetyTier, VerdictSource,
};
use stepwise::{BrowserDriver, RoadmapStep};

/// In-memory browser. Tracks the current URL and records every call in
/// order; calls listed in `failures` return an interaction error.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    pub calls: Arc<Mutex<Vec<String>>>,
    url: Arc<Mutex<String>>,
    failures: Arc<Mutex<BTreeMap<String, String>>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_call(&self, call: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(call.to_string(), message.to_string());
    }

    pub fn url(&self) -> String {
        self.url.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<Value, DriverError> {
        self.calls.lock().unwrap().push(call.clone());
        if let Some(message) = self.failures.lock().unwrap().get(&call) {
            return Err(DriverError::Interaction {
                action: call,
                message: message.clone(),
            });
        }
        Ok(json!({"ok": call}))
    }
}

fn target(selector: Option<&ElementSelector>) -> &str {
    selector.map_or("", ElementSelector::value)
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    fn name(&self) -> &str {
        "fake"
    }

    async fn navigate(&self, url: &str, _: &str, _: u64) -> Result<Value, DriverError> {
        let out = self.record(format!("navigate {url}"))?;
        *self.url.lock().unwrap() = url.to_string();
        Ok(out)
    }

    async fn click(&self, action: &ClickAction) -> Result<Value, DriverError> {
        self.record(format!("click {}", target(action.selector.as_ref())))
    }

    async fn type_text(&self, action: &TypeAction) -> Result<Value, DriverError> {
        self.record(format!(
            "type {} {}",
            target(action.selector.as_ref()),
            action.text
        ))
    }

    async fn scroll(&self, action: &ScrollAction) -> Result<Value, DriverError> {
        self.record(format!("scroll {} {}", action.direction, action.amount))
    }

    async fn wait_for(&self, action: &WaitAction) -> Result<Value, DriverError> {
        let condition = action
            .condition
            .map(|c| c.to_string())
            .unwrap_or_default();
        self.record(format!("wait {condition}"))
    }

    async fn press_key(&self, action: &PressKeyAction) -> Result<Value, DriverError> {
        self.record(format!("press {}", action.key))
    }

    async fn hover(&self, selector: &ElementSelector) -> Result<Value, DriverError> {
        self.record(format!("hover {}", selector.value()))
    }

    async fn select_option(&self, action: &SelectAction) -> Result<Value, DriverError> {
        self.record(format!("select {}", target(action.selector.as_ref())))
    }

    async fn screenshot(&self, _: bool) -> Result<Vec<u8>, DriverError> {
        Ok(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
    }

    async fn evaluate_script(&self, _: &str) -> Result<Value, DriverError> {
        Ok(Value::Null)
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn title(&self) -> Result<String, DriverError> {
        Ok("Fake page".into())
    }
}

/// Policy service that answers from a fixed verdict per step number and
/// keeps every request it saw.
#[derive(Clone, Default)]
pub struct RecordingPolicy {
    pub requests: Arc<Mutex<Vec<PolicyRequest>>>,
    verdicts: BTreeMap<u64, ApprovalVerdict>,
    unavailable: bool,
}

impl RecordingPolicy {
    pub fn approving() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_verdict(mut self, step_number: u64, verdict: ApprovalVerdict) -> Self {
        self.verdicts.insert(step_number, verdict);
        self
    }

    pub fn requests(&self) -> Vec<PolicyRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PolicyService for RecordingPolicy {
    fn name(&self) -> &str {
        "recording"
    }

    async fn evaluate(&self, request: &PolicyRequest) -> Result<ApprovalVerdict, GateError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.unavailable {
            return Err(GateError::Transport("connection refused".into()));
        }
        let step = request.context.get("step_number").and_then(Value::as_u64);
        Ok(step
            .and_then(|n| self.verdicts.get(&n).cloned())
            .unwrap_or_else(|| verdict(true, SafetyTier::Safe, false)))
    }
}

pub fn verdict(approved: bool, tier: SafetyTier, requires_human: bool) -> ApprovalVerdict {
    ApprovalVerdict {
        approved,
        risk_level: if approved {
            RiskLevel::Low
        } else {
            RiskLevel::High
        },
        safety_tier: tier,
        reasoning: format!("policy decided {tier}"),
        notes: Vec::new(),
        requires_human_confirmation: requires_human,
        source: VerdictSource::PolicyService,
    }
}

pub fn settings() -> ExecutorConfig {
    ExecutorConfig {
        action_pause_ms: 0,
        ..ExecutorConfig::default()
    }
}

pub fn browser_step(number: u32, title: &str, deps: &[u32]) -> RoadmapStep {
    RoadmapStep::new(number, title)
        .depends_on(deps.iter().copied())
        .automated("browser")
}
