use super::*;
use crate::browser::action::{
    Action, ClickAction, PressKeyAction, ScrollAction, SelectAction, TypeAction, WaitAction,
};
use crate::browser::driver::BrowserDriver;
use crate::browser::selector::ElementSelector;
use crate::config::ExecutorConfig;
use crate::error::{DriverError, GateError, PlanError};
use crate::planner::roadmap::RoadmapStep;
use crate::planner::traits::{StaticPlanner, StepPlanner};
use crate::security::approval::{
    ApprovalGate, ApprovalVerdict, ConfirmationBroker, ConfirmationRequest, PolicyRequest,
    PolicyService, RiskLevel, SafetyTier, VerdictSource,
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Records every call; fails the call whose 1-based number is `fail_on`.
#[derive(Default)]
struct RecordingDriver {
    calls: Arc<Mutex<Vec<String>>>,
    fail_on: Option<usize>,
}

impl RecordingDriver {
    fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    fn record(&self, call: String) -> Result<Value, DriverError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call.clone());
        if self.fail_on == Some(calls.len()) {
            return Err(DriverError::Interaction {
                action: call,
                message: "element detached".into(),
            });
        }
        Ok(json!({"success": true}))
    }
}

fn sel(selector: Option<&ElementSelector>) -> String {
    selector.map(|s| s.value().to_string()).unwrap_or_default()
}

#[async_trait]
impl BrowserDriver for RecordingDriver {
    fn name(&self) -> &str {
        "recording"
    }

    async fn navigate(&self, url: &str, _: &str, _: u64) -> Result<Value, DriverError> {
        self.record(format!("navigate {url}"))
    }

    async fn click(&self, action: &ClickAction) -> Result<Value, DriverError> {
        self.record(format!("click {}", sel(action.selector.as_ref())))
    }

    async fn type_text(&self, action: &TypeAction) -> Result<Value, DriverError> {
        self.record(format!("type {}", action.text))
    }

    async fn scroll(&self, action: &ScrollAction) -> Result<Value, DriverError> {
        self.record(format!("scroll {}", action.direction))
    }

    async fn wait_for(&self, action: &WaitAction) -> Result<Value, DriverError> {
        self.record(format!("wait {}", action.timeout_ms))
    }

    async fn press_key(&self, action: &PressKeyAction) -> Result<Value, DriverError> {
        self.record(format!("press {}", action.key))
    }

    async fn hover(&self, selector: &ElementSelector) -> Result<Value, DriverError> {
        self.record(format!("hover {}", selector.value()))
    }

    async fn select_option(&self, action: &SelectAction) -> Result<Value, DriverError> {
        self.record(format!("select {}", sel(action.selector.as_ref())))
    }

    async fn screenshot(&self, _: bool) -> Result<Vec<u8>, DriverError> {
        Ok(Vec::new())
    }

    async fn evaluate_script(&self, _: &str) -> Result<Value, DriverError> {
        Ok(Value::Null)
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok("about:blank".into())
    }

    async fn title(&self) -> Result<String, DriverError> {
        Ok(String::new())
    }
}

struct FailingPlanner;

#[async_trait]
impl StepPlanner for FailingPlanner {
    async fn plan(&self, _: &RoadmapStep) -> anyhow::Result<Vec<Action>> {
        anyhow::bail!("model returned no actions")
    }
}

struct ScriptedPolicy {
    verdict: ApprovalVerdict,
    requests: Arc<Mutex<Vec<PolicyRequest>>>,
}

#[async_trait]
impl PolicyService for ScriptedPolicy {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn evaluate(&self, request: &PolicyRequest) -> Result<ApprovalVerdict, GateError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.verdict.clone())
    }
}

struct AlwaysYes(Arc<Mutex<Vec<u32>>>);

impl ConfirmationBroker for AlwaysYes {
    fn confirm<'a>(
        &'a self,
        request: &'a ConfirmationRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            self.0.lock().unwrap().push(request.step_number);
            Ok(true)
        })
    }
}

/// Answers every request with a fixed result, counting how often it was asked.
struct FixedAnswer {
    answer: Result<bool, &'static str>,
    asked: Arc<Mutex<usize>>,
}

impl ConfirmationBroker for FixedAnswer {
    fn confirm<'a>(
        &'a self,
        _request: &'a ConfirmationRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            *self.asked.lock().unwrap() += 1;
            self.answer.map_err(anyhow::Error::msg)
        })
    }
}

fn css(value: &str) -> ElementSelector {
    ElementSelector::css(value).unwrap()
}

fn no_pause() -> ExecutorConfig {
    ExecutorConfig {
        action_pause_ms: 0,
        context: Map::new(),
    }
}

fn automated(number: u32, deps: &[u32]) -> RoadmapStep {
    RoadmapStep::new(number, format!("Step {number}"))
        .depends_on(deps.iter().copied())
        .automated("browser")
}

fn executor_with(driver: RecordingDriver, planner: StaticPlanner) -> TaskExecutor {
    TaskExecutor::new(
        Box::new(driver),
        Arc::new(planner),
        ApprovalGate::offline(),
        no_pause(),
    )
}

fn human_verdict() -> ApprovalVerdict {
    ApprovalVerdict {
        approved: true,
        risk_level: RiskLevel::High,
        safety_tier: SafetyTier::Risky,
        reasoning: "submits a payment form".into(),
        notes: Vec::new(),
        requires_human_confirmation: true,
        source: VerdictSource::PolicyService,
    }
}

#[tokio::test]
async fn steps_run_in_dependency_order_regardless_of_input_order() {
    let driver = RecordingDriver::default();
    let calls = Arc::clone(&driver.calls);
    let planner = StaticPlanner::new()
        .with_plan(1, vec![Action::navigate("https://example.com/1")])
        .with_plan(2, vec![Action::navigate("https://example.com/2")])
        .with_plan(3, vec![Action::navigate("https://example.com/3")]);
    let mut steps = vec![automated(3, &[1, 2]), automated(2, &[1]), automated(1, &[])];

    let mut executor = executor_with(driver, planner);
    let report = executor.run(&mut steps).await.unwrap();

    assert_eq!(report.execution_order, vec![1, 2, 3]);
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "navigate https://example.com/1",
            "navigate https://example.com/2",
            "navigate https://example.com/3",
        ]
    );
    assert!(steps.iter().all(|s| s.completed));
    assert!(report.all_automatable_completed());
    assert_eq!(report.metrics.tasks_completed, 3);
    assert_eq!(report.metrics.gate_checks_passed, 3);
}

#[tokio::test]
async fn driver_failure_keeps_partial_results_and_stops_the_step() {
    let driver = RecordingDriver::failing_on(3);
    let calls = Arc::clone(&driver.calls);
    let planner = StaticPlanner::new().with_plan(
        1,
        vec![
            Action::navigate("https://example.com"),
            Action::click(css("#a")),
            Action::click(css("#b")),
            Action::click(css("#c")),
        ],
    );
    let mut steps = vec![automated(1, &[]), automated(2, &[1])];

    let mut executor = executor_with(driver, planner);
    let report = executor.run(&mut steps).await.unwrap();

    let first = report.step(1).unwrap();
    assert_eq!(first.outcome, StepOutcome::DriverFailed);
    assert_eq!(first.status, TaskStatus::Failed);
    assert_eq!(first.action_results().len(), 2);
    assert!(first.error.as_deref().unwrap().contains("action 3 (click) failed"));
    assert_eq!(calls.lock().unwrap().len(), 3);
    assert!(!steps[0].completed);

    let second = report.step(2).unwrap();
    assert_eq!(second.outcome, StepOutcome::Skipped);
    assert_eq!(second.error.as_deref(), Some("unmet dependencies: 1"));
    assert_eq!(report.failed_steps(), vec![1]);
}

#[tokio::test]
async fn fallback_deny_list_blocks_destructive_step() {
    let driver = RecordingDriver::default();
    let calls = Arc::clone(&driver.calls);
    let planner = StaticPlanner::new().with_plan(1, vec![Action::click(css("#ok"))]);
    let mut steps = vec![
        RoadmapStep::new(1, "Drop the staging database")
            .automated("browser"),
    ];

    let mut executor = executor_with(driver, planner);
    let report = executor.run(&mut steps).await.unwrap();

    let step = report.step(1).unwrap();
    assert_eq!(step.outcome, StepOutcome::Blocked);
    assert!(
        step.error
            .as_deref()
            .unwrap()
            .starts_with("blocked by approval gate:")
    );
    assert!(step.verdict.as_ref().unwrap().is_blocked());
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(report.metrics.gate_checks_failed, 1);
}

#[tokio::test]
async fn confirmation_required_is_cancelled_by_default_broker() {
    let driver = RecordingDriver::default();
    let calls = Arc::clone(&driver.calls);
    let gate = ApprovalGate::new(Box::new(ScriptedPolicy {
        verdict: human_verdict(),
        requests: Arc::default(),
    }));
    let planner = StaticPlanner::new().with_plan(1, vec![Action::click(css("#pay"))]);
    let mut executor = TaskExecutor::new(Box::new(driver), Arc::new(planner), gate, no_pause());

    let mut steps = vec![automated(1, &[])];
    let report = executor.run(&mut steps).await.unwrap();

    let step = report.step(1).unwrap();
    assert_eq!(step.outcome, StepOutcome::Cancelled);
    assert_eq!(step.error.as_deref(), Some(CANCELLED_BY_USER));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn confirmed_step_runs_and_gate_sees_context() {
    let driver = RecordingDriver::default();
    let calls = Arc::clone(&driver.calls);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let gate = ApprovalGate::new(Box::new(ScriptedPolicy {
        verdict: human_verdict(),
        requests: Arc::clone(&requests),
    }));
    let asked = Arc::new(Mutex::new(Vec::new()));
    let planner = StaticPlanner::new().with_plan(2, vec![Action::click(css("#pay"))]);

    let mut settings = no_pause();
    settings.context.insert("operator".into(), json!("ops"));
    settings.context.insert("step_number".into(), json!(99));

    let mut executor = TaskExecutor::new(Box::new(driver), Arc::new(planner), gate, settings)
        .with_confirmation(Arc::new(AlwaysYes(Arc::clone(&asked))));

    let mut first = RoadmapStep::new(1, "Already done").automated("browser");
    first.completed = true;
    let mut steps = vec![first, automated(2, &[1])];
    let report = executor.run(&mut steps).await.unwrap();

    assert_eq!(report.step(1).unwrap().outcome, StepOutcome::AlreadyCompleted);
    assert_eq!(report.step(2).unwrap().outcome, StepOutcome::Completed);
    assert_eq!(*asked.lock().unwrap(), vec![2]);
    assert_eq!(*calls.lock().unwrap(), vec!["click #pay"]);

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let context = &requests[0].context;
    assert_eq!(context["operator"], "ops");
    assert_eq!(context["step_number"], 2);
    assert_eq!(context["completed_steps"], 1);
    assert_eq!(context["total_steps"], 2);
    assert!(context.contains_key("timestamp"));
    assert_eq!(requests[0].action["type"], "execute_task");
    assert_eq!(requests[0].action["task"]["task_id"], "step_2");
}

#[tokio::test]
async fn manual_steps_are_reported_not_run() {
    let planner = StaticPlanner::new();
    let mut steps = vec![RoadmapStep::new(1, "Call the bank")];

    let mut executor = executor_with(RecordingDriver::default(), planner);
    let report = executor.run(&mut steps).await.unwrap();

    assert_eq!(report.manual_count, 1);
    assert_eq!(report.automatable_count, 0);
    assert_eq!(report.step(1).unwrap().outcome, StepOutcome::Manual);
    assert!(report.execution_order.is_empty());
    assert!(report.all_automatable_completed());
}

#[tokio::test]
async fn automated_step_behind_manual_dependency_is_skipped() {
    let mut steps = vec![RoadmapStep::new(1, "Sign contract"), automated(2, &[1])];

    let mut executor = executor_with(RecordingDriver::default(), StaticPlanner::new());
    let report = executor.run(&mut steps).await.unwrap();

    let step = report.step(2).unwrap();
    assert_eq!(step.outcome, StepOutcome::Skipped);
    assert_eq!(step.status, TaskStatus::Pending);
    assert!(!report.all_automatable_completed());
}

#[tokio::test]
async fn invalid_action_fails_step_before_gate_and_driver() {
    let driver = RecordingDriver::default();
    let calls = Arc::clone(&driver.calls);
    let planner = StaticPlanner::new().with_plan(
        1,
        vec![Action::click(css("#ok")), Action::navigate("ftp://files.example.com")],
    );
    let mut steps = vec![automated(1, &[])];

    let mut executor = executor_with(driver, planner);
    let report = executor.run(&mut steps).await.unwrap();

    let step = report.step(1).unwrap();
    assert_eq!(step.outcome, StepOutcome::InvalidAction);
    assert!(step.error.as_deref().unwrap().contains("action 2 (navigate)"));
    assert!(step.verdict.is_none());
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(report.metrics.gate_checks_passed + report.metrics.gate_checks_failed, 0);
}

#[tokio::test]
async fn planner_error_is_reported() {
    let mut executor = TaskExecutor::new(
        Box::new(RecordingDriver::default()),
        Arc::new(FailingPlanner),
        ApprovalGate::offline(),
        no_pause(),
    );
    let mut steps = vec![automated(1, &[])];
    let report = executor.run(&mut steps).await.unwrap();

    let step = report.step(1).unwrap();
    assert_eq!(step.outcome, StepOutcome::PlanningFailed);
    assert_eq!(
        step.error.as_deref(),
        Some("planning failed: model returned no actions")
    );
    assert_eq!(report.metrics.tasks_failed, 1);
}

#[tokio::test]
async fn cycle_is_rejected_before_anything_runs() {
    let driver = RecordingDriver::default();
    let calls = Arc::clone(&driver.calls);
    let planner = StaticPlanner::new().with_plan(1, vec![Action::click(css("#a"))]);
    let mut steps = vec![automated(1, &[2]), automated(2, &[1]), automated(3, &[])];

    let mut executor = executor_with(driver, planner);
    let err = executor.run(&mut steps).await.unwrap_err();

    assert!(matches!(err, PlanError::DependencyCycle(_)));
    assert!(calls.lock().unwrap().is_empty());
    assert!(steps.iter().all(|s| !s.completed));
}

#[tokio::test]
async fn pause_applies_between_actions_only() {
    let planner = StaticPlanner::new().with_plan(
        1,
        vec![Action::click(css("#a")), Action::click(css("#b"))],
    );
    let mut settings = no_pause();
    settings.action_pause_ms = 200;
    let mut executor = TaskExecutor::new(
        Box::new(RecordingDriver::default()),
        Arc::new(planner),
        ApprovalGate::offline(),
        settings,
    );

    let started = std::time::Instant::now();
    let mut steps = vec![automated(1, &[])];
    let report = executor.run(&mut steps).await.unwrap();

    assert_eq!(report.step(1).unwrap().outcome, StepOutcome::Completed);
    let elapsed = started.elapsed();
    assert!(elapsed >= std::time::Duration::from_millis(200));
    assert!(elapsed < std::time::Duration::from_millis(400), "{elapsed:?}");
}

async fn run_with_broker(answer: Result<bool, &'static str>) -> (ExecutionReport, usize, usize) {
    let driver = RecordingDriver::default();
    let calls = Arc::clone(&driver.calls);
    let asked = Arc::new(Mutex::new(0));
    let gate = ApprovalGate::new(Box::new(ScriptedPolicy {
        verdict: human_verdict(),
        requests: Arc::default(),
    }));
    let planner = StaticPlanner::new().with_plan(1, vec![Action::click(css("#pay"))]);
    let mut executor = TaskExecutor::new(Box::new(driver), Arc::new(planner), gate, no_pause())
        .with_confirmation(Arc::new(FixedAnswer {
            answer,
            asked: Arc::clone(&asked),
        }));

    let mut steps = vec![automated(1, &[])];
    let report = executor.run(&mut steps).await.unwrap();
    assert!(!steps[0].completed);
    let driver_calls = calls.lock().unwrap().len();
    let asked = *asked.lock().unwrap();
    (report, driver_calls, asked)
}

#[tokio::test]
async fn broker_error_cancels_step() {
    let (report, driver_calls, asked) = run_with_broker(Err("stdin closed")).await;

    let step = report.step(1).unwrap();
    assert_eq!(step.outcome, StepOutcome::Cancelled);
    assert_eq!(step.status, TaskStatus::Failed);
    assert_eq!(step.error.as_deref(), Some(CANCELLED_BY_USER));
    assert_eq!(asked, 1);
    assert_eq!(driver_calls, 0);
}

#[tokio::test]
async fn explicit_no_from_broker_cancels_step() {
    let (report, driver_calls, asked) = run_with_broker(Ok(false)).await;

    let step = report.step(1).unwrap();
    assert_eq!(step.outcome, StepOutcome::Cancelled);
    assert_eq!(step.error.as_deref(), Some(CANCELLED_BY_USER));
    assert_eq!(asked, 1);
    assert_eq!(driver_calls, 0);
}

#[tokio::test]
async fn report_metrics_cover_only_their_own_run() {
    let planner = StaticPlanner::new().with_plan(1, vec![Action::click(css("#a"))]);
    let mut executor = executor_with(RecordingDriver::default(), planner);

    let mut first = vec![automated(1, &[])];
    let report = executor.run(&mut first).await.unwrap();
    assert_eq!(report.metrics.tasks_completed, 1);
    assert_eq!(report.metrics.gate_checks_passed, 1);

    let mut second = vec![RoadmapStep::new(2, "Phone the registrar")];
    let report = executor.run(&mut second).await.unwrap();
    assert!(report.execution_order.is_empty());
    assert_eq!(report.metrics, crate::observability::MetricsSnapshot::default());
    assert_eq!(executor.metrics().tasks_completed, 0);
}

#[tokio::test]
async fn rerun_picks_up_where_previous_run_stopped() {
    let planner = StaticPlanner::new()
        .with_plan(1, vec![Action::click(css("#a"))])
        .with_plan(3, vec![Action::click(css("#c"))]);
    let mut executor = executor_with(RecordingDriver::default(), planner);
    let mut steps = vec![
        automated(1, &[]),
        RoadmapStep::new(2, "Sign in person"),
        automated(3, &[2]),
    ];

    let report = executor.run(&mut steps).await.unwrap();
    assert_eq!(report.execution_order, vec![1]);

    steps[1].completed = true;
    let report = executor.run(&mut steps).await.unwrap();
    assert_eq!(report.execution_order, vec![3]);
    assert_eq!(report.metrics.tasks_completed, 1);
    assert_eq!(report.step(1).unwrap().outcome, StepOutcome::AlreadyCompleted);
}
