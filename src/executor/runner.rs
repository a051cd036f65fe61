use super::report::{ExecutionReport, StepOutcome, StepReport};
use super::task::{ExecutableTask, StepResult};
use crate::browser::agent_browser::AgentBrowserDriver;
use crate::browser::driver::{BrowserDriver, perform};
use crate::config::{Config, ExecutorConfig};
use crate::error::PlanError;
use crate::observability::{ExecutionMetrics, MetricsSnapshot};
use crate::planner::roadmap::{DependencyGraph, RoadmapStep, ready_steps};
use crate::planner::traits::StepPlanner;
use crate::security::approval::{
    ApprovalGate, ApprovalVerdict, AutoDenyBroker, ConfirmationBroker, ConfirmationRequest,
};
use chrono::Utc;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const CANCELLED_BY_USER: &str = "cancelled by user";

/// Drives a roadmap to completion against one browser session.
///
/// Steps run one at a time. The next step is always the lowest-numbered
/// automatable step whose dependencies have completed, so a run over the
/// same inputs picks steps in the same order.
pub struct TaskExecutor {
    driver: Box<dyn BrowserDriver>,
    planner: Arc<dyn StepPlanner>,
    gate: ApprovalGate,
    confirmer: Arc<dyn ConfirmationBroker>,
    settings: ExecutorConfig,
    metrics: ExecutionMetrics,
}

struct StepContext {
    completed_steps: usize,
    total_steps: usize,
}

impl TaskExecutor {
    pub fn new(
        driver: Box<dyn BrowserDriver>,
        planner: Arc<dyn StepPlanner>,
        gate: ApprovalGate,
        settings: ExecutorConfig,
    ) -> Self {
        Self {
            driver,
            planner,
            gate,
            confirmer: Arc::new(AutoDenyBroker::default()),
            settings,
            metrics: ExecutionMetrics::new(),
        }
    }

    /// Executor over the `agent-browser` CLI with the gate and pause taken
    /// from `config`. Confirmation requests are declined until a broker is
    /// set with [`Self::with_confirmation`].
    pub fn from_config(config: &Config, planner: Arc<dyn StepPlanner>) -> Self {
        Self::new(
            Box::new(AgentBrowserDriver::new(&config.browser)),
            planner,
            ApprovalGate::from_config(&config.gate),
            config.executor.clone(),
        )
    }

    #[must_use]
    pub fn with_confirmation(mut self, confirmer: Arc<dyn ConfirmationBroker>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn driver(&self) -> &dyn BrowserDriver {
        self.driver.as_ref()
    }

    /// Counters of the most recent run.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Run every ready automatable step until none remain.
    ///
    /// Fails only when the roadmap itself is malformed (duplicate step,
    /// unknown dependency, cycle), before anything executes. Step failures
    /// are recorded in the report and do not stop the run.
    pub async fn run(&mut self, steps: &mut [RoadmapStep]) -> Result<ExecutionReport, PlanError> {
        let graph = DependencyGraph::build(steps)?;
        debug!(order = ?graph.topological_order(), "roadmap dependency order");

        self.metrics = ExecutionMetrics::new();
        let run_id = Uuid::new_v4();
        let total_steps = steps.len();
        let automatable_count = steps.iter().filter(|s| s.automation_possible).count();
        info!(
            %run_id,
            total_steps,
            automatable = automatable_count,
            manual = total_steps - automatable_count,
            "starting roadmap run"
        );

        let preexisting: BTreeSet<u32> = steps
            .iter()
            .filter(|s| s.completed)
            .map(|s| s.step_number)
            .collect();
        let mut completed = preexisting.clone();
        let mut reports: BTreeMap<u32, StepReport> = BTreeMap::new();
        let mut execution_order = Vec::new();

        while let Some(index) = next_ready(steps, &reports) {
            let step_number = steps[index].step_number;
            let context = StepContext {
                completed_steps: completed.len(),
                total_steps,
            };

            let report = self.execute_step(&steps[index], &context).await;
            execution_order.push(step_number);

            if report.outcome == StepOutcome::Completed {
                steps[index].completed = true;
                completed.insert(step_number);
            }
            reports.insert(step_number, report);
        }

        for step in steps.iter() {
            if reports.contains_key(&step.step_number) {
                continue;
            }
            let entry = if preexisting.contains(&step.step_number) {
                StepReport::not_run(step, StepOutcome::AlreadyCompleted, None)
            } else if !step.automation_possible {
                StepReport::not_run(step, StepOutcome::Manual, None)
            } else {
                let unmet: Vec<String> = step
                    .dependencies
                    .iter()
                    .filter(|dep| !completed.contains(dep))
                    .map(ToString::to_string)
                    .collect();
                let error = format!("unmet dependencies: {}", unmet.join(", "));
                warn!(step = step.step_number, %error, "step skipped");
                StepReport::not_run(step, StepOutcome::Skipped, Some(error))
            };
            reports.insert(step.step_number, entry);
        }

        let report = ExecutionReport {
            run_id,
            total_steps,
            automatable_count,
            manual_count: total_steps - automatable_count,
            execution_order,
            steps: reports.into_values().collect(),
            metrics: self.metrics.snapshot(),
        };
        info!(
            %run_id,
            completed = report.with_outcome(StepOutcome::Completed).len(),
            failed = report.failed_steps().len(),
            "roadmap run finished"
        );
        Ok(report)
    }

    async fn execute_step(&self, step: &RoadmapStep, context: &StepContext) -> StepReport {
        let started = Instant::now();
        let mut task = ExecutableTask::for_step(step);
        task.start();
        info!(
            step = step.step_number,
            title = %step.title,
            kind = %task.execution_kind,
            "executing step"
        );

        task.actions = match self.planner.plan(step).await {
            Ok(actions) => actions,
            Err(error) => {
                return self.finish_failed(
                    task,
                    StepOutcome::PlanningFailed,
                    format!("planning failed: {error:#}"),
                    None,
                    None,
                    started,
                );
            }
        };

        let invalid = task.actions.iter().enumerate().find_map(|(index, action)| {
            action.validate().err().map(|error| {
                format!(
                    "action {} ({}) is invalid: {error}",
                    index + 1,
                    action.action_type()
                )
            })
        });
        if let Some(message) = invalid {
            return self.finish_failed(
                task,
                StepOutcome::InvalidAction,
                message,
                None,
                None,
                started,
            );
        }

        let verdict = match self
            .gate
            .evaluate(&task.proposal(), &self.gate_context(step, context))
            .await
        {
            Ok(verdict) => verdict,
            Err(error) => {
                return self.finish_failed(
                    task,
                    StepOutcome::Blocked,
                    format!("approval gate error: {error}"),
                    None,
                    None,
                    started,
                );
            }
        };
        self.metrics.record_gate_check(verdict.approved);

        if !verdict.approved {
            let message = format!("blocked by approval gate: {}", verdict.reasoning);
            return self.finish_failed(
                task,
                StepOutcome::Blocked,
                message,
                None,
                Some(verdict),
                started,
            );
        }

        if verdict.requires_human_confirmation && !self.confirm(&task, &verdict).await {
            return self.finish_failed(
                task,
                StepOutcome::Cancelled,
                CANCELLED_BY_USER.to_string(),
                None,
                Some(verdict),
                started,
            );
        }

        let pause = Duration::from_millis(self.settings.action_pause_ms);
        let mut results = Vec::with_capacity(task.actions.len());
        let mut failure = None;
        for (index, action) in task.actions.iter().enumerate() {
            if index > 0 && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            match perform(self.driver.as_ref(), index, action).await {
                Ok(output) => results.push(output),
                Err(error) => {
                    failure = Some(format!(
                        "action {} ({}) failed: {error}",
                        index + 1,
                        action.action_type()
                    ));
                    break;
                }
            }
        }

        if let Some(message) = failure {
            return self.finish_failed(
                task,
                StepOutcome::DriverFailed,
                message,
                Some(StepResult::new(results)),
                Some(verdict),
                started,
            );
        }

        task.complete(StepResult::new(results));
        self.metrics.record_task(started.elapsed(), true);
        info!(
            step = step.step_number,
            actions = task.actions.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "step completed"
        );
        StepReport::from_task(task, StepOutcome::Completed, Some(verdict))
    }

    fn finish_failed(
        &self,
        mut task: ExecutableTask,
        outcome: StepOutcome,
        error: String,
        partial: Option<StepResult>,
        verdict: Option<ApprovalVerdict>,
        started: Instant,
    ) -> StepReport {
        warn!(step = task.step_number, %outcome, %error, "step failed");
        task.fail(error, partial);
        self.metrics.record_task(started.elapsed(), false);
        StepReport::from_task(task, outcome, verdict)
    }

    async fn confirm(&self, task: &ExecutableTask, verdict: &ApprovalVerdict) -> bool {
        let request = ConfirmationRequest {
            step_number: task.step_number,
            title: task.title.clone(),
            verdict: verdict.clone(),
            actions: task.actions.iter().map(|a| a.to_value().to_string()).collect(),
        };
        match self.confirmer.confirm(&request).await {
            Ok(answer) => answer,
            Err(error) => {
                warn!(step = task.step_number, %error, "confirmation failed");
                false
            }
        }
    }

    fn gate_context(&self, step: &RoadmapStep, context: &StepContext) -> Value {
        let mut map = self.settings.context.clone();
        map.insert("timestamp".into(), json!(Utc::now()));
        map.insert("step_number".into(), json!(step.step_number));
        map.insert("completed_steps".into(), json!(context.completed_steps));
        map.insert("total_steps".into(), json!(context.total_steps));
        Value::Object(map)
    }
}

/// Index of the lowest-numbered automatable step that is ready and has not
/// been attempted in this run.
fn next_ready(steps: &[RoadmapStep], attempted: &BTreeMap<u32, StepReport>) -> Option<usize> {
    ready_steps(steps)
        .into_iter()
        .filter(|number| !attempted.contains_key(number))
        .find_map(|number| {
            steps
                .iter()
                .position(|s| s.step_number == number && s.automation_possible)
        })
}
