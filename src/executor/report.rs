use super::task::{ExecutableTask, StepResult, TaskStatus};
use crate::browser::driver::ActionOutput;
use crate::observability::MetricsSnapshot;
use crate::planner::roadmap::RoadmapStep;
use crate::security::approval::ApprovalVerdict;
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Why a step ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepOutcome {
    Completed,
    AlreadyCompleted,
    Blocked,
    Cancelled,
    InvalidAction,
    PlanningFailed,
    DriverFailed,
    Manual,
    Skipped,
}

impl StepOutcome {
    /// Outcomes of a step that was picked up and then failed.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::Blocked
                | Self::Cancelled
                | Self::InvalidAction
                | Self::PlanningFailed
                | Self::DriverFailed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step_number: u32,
    pub title: String,
    pub execution_kind: String,
    pub status: TaskStatus,
    pub outcome: StepOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<ApprovalVerdict>,
}

impl StepReport {
    pub fn from_task(
        task: ExecutableTask,
        outcome: StepOutcome,
        verdict: Option<ApprovalVerdict>,
    ) -> Self {
        let status = task.status();
        Self {
            step_number: task.step_number,
            title: task.title,
            execution_kind: task.execution_kind,
            status,
            outcome,
            result: task.result,
            error: task.error,
            verdict,
        }
    }

    /// Entry for a step the executor did not pick up.
    pub fn not_run(step: &RoadmapStep, outcome: StepOutcome, error: Option<String>) -> Self {
        let status = if step.completed {
            TaskStatus::Completed
        } else {
            TaskStatus::Pending
        };
        Self {
            step_number: step.step_number,
            title: step.title.clone(),
            execution_kind: step.execution_kind().to_string(),
            status,
            outcome,
            result: None,
            error,
            verdict: None,
        }
    }

    /// Outputs of the actions that ran, empty when none did.
    pub fn action_results(&self) -> &[ActionOutput] {
        match &self.result {
            Some(result) => &result.results,
            None => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub run_id: Uuid,
    pub total_steps: usize,
    pub automatable_count: usize,
    pub manual_count: usize,
    /// Step numbers in the order they were picked up
    pub execution_order: Vec<u32>,
    /// One entry per input step, ascending by step number
    pub steps: Vec<StepReport>,
    pub metrics: MetricsSnapshot,
}

impl ExecutionReport {
    pub fn step(&self, step_number: u32) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step_number == step_number)
    }

    pub fn with_outcome(&self, outcome: StepOutcome) -> Vec<u32> {
        self.steps
            .iter()
            .filter(|s| s.outcome == outcome)
            .map(|s| s.step_number)
            .collect()
    }

    pub fn failed_steps(&self) -> Vec<u32> {
        self.steps
            .iter()
            .filter(|s| s.outcome.is_failure())
            .map(|s| s.step_number)
            .collect()
    }

    /// True when every automatable step ended completed.
    pub fn all_automatable_completed(&self) -> bool {
        self.steps.iter().all(|s| {
            matches!(
                s.outcome,
                StepOutcome::Completed | StepOutcome::AlreadyCompleted | StepOutcome::Manual
            )
        })
    }
}
