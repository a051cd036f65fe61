use crate::browser::action::Action;
use crate::browser::driver::ActionOutput;
use crate::planner::roadmap::RoadmapStep;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// `pending → running → {completed | failed}`
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

/// Outputs of the actions that ran, in plan order. On a failed step this
/// holds the actions that succeeded before the failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub actions_completed: usize,
    pub results: Vec<ActionOutput>,
}

impl StepResult {
    pub fn new(results: Vec<ActionOutput>) -> Self {
        Self {
            actions_completed: results.len(),
            results,
        }
    }
}

/// Execution record for one roadmap step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutableTask {
    pub task_id: String,
    pub step_number: u32,
    pub title: String,
    pub description: String,
    pub execution_kind: String,
    pub actions: Vec<Action>,
    status: TaskStatus,
    pub result: Option<StepResult>,
    pub error: Option<String>,
}

impl ExecutableTask {
    pub fn for_step(step: &RoadmapStep) -> Self {
        Self {
            task_id: format!("step_{}", step.step_number),
            step_number: step.step_number,
            title: step.title.clone(),
            description: step.description.clone(),
            execution_kind: step.execution_kind().to_string(),
            actions: Vec::new(),
            status: TaskStatus::Pending,
            result: None,
            error: None,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    fn transition(&mut self, next: TaskStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            tracing::error!(
                task = %self.task_id,
                from = %self.status,
                to = %next,
                "ignored invalid task transition"
            );
            false
        }
    }

    pub fn start(&mut self) -> bool {
        self.transition(TaskStatus::Running)
    }

    pub fn complete(&mut self, result: StepResult) -> bool {
        let applied = self.transition(TaskStatus::Completed);
        if applied {
            self.result = Some(result);
        }
        applied
    }

    pub fn fail(&mut self, error: impl Into<String>, partial: Option<StepResult>) -> bool {
        let applied = self.transition(TaskStatus::Failed);
        if applied {
            self.error = Some(error.into());
            self.result = partial;
        }
        applied
    }

    /// The proposal sent to the approval gate for this step.
    pub fn proposal(&self) -> Value {
        json!({
            "type": "execute_task",
            "task": {
                "task_id": self.task_id,
                "title": self.title,
                "description": self.description,
                "execution_kind": self.execution_kind,
                "actions": self.actions.iter().map(Action::to_value).collect::<Vec<_>>(),
            }
        })
    }
}
