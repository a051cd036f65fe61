use super::parser::parse_action_plan;
use super::roadmap::RoadmapStep;
use crate::browser::action::Action;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Expands one roadmap step into browser actions. The returned actions may
/// be invalid; the executor validates every one before running any.
#[async_trait]
pub trait StepPlanner: Send + Sync {
    async fn plan(&self, step: &RoadmapStep) -> Result<Vec<Action>>;
}

/// Planner backed by a fixed step-number → actions map. Steps without an
/// entry plan to an empty action list.
#[derive(Debug, Clone, Default)]
pub struct StaticPlanner {
    plans: BTreeMap<u32, Vec<Action>>,
}

impl StaticPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_plan(mut self, step_number: u32, actions: Vec<Action>) -> Self {
        self.plans.insert(step_number, actions);
        self
    }

    /// Load from a JSON object mapping step numbers to action lists, e.g.
    /// `{"1": [{"type": "navigate", "url": "..."}]}`.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, Value> =
            serde_json::from_str(text).context("static plan must be a JSON object")?;

        let mut plans = BTreeMap::new();
        for (key, actions) in raw {
            let step_number: u32 = key
                .trim()
                .parse()
                .with_context(|| format!("invalid step number in static plan: {key}"))?;
            let actions = parse_action_plan(&actions.to_string())
                .with_context(|| format!("invalid actions for step {step_number}"))?;
            plans.insert(step_number, actions);
        }
        Ok(Self { plans })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read static plan {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

#[async_trait]
impl StepPlanner for StaticPlanner {
    async fn plan(&self, step: &RoadmapStep) -> Result<Vec<Action>> {
        Ok(self
            .plans
            .get(&step.step_number)
            .cloned()
            .unwrap_or_default())
    }
}
