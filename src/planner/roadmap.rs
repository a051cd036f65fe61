use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One node of a roadmap. `completed` is flipped by the executor after the
/// step's actions all succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapStep {
    pub step_number: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dependencies: BTreeSet<u32>,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub automation_possible: bool,
    #[serde(default)]
    pub automation_method: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl RoadmapStep {
    pub fn new(step_number: u32, title: impl Into<String>) -> Self {
        Self {
            step_number,
            title: title.into(),
            description: String::new(),
            dependencies: BTreeSet::new(),
            estimated_time: String::new(),
            automation_possible: false,
            automation_method: None,
            completed: false,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn depends_on(mut self, steps: impl IntoIterator<Item = u32>) -> Self {
        self.dependencies.extend(steps);
        self
    }

    #[must_use]
    pub fn automated(mut self, method: impl Into<String>) -> Self {
        self.automation_possible = true;
        self.automation_method = Some(method.into());
        self
    }

    /// `automation_method`, or `"manual"` when none is set.
    pub fn execution_kind(&self) -> &str {
        self.automation_method.as_deref().unwrap_or("manual")
    }

    pub fn is_ready(&self, completed: &BTreeSet<u32>) -> bool {
        self.dependencies.iter().all(|dep| completed.contains(dep))
    }
}

/// Validated dependency structure of a roadmap. Building one proves the
/// step numbers are unique, every dependency exists, and there is no cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    dependencies: BTreeMap<u32, BTreeSet<u32>>,
    dependents: BTreeMap<u32, BTreeSet<u32>>,
}

impl DependencyGraph {
    pub fn build(steps: &[RoadmapStep]) -> Result<Self, PlanError> {
        let mut dependencies = BTreeMap::new();
        for step in steps {
            if dependencies
                .insert(step.step_number, step.dependencies.clone())
                .is_some()
            {
                return Err(PlanError::DuplicateStep(step.step_number));
            }
        }

        let mut dependents: BTreeMap<u32, BTreeSet<u32>> =
            dependencies.keys().map(|id| (*id, BTreeSet::new())).collect();
        for (step, deps) in &dependencies {
            for dep in deps {
                let Some(children) = dependents.get_mut(dep) else {
                    return Err(PlanError::UnknownDependency {
                        step: *step,
                        dependency: *dep,
                    });
                };
                children.insert(*step);
            }
        }

        let graph = Self {
            dependencies,
            dependents,
        };
        graph.validate_cycle_free()?;
        Ok(graph)
    }

    pub fn dependencies_of(&self, step: u32) -> Option<&BTreeSet<u32>> {
        self.dependencies.get(&step)
    }

    /// Kahn's algorithm; ties resolve to the lowest step number.
    pub fn topological_order(&self) -> Vec<u32> {
        let mut in_degree: BTreeMap<u32, usize> = self
            .dependencies
            .iter()
            .map(|(id, deps)| (*id, deps.len()))
            .collect();

        let mut queue: BTreeSet<u32> = in_degree
            .iter()
            .filter_map(|(id, degree)| (*degree == 0).then_some(*id))
            .collect();

        let mut sorted = Vec::with_capacity(in_degree.len());
        while let Some(id) = queue.pop_first() {
            sorted.push(id);
            for child in self.dependents.get(&id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.insert(*child);
                    }
                }
            }
        }
        sorted
    }

    /// Depth-first walk over dependents with an explicit stack, so chain
    /// length is bounded by heap rather than thread stack.
    fn validate_cycle_free(&self) -> Result<(), PlanError> {
        let mut states: BTreeMap<u32, NodeState> = BTreeMap::new();

        for root in self.dependencies.keys() {
            if states.contains_key(root) {
                continue;
            }
            if let Some(path) = self.detect_cycle_from(*root, &mut states) {
                return Err(PlanError::DependencyCycle(path));
            }
        }
        Ok(())
    }

    fn detect_cycle_from(
        &self,
        root: u32,
        states: &mut BTreeMap<u32, NodeState>,
    ) -> Option<Vec<u32>> {
        let mut path = vec![root];
        let mut frames = vec![self.children(root)];
        states.insert(root, NodeState::Visiting);

        while let Some(children) = frames.last_mut() {
            let Some(child) = children.next().copied() else {
                frames.pop();
                if let Some(done) = path.pop() {
                    states.insert(done, NodeState::Visited);
                }
                continue;
            };

            match states.get(&child) {
                Some(NodeState::Visiting) => {
                    let start = path.iter().position(|entry| *entry == child).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(child);
                    return Some(cycle);
                }
                Some(NodeState::Visited) => {}
                None => {
                    states.insert(child, NodeState::Visiting);
                    path.push(child);
                    frames.push(self.children(child));
                }
            }
        }
        None
    }

    fn children(&self, id: u32) -> impl Iterator<Item = &u32> {
        self.dependents.get(&id).into_iter().flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Visiting,
    Visited,
}

/// Step numbers whose dependencies are all completed and which are not
/// completed themselves, ascending.
pub fn ready_steps(steps: &[RoadmapStep]) -> Vec<u32> {
    let completed: BTreeSet<u32> = steps
        .iter()
        .filter(|s| s.completed)
        .map(|s| s.step_number)
        .collect();
    let mut ready: Vec<u32> = steps
        .iter()
        .filter(|s| !s.completed && s.is_ready(&completed))
        .map(|s| s.step_number)
        .collect();
    ready.sort_unstable();
    ready
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(n: u32, deps: &[u32]) -> RoadmapStep {
        RoadmapStep::new(n, format!("step {n}")).depends_on(deps.iter().copied())
    }

    #[test]
    fn accepts_valid_graph_and_orders_dependencies_first() {
        let steps = vec![step(3, &[1, 2]), step(2, &[1]), step(1, &[])];
        let graph = DependencyGraph::build(&steps).unwrap();
        assert_eq!(graph.topological_order(), vec![1, 2, 3]);
        assert_eq!(graph.dependencies_of(3).unwrap().len(), 2);
    }

    #[test]
    fn topological_order_breaks_ties_by_step_number() {
        let steps = vec![step(4, &[]), step(2, &[]), step(9, &[2]), step(1, &[])];
        let graph = DependencyGraph::build(&steps).unwrap();
        assert_eq!(graph.topological_order(), vec![1, 2, 4, 9]);
    }

    #[test]
    fn rejects_duplicate_step_numbers() {
        let err = DependencyGraph::build(&[step(1, &[]), step(1, &[])]).unwrap_err();
        assert_eq!(err, PlanError::DuplicateStep(1));
    }

    #[test]
    fn rejects_unknown_dependency() {
        let err = DependencyGraph::build(&[step(1, &[]), step(2, &[7])]).unwrap_err();
        assert_eq!(err.to_string(), "step 2 depends on unknown step 7");
    }

    #[test]
    fn reports_two_step_cycle_path() {
        let err = DependencyGraph::build(&[step(1, &[2]), step(2, &[1])]).unwrap_err();
        assert_eq!(err.to_string(), "dependency cycle detected: 1 -> 2 -> 1");
    }

    #[test]
    fn reports_self_dependency() {
        let err = DependencyGraph::build(&[step(5, &[5])]).unwrap_err();
        assert_eq!(err, PlanError::DependencyCycle(vec![5, 5]));
    }

    #[test]
    fn reports_cycle_inside_subgraph() {
        let steps = vec![step(1, &[]), step(2, &[1, 4]), step(3, &[2]), step(4, &[3])];
        let err = DependencyGraph::build(&steps).unwrap_err();
        assert_eq!(err, PlanError::DependencyCycle(vec![2, 3, 4, 2]));
    }

    #[test]
    fn long_linear_chain_builds_without_recursion() {
        let steps: Vec<RoadmapStep> = (1..=200_000)
            .map(|n| if n == 1 { step(1, &[]) } else { step(n, &[n - 1]) })
            .collect();

        let graph = DependencyGraph::build(&steps).unwrap();
        let order = graph.topological_order();
        assert_eq!(order.len(), 200_000);
        assert_eq!(order.first(), Some(&1));
        assert_eq!(order.last(), Some(&200_000));
    }

    #[test]
    fn long_chain_closing_into_a_cycle_is_reported() {
        let mut steps: Vec<RoadmapStep> = (2..=50_000).map(|n| step(n, &[n - 1])).collect();
        steps.push(step(1, &[50_000]));

        let err = DependencyGraph::build(&steps).unwrap_err();
        let PlanError::DependencyCycle(path) = err else {
            panic!("expected a dependency cycle");
        };
        assert_eq!(path.len(), 50_001);
        assert_eq!(path.first(), path.last());
    }

    #[test]
    fn empty_roadmap_is_valid() {
        let graph = DependencyGraph::build(&[]).unwrap();
        assert!(graph.topological_order().is_empty());
    }

    #[test]
    fn ready_steps_require_completed_dependencies() {
        let mut steps = vec![step(1, &[]), step(2, &[1]), step(3, &[1, 2])];
        assert_eq!(ready_steps(&steps), vec![1]);

        steps[0].completed = true;
        assert_eq!(ready_steps(&steps), vec![2]);

        steps[1].completed = true;
        assert_eq!(ready_steps(&steps), vec![3]);
    }

    #[test]
    fn deserializes_planner_shape_with_defaults() {
        let step: RoadmapStep = serde_json::from_value(serde_json::json!({
            "step_number": 2,
            "title": "Publish landing page",
            "dependencies": [1],
            "automation_possible": true,
            "automation_method": "web_navigation"
        }))
        .unwrap();

        assert_eq!(step.dependencies, BTreeSet::from([1]));
        assert_eq!(step.execution_kind(), "web_navigation");
        assert!(!step.completed);
        assert_eq!(RoadmapStep::new(9, "call legal").execution_kind(), "manual");
    }
}
