pub mod parser;
pub mod roadmap;
pub mod traits;

pub use parser::{parse_action_plan, parse_roadmap, strip_code_fence};
pub use roadmap::{DependencyGraph, RoadmapStep, ready_steps};
pub use traits::{StaticPlanner, StepPlanner};
