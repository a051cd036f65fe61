//! Roadmap execution: picks ready steps in dependency order, plans and
//! validates their actions, clears them with the approval gate and runs them
//! against a browser driver.

pub mod report;
pub mod runner;
pub mod task;

#[cfg(test)]
mod tests;

pub use report::{ExecutionReport, StepOutcome, StepReport};
pub use runner::{CANCELLED_BY_USER, TaskExecutor};
pub use task::{ExecutableTask, StepResult, TaskStatus};
