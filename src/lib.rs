#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod browser;
pub mod config;
pub mod error;
pub mod executor;
pub mod observability;
pub mod planner;
pub mod security;

pub use browser::{Action, BrowserDriver, ElementSelector};
pub use config::Config;
pub use error::StepwiseError;
pub use executor::{ExecutionReport, StepOutcome, TaskExecutor};
pub use planner::{RoadmapStep, StepPlanner};
pub use security::approval::{ApprovalGate, ApprovalVerdict};
