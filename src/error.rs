use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `stepwise`.
///
/// Each subsystem defines its own error type. Library callers can match on
/// these to decide recovery strategy; caller-implemented seams (planners,
/// confirmation brokers) continue to use `anyhow::Result`.
#[derive(Debug, Error)]
pub enum StepwiseError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Action / selector validation ────────────────────────────────────
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    // ── Approval gate ───────────────────────────────────────────────────
    #[error("gate: {0}")]
    Gate(#[from] GateError),

    // ── Browser driver ──────────────────────────────────────────────────
    #[error("driver: {0}")]
    Driver(#[from] DriverError),

    // ── Roadmap / plan ──────────────────────────────────────────────────
    #[error("plan: {0}")]
    Plan(#[from] PlanError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Validation errors ───────────────────────────────────────────────────────

/// A single violated rule on an action or selector.
///
/// `field` names the offending attribute so callers can point at the exact
/// input to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

// ─── Gate errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GateError {
    #[error("policy service unreachable: {0}")]
    Transport(String),

    #[error("policy service returned HTTP {0}")]
    Status(u16),

    #[error("policy service timed out")]
    Timeout,

    #[error("malformed policy response: {0}")]
    MalformedResponse(String),

    #[error("malformed gate context: {0}")]
    MalformedContext(String),
}

// ─── Driver errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("browser unavailable: {0}")]
    Unavailable(String),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("{action} failed: {message}")]
    Interaction { action: String, message: String },

    #[error("script execution failed: {0}")]
    Script(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error("{action} timed out after {timeout_ms}ms")]
    Timeout { action: String, timeout_ms: u64 },

    #[error("invalid driver argument: {0}")]
    InvalidArgument(String),
}

// ─── Plan errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("duplicate step number: {0}")]
    DuplicateStep(u32),

    #[error("step {step} depends on unknown step {dependency}")]
    UnknownDependency { step: u32, dependency: u32 },

    #[error("dependency cycle detected: {}", format_cycle(.0))]
    DependencyCycle(Vec<u32>),

    #[error("failed to parse plan: {0}")]
    Parse(String),
}

fn format_cycle(path: &[u32]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
