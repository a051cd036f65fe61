use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const DEFAULT_POLICY_ENDPOINT: &str = "http://localhost:8150/api/v1/consciousness/check";
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            browser: BrowserConfig::default(),
            gate: GateConfig::default(),
            executor: ExecutorConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

// ── Browser ─────────────────────────────────────────────────────

fn default_browser_binary() -> String {
    "agent-browser".into()
}

fn default_true() -> bool {
    true
}

fn default_command_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// CLI used to drive the browser session
    #[serde(default = "default_browser_binary")]
    pub binary: String,
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Hosts navigation may reach. Empty allows any public host.
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default = "default_true")]
    pub block_private_hosts: bool,
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            binary: default_browser_binary(),
            session_name: None,
            headless: true,
            allowed_domains: Vec::new(),
            block_private_hosts: true,
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

// ── Approval gate ───────────────────────────────────────────────

fn default_policy_endpoint() -> String {
    DEFAULT_POLICY_ENDPOINT.into()
}

fn default_gate_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// When false the gate always uses the local fallback rules
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_policy_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_gate_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_policy_endpoint(),
            timeout_secs: default_gate_timeout_secs(),
        }
    }
}

// ── Executor ────────────────────────────────────────────────────

fn default_action_pause_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Pause between consecutive actions of one step
    #[serde(default = "default_action_pause_ms")]
    pub action_pause_ms: u64,
    /// Extra entries merged into every gate context
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            action_pause_ms: default_action_pause_ms(),
            context: Map::new(),
        }
    }
}

// ── Observability ───────────────────────────────────────────────

fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}
