use super::{ApprovalVerdict, RiskLevel, SafetyTier, VerdictSource};
use crate::config::GateConfig;
use crate::error::GateError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::warn;

/// Body posted to the policy service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRequest {
    pub action: Value,
    pub context: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl PolicyRequest {
    pub fn new(action: Value, context: Map<String, Value>) -> Self {
        Self {
            action,
            context,
            timestamp: Utc::now(),
        }
    }
}

/// First stage of the gate. Any error sends the gate to its fallback.
#[async_trait]
pub trait PolicyService: Send + Sync {
    fn name(&self) -> &str;

    async fn evaluate(&self, request: &PolicyRequest) -> Result<ApprovalVerdict, GateError>;
}

fn default_risk() -> RiskLevel {
    RiskLevel::Medium
}

fn default_tier() -> SafetyTier {
    SafetyTier::Caution
}

/// Wire shape of a policy service reply. Missing fields take conservative
/// defaults: not approved, medium risk, caution tier.
#[derive(Debug, Deserialize)]
struct PolicyResponse {
    #[serde(default)]
    approved: bool,
    #[serde(default = "default_risk", rename = "consciousness_level")]
    risk_level: RiskLevel,
    #[serde(default = "default_tier")]
    safety_tier: SafetyTier,
    #[serde(default)]
    reasoning: String,
    #[serde(default, rename = "constitutional_notes")]
    notes: Vec<String>,
    #[serde(default, rename = "requires_human_approval")]
    requires_human_confirmation: bool,
}

impl From<PolicyResponse> for ApprovalVerdict {
    fn from(response: PolicyResponse) -> Self {
        Self {
            approved: response.approved,
            risk_level: response.risk_level,
            safety_tier: response.safety_tier,
            reasoning: response.reasoning,
            notes: response.notes,
            requires_human_confirmation: response.requires_human_confirmation,
            source: VerdictSource::PolicyService,
        }
        .normalized()
    }
}

/// HTTP client for the policy service endpoint.
pub struct RemotePolicyService {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl RemotePolicyService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .unwrap_or_else(|error| {
                warn!(%error, "policy client builder failed, using default client");
                Client::new()
            });
        Self::with_client(client, endpoint, timeout)
    }

    /// The request timeout is applied per call, so it holds even for a
    /// client built without one.
    fn with_client(client: Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PolicyService for RemotePolicyService {
    fn name(&self) -> &str {
        "remote"
    }

    async fn evaluate(&self, request: &PolicyRequest) -> Result<ApprovalVerdict, GateError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GateError::Timeout
                } else {
                    GateError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GateError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GateError::Timeout
            } else {
                GateError::Transport(e.to_string())
            }
        })?;
        let parsed: PolicyResponse = serde_json::from_str(&body)
            .map_err(|e| GateError::MalformedResponse(e.to_string()))?;
        Ok(parsed.into())
    }
}
