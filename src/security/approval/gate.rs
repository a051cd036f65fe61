use super::ApprovalVerdict;
use super::fallback::fallback_verdict;
use super::remote::{PolicyRequest, PolicyService, RemotePolicyService};
use crate::config::GateConfig;
use crate::error::GateError;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Two-stage approval: the policy service when configured, the local
/// deny-list otherwise or whenever the service fails.
pub struct ApprovalGate {
    primary: Option<Box<dyn PolicyService>>,
}

impl ApprovalGate {
    pub fn new(primary: Box<dyn PolicyService>) -> Self {
        Self {
            primary: Some(primary),
        }
    }

    /// A gate that never calls out and always uses the fallback rules.
    pub fn offline() -> Self {
        Self { primary: None }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        if config.enabled {
            Self::new(Box::new(RemotePolicyService::from_config(config)))
        } else {
            Self::offline()
        }
    }

    /// Evaluate a proposal. Only a context that is neither an object nor
    /// null is an error; every service failure resolves to a fallback
    /// verdict.
    pub async fn evaluate(
        &self,
        proposal: &Value,
        context: &Value,
    ) -> Result<ApprovalVerdict, GateError> {
        let context = context_map(context)?;

        let Some(primary) = &self.primary else {
            return Ok(fallback_verdict(proposal));
        };

        let request = PolicyRequest::new(proposal.clone(), context);
        match primary.evaluate(&request).await {
            Ok(verdict) => {
                info!(
                    service = primary.name(),
                    approved = verdict.approved,
                    tier = %verdict.safety_tier,
                    risk = %verdict.risk_level,
                    "policy verdict received"
                );
                Ok(verdict)
            }
            Err(error) => {
                let verdict = fallback_verdict(proposal);
                warn!(
                    service = primary.name(),
                    %error,
                    approved = verdict.approved,
                    tier = %verdict.safety_tier,
                    "policy service unavailable, using local fallback"
                );
                Ok(verdict)
            }
        }
    }
}

fn context_map(context: &Value) -> Result<Map<String, Value>, GateError> {
    match context {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        other => Err(GateError::MalformedContext(format!(
            "context must be a JSON object, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
