//! Pre-execution approval. A proposed step goes to the remote policy
//! service first; if that fails for any reason the local deny-list decides.
//! Verdicts that ask for a human are resolved by a [`ConfirmationBroker`].

pub mod confirm;
pub mod fallback;
pub mod gate;
pub mod remote;

pub use confirm::{AutoDenyBroker, CliConfirmationBroker, ConfirmationBroker, ConfirmationRequest};
pub use fallback::{DENY_LIST, fallback_verdict};
pub use gate::ApprovalGate;
pub use remote::{PolicyRequest, PolicyService, RemotePolicyService};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SafetyTier {
    Safe,
    #[default]
    Caution,
    Risky,
    Blocked,
}

/// Where a verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerdictSource {
    PolicyService,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalVerdict {
    pub approved: bool,
    pub risk_level: RiskLevel,
    pub safety_tier: SafetyTier,
    pub reasoning: String,
    pub notes: Vec<String>,
    /// When set, `approved` is the verdict before a human has answered.
    pub requires_human_confirmation: bool,
    pub source: VerdictSource,
}

impl ApprovalVerdict {
    /// Enforce that a blocked tier is never approved.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.safety_tier == SafetyTier::Blocked {
            self.approved = false;
        }
        self
    }

    /// True when the policy service was not consulted.
    pub fn is_degraded(&self) -> bool {
        self.source == VerdictSource::Fallback
    }

    pub fn is_blocked(&self) -> bool {
        self.safety_tier == SafetyTier::Blocked
    }
}
