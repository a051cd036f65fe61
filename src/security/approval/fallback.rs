use super::{ApprovalVerdict, RiskLevel, SafetyTier, VerdictSource};
use serde_json::Value;

/// Tokens that mark a proposal as potentially destructive.
pub const DENY_LIST: &[&str] = &[
    "delete", "remove", "drop", "truncate", "format", "rm -rf", "sudo", "admin", "password",
    "secret",
];

pub const UNAVAILABLE_NOTE: &str = "policy service unavailable: local deny-list applied";

/// First deny-list token found in the lowercased JSON form of `proposal`.
pub fn matched_token(proposal: &Value) -> Option<&'static str> {
    let text = proposal.to_string().to_lowercase();
    DENY_LIST.iter().copied().find(|token| text.contains(token))
}

/// Local decision used when the policy service cannot be reached. Pure.
pub fn fallback_verdict(proposal: &Value) -> ApprovalVerdict {
    match matched_token(proposal) {
        Some(token) => ApprovalVerdict {
            approved: false,
            risk_level: RiskLevel::Critical,
            safety_tier: SafetyTier::Blocked,
            reasoning: format!(
                "proposal contains dangerous token '{token}' and the policy service is unavailable to review it"
            ),
            notes: vec![
                UNAVAILABLE_NOTE.to_string(),
                "blocked: destructive actions require policy service review".to_string(),
            ],
            requires_human_confirmation: true,
            source: VerdictSource::Fallback,
        },
        None => ApprovalVerdict {
            approved: true,
            risk_level: RiskLevel::Low,
            safety_tier: SafetyTier::Safe,
            reasoning: "approved by local fallback rules".to_string(),
            notes: vec![UNAVAILABLE_NOTE.to_string()],
            requires_human_confirmation: false,
            source: VerdictSource::Fallback,
        },
    }
}
