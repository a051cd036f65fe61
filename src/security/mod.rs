pub mod approval;

pub use approval::{
    ApprovalGate, ApprovalVerdict, AutoDenyBroker, CliConfirmationBroker, ConfirmationBroker,
    ConfirmationRequest, RiskLevel, SafetyTier, VerdictSource,
};
