use super::ApprovalVerdict;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    pub step_number: u32,
    pub title: String,
    pub verdict: ApprovalVerdict,
    /// One line per planned action
    pub actions: Vec<String>,
}

/// Asks a human whether a step flagged for confirmation may run. `Ok(true)`
/// is an explicit yes; anything else (no, timeout, error) cancels the step.
pub trait ConfirmationBroker: Send + Sync {
    fn confirm<'a>(
        &'a self,
        request: &'a ConfirmationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;
}

/// Declines everything. Default for unattended runs.
pub struct AutoDenyBroker {
    pub reason: String,
}

impl Default for AutoDenyBroker {
    fn default() -> Self {
        Self {
            reason: "non-interactive run".to_string(),
        }
    }
}

impl ConfirmationBroker for AutoDenyBroker {
    fn confirm<'a>(
        &'a self,
        request: &'a ConfirmationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            tracing::info!(
                step = request.step_number,
                reason = %self.reason,
                "confirmation auto-denied"
            );
            Ok(false)
        })
    }
}

/// Prompts on stderr and reads a yes/no answer from stdin.
pub struct CliConfirmationBroker {
    timeout: Duration,
}

impl CliConfirmationBroker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn default_timeout() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl ConfirmationBroker for CliConfirmationBroker {
    fn confirm<'a>(
        &'a self,
        request: &'a ConfirmationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            eprintln!();
            eprintln!("┌─ Confirmation Required ──────────────────────────");
            eprintln!("│ Step:    {} {}", request.step_number, request.title);
            eprintln!(
                "│ Verdict: {} / {}",
                request.verdict.safety_tier, request.verdict.risk_level
            );
            eprintln!("│ Reason:  {}", request.verdict.reasoning);
            for note in &request.verdict.notes {
                eprintln!("│ Note:    {note}");
            }
            for action in &request.actions {
                eprintln!("│   - {action}");
            }
            eprintln!("├──────────────────────────────────────────────────");
            eprintln!("│ Proceed? [y]es / [N]o");
            eprintln!("└──────────────────────────────────────────────────");
            eprint!("  > ");

            match tokio::time::timeout(self.timeout, read_line()).await {
                Ok(Ok(line)) => Ok(is_affirmative(&line)),
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "could not read confirmation");
                    Ok(false)
                }
                Err(_) => {
                    tracing::warn!(step = request.step_number, "confirmation timed out");
                    Ok(false)
                }
            }
        })
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn read_line() -> Result<String> {
    let line = tokio::task::spawn_blocking(|| {
        let mut input = String::new();
        let read = std::io::stdin().read_line(&mut input)?;
        if read == 0 {
            anyhow::bail!("stdin closed");
        }
        Ok(input)
    })
    .await??;
    Ok(line)
}
