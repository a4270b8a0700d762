//! Confirmation prompts for state-changing operations.

use std::fmt;
use std::io::IsTerminal;

use tracing::warn;
use wsctl_proto::ConfirmImpact;

/// What the user is asked to approve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    /// API operation name.
    pub operation: &'static str,
    /// Cmdlet-style alias.
    pub alias: &'static str,
    /// Human-readable target, usually the positional parameter's value.
    pub target: Option<String>,
    /// Impact of the operation.
    pub impact: ConfirmImpact,
}

impl fmt::Display for ConfirmPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "Perform {} ({}) on \"{target}\"?", self.operation, self.alias),
            None => write!(f, "Perform {} ({})?", self.operation, self.alias),
        }
    }
}

/// Decides whether a prompted operation may proceed.
pub trait Confirmer: Send + Sync {
    /// `true` to proceed.
    fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Interactive yes/no prompt on the terminal.
///
/// Without a terminal, or when the prompt fails, the answer is "no".
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptConfirmer;

impl Confirmer for PromptConfirmer {
    fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        if !std::io::stdin().is_terminal() {
            warn!(operation = prompt.operation, "confirmation required but stdin is not a terminal");
            return false;
        }
        match inquire::Confirm::new(&prompt.to_string())
            .with_default(false)
            .with_help_message(&format!("impact: {} (use --force to skip)", prompt.impact.as_str()))
            .prompt()
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!(operation = prompt.operation, error = %e, "confirmation prompt failed");
                false
            }
        }
    }
}

/// Fixed answer, used in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirmer(pub bool);

impl Confirmer for FixedConfirmer {
    fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        self.0
    }
}
