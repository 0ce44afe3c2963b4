use std::io::{self, BufRead, IsTerminal, Write};

use super::options::ConfirmPolicy;

/// Interactive confirmation handle. Only consulted when the policy is
/// [`ConfirmPolicy::AlwaysAsk`].
pub trait Confirm {
    /// Ask the operator a yes/no question; `false` on any ambiguity.
    fn confirm(&mut self, question: &str) -> bool;
}

/// Resolve a destructive-action decision against the configured policy.
pub fn decide(policy: ConfirmPolicy, prompt: &mut dyn Confirm, question: &str) -> bool {
    match policy {
        ConfirmPolicy::AutoApprove => true,
        ConfirmPolicy::AutoDeny => false,
        ConfirmPolicy::AlwaysAsk => prompt.confirm(question),
    }
}

/// Terminal-backed [`Confirm`] reading `y`/`yes` from stdin. Declines when
/// stdin is not a terminal, so piped invocations never hang on a prompt.
#[derive(Debug, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        if !io::stdin().is_terminal() {
            return false;
        }

        print!("{question} [y/N] ");
        let _ = io::stdout().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// [`Confirm`] that refuses everything. Used where a policy already decided.
#[derive(Debug, Default)]
pub struct DenyAll;

impl Confirm for DenyAll {
    fn confirm(&mut self, _question: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorded {
        answer: bool,
        asked: usize,
    }

    impl Confirm for Recorded {
        fn confirm(&mut self, _question: &str) -> bool {
            self.asked += 1;
            self.answer
        }
    }

    #[test]
    fn auto_policies_never_consult_the_prompt() {
        let mut prompt = Recorded {
            answer: true,
            asked: 0,
        };
        assert!(decide(ConfirmPolicy::AutoApprove, &mut prompt, "kill it?"));
        assert!(!decide(ConfirmPolicy::AutoDeny, &mut prompt, "kill it?"));
        assert_eq!(prompt.asked, 0);
    }

    #[test]
    fn always_ask_delegates_to_the_prompt() {
        let mut prompt = Recorded {
            answer: true,
            asked: 0,
        };
        assert!(decide(ConfirmPolicy::AlwaysAsk, &mut prompt, "kill it?"));
        assert_eq!(prompt.asked, 1);
    }
}
