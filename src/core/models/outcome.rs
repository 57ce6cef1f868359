use std::path::PathBuf;

use serde::Serialize;

use crate::core::models::backend_result::{BackendId, BackendResult, Outcome};

/// Terminal classification of a cascade in which no backend succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    WrongPassword,
    UnsupportedEncryption,
    NoBackendAvailable,
    ExhaustedBackends,
}

impl FailureKind {
    /// Classify an exhaustive failure from its attempts, first rule wins:
    /// any wrong password, then all tools missing, then every usable
    /// tool rejecting the encryption scheme, else a generic failure.
    pub fn classify(attempts: &[BackendResult]) -> Self {
        if attempts.iter().any(|r| r.outcome == Outcome::WrongPassword) {
            return FailureKind::WrongPassword;
        }
        let mut usable = attempts
            .iter()
            .filter(|r| r.outcome != Outcome::ToolMissing)
            .peekable();
        if usable.peek().is_none() {
            return FailureKind::NoBackendAvailable;
        }
        if usable.all(|r| r.outcome == Outcome::UnsupportedEncryption) {
            return FailureKind::UnsupportedEncryption;
        }
        FailureKind::ExhaustedBackends
    }

    /// Process exit code scripts can branch on.
    pub fn exit_code(&self) -> i32 {
        match self {
            FailureKind::ExhaustedBackends => 1,
            FailureKind::WrongPassword => 2,
            FailureKind::UnsupportedEncryption => 3,
            FailureKind::NoBackendAvailable => 4,
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            FailureKind::WrongPassword => "the password was rejected",
            FailureKind::UnsupportedEncryption => {
                "no backend supports this file's encryption scheme"
            }
            FailureKind::NoBackendAvailable => {
                "none of qpdf, mutool or ghostscript could be found on this system"
            }
            FailureKind::ExhaustedBackends => "every backend failed",
        }
    }
}

/// Final result of a full cascade. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecryptionOutcome {
    /// A backend produced a verified, unencrypted output.
    Decrypted {
        backend: BackendId,
        output: PathBuf,
        attempts: Vec<BackendResult>,
    },
    /// The input was not encrypted; it was copied unchanged.
    PassThrough { output: PathBuf },
    /// Every attempted backend failed, in attempt order.
    Failed {
        kind: FailureKind,
        attempts: Vec<BackendResult>,
    },
}

impl DecryptionOutcome {
    pub fn failed(attempts: Vec<BackendResult>) -> Self {
        DecryptionOutcome::Failed {
            kind: FailureKind::classify(&attempts),
            attempts,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            DecryptionOutcome::Failed { kind, .. } => kind.exit_code(),
            _ => 0,
        }
    }

    pub fn attempts(&self) -> &[BackendResult] {
        match self {
            DecryptionOutcome::Decrypted { attempts, .. }
            | DecryptionOutcome::Failed { attempts, .. } => attempts,
            DecryptionOutcome::PassThrough { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(backend: BackendId, outcome: Outcome) -> BackendResult {
        BackendResult::new(backend, outcome, None, Duration::ZERO)
    }

    #[test]
    fn wrong_password_wins_over_everything() {
        let attempts = vec![
            result(BackendId::Qpdf, Outcome::ToolMissing),
            result(BackendId::Mutool, Outcome::WrongPassword),
            result(BackendId::Ghostscript, Outcome::ToolError),
        ];
        assert_eq!(FailureKind::classify(&attempts), FailureKind::WrongPassword);
        assert_eq!(DecryptionOutcome::failed(attempts).exit_code(), 2);
    }

    #[test]
    fn all_missing_means_no_backend() {
        let attempts: Vec<_> = BackendId::DEFAULT_ORDER
            .iter()
            .map(|b| result(*b, Outcome::ToolMissing))
            .collect();
        assert_eq!(
            FailureKind::classify(&attempts),
            FailureKind::NoBackendAvailable
        );
        assert_eq!(FailureKind::NoBackendAvailable.exit_code(), 4);
    }

    #[test]
    fn unsupported_everywhere_it_ran() {
        let attempts = vec![
            result(BackendId::Qpdf, Outcome::UnsupportedEncryption),
            result(BackendId::Mutool, Outcome::ToolMissing),
            result(BackendId::Ghostscript, Outcome::UnsupportedEncryption),
        ];
        assert_eq!(
            FailureKind::classify(&attempts),
            FailureKind::UnsupportedEncryption
        );
        assert_eq!(FailureKind::UnsupportedEncryption.exit_code(), 3);
    }

    #[test]
    fn mixed_failures_are_generic() {
        let attempts = vec![
            result(BackendId::Qpdf, Outcome::UnsupportedEncryption),
            result(BackendId::Mutool, Outcome::ToolError),
        ];
        assert_eq!(
            FailureKind::classify(&attempts),
            FailureKind::ExhaustedBackends
        );
        assert_eq!(FailureKind::ExhaustedBackends.exit_code(), 1);
    }

    #[test]
    fn success_exits_zero() {
        let outcome = DecryptionOutcome::PassThrough {
            output: PathBuf::from("a.pdf"),
        };
        assert_eq!(outcome.exit_code(), 0);
        assert!(outcome.attempts().is_empty());
    }
}
