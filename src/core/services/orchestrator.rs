use std::sync::Arc;

use crate::core::errors::{DecryptPdfError, Result};
use crate::core::models::backend_result::{BackendResult, Outcome};
use crate::core::models::outcome::DecryptionOutcome;
use crate::core::models::request::DecryptionRequest;
use crate::core::services::pdf_probe;
use crate::core::services::staged_output::StagedOutput;
use crate::core::traits::backend::DecryptBackend;
use crate::core::traits::interrupt::{Interrupt, Never};
use crate::core::traits::observer::{CascadeObserver, Silent};

/// Runs the cascade: tries backends one at a time in the request's order
/// and stops at the first success.
///
/// Attempts are strictly sequential; two engines never write towards the
/// same output concurrently.
pub struct Orchestrator {
    backends: Vec<Box<dyn DecryptBackend>>,
    interrupt: Arc<dyn Interrupt>,
}

impl Orchestrator {
    /// `backends` is the registry of available engines; the request decides
    /// which of them run and in what order.
    pub fn new(backends: Vec<Box<dyn DecryptBackend>>) -> Self {
        Self {
            backends,
            interrupt: Arc::new(Never),
        }
    }

    /// Stop between steps once `interrupt` fires.
    pub fn with_interrupt(mut self, interrupt: Arc<dyn Interrupt>) -> Self {
        self.interrupt = interrupt;
        self
    }

    fn checkpoint(&self) -> Result<()> {
        if self.interrupt.is_interrupted() {
            return Err(DecryptPdfError::Cancelled);
        }
        Ok(())
    }

    pub fn decrypt(&self, request: &DecryptionRequest) -> Result<DecryptionOutcome> {
        self.decrypt_observed(request, &mut Silent)
    }

    /// Same as `decrypt`, reporting progress to `observer`.
    ///
    /// - An input without an encryption dictionary is copied through
    ///   without starting any tool.
    /// - `WrongPassword` ends the cascade when a password was supplied;
    ///   without one it only means this engine needed one.
    /// - Every other failure moves on to the next backend.
    pub fn decrypt_observed(
        &self,
        request: &DecryptionRequest,
        observer: &mut dyn CascadeObserver,
    ) -> Result<DecryptionOutcome> {
        let probe = pdf_probe::probe(request.input())?;
        self.checkpoint()?;
        if !probe.is_pdf {
            return Err(DecryptPdfError::NotAPdf {
                path: request.input().to_path_buf(),
            });
        }
        if !probe.is_encrypted {
            observer.passing_through();
            return self.pass_through(request);
        }

        let mut attempts = Vec::with_capacity(request.backends().len());

        for &id in request.backends() {
            self.checkpoint()?;
            let result = match self.backends.iter().find(|b| b.id() == id) {
                Some(backend) => {
                    observer.attempt_started(id);
                    backend.attempt(request)?
                }
                None => BackendResult::missing(id, "backend is not available in this build"),
            };
            observer.attempt_finished(&result);

            let outcome = result.outcome;
            attempts.push(result);

            if outcome == Outcome::Success {
                return Ok(DecryptionOutcome::Decrypted {
                    backend: id,
                    output: request.output().to_path_buf(),
                    attempts,
                });
            }
            self.checkpoint()?;
            if outcome == Outcome::WrongPassword && request.password().is_some() {
                return Ok(DecryptionOutcome::failed(attempts));
            }
        }

        Ok(DecryptionOutcome::failed(attempts))
    }

    /// Copy an unencrypted input to the output. In-place requests are a no-op.
    fn pass_through(&self, request: &DecryptionRequest) -> Result<DecryptionOutcome> {
        if !request.is_in_place() {
            let staged = StagedOutput::create(request.output())?;
            std::fs::copy(request.input(), staged.path())?;
            self.checkpoint()?;
            staged.commit()?;
        }
        Ok(DecryptionOutcome::PassThrough {
            output: request.output().to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::backend_result::{BackendId, ToolStatus};
    use crate::core::models::outcome::FailureKind;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const PLAIN_PDF: &[u8] = b"%PDF-1.7\n1 0 obj << >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF\n";
    const LOCKED_PDF: &[u8] =
        b"%PDF-1.7\n1 0 obj << >> endobj\ntrailer << /Root 1 0 R /Encrypt 2 0 R >>\n%%EOF\n";

    /// Backend that answers with a fixed outcome and counts its calls.
    struct Fake {
        id: BackendId,
        outcome: Outcome,
        calls: Arc<AtomicUsize>,
    }

    impl DecryptBackend for Fake {
        fn id(&self) -> BackendId {
            self.id
        }

        fn attempt(&self, request: &DecryptionRequest) -> Result<BackendResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.outcome == Outcome::Success {
                std::fs::write(request.output(), PLAIN_PDF)?;
            }
            Ok(BackendResult::new(
                self.id,
                self.outcome,
                None,
                Duration::from_millis(1),
            ))
        }

        fn status(&self) -> Result<ToolStatus> {
            Ok(ToolStatus::Available {
                program: PathBuf::from(self.id.as_str()),
                version: "fake".into(),
            })
        }
    }

    /// Backend that behaves as if the user pressed Ctrl-C mid-run.
    struct Interrupted;

    impl DecryptBackend for Interrupted {
        fn id(&self) -> BackendId {
            BackendId::Qpdf
        }

        fn attempt(&self, _request: &DecryptionRequest) -> Result<BackendResult> {
            Err(DecryptPdfError::Cancelled)
        }

        fn status(&self) -> Result<ToolStatus> {
            Err(DecryptPdfError::Cancelled)
        }
    }

    struct Setup {
        _dir: tempfile::TempDir,
        input: PathBuf,
        calls: Vec<Arc<AtomicUsize>>,
        orchestrator: Orchestrator,
    }

    impl Setup {
        fn new(content: &[u8], outcomes: [Outcome; 3]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let input = dir.path().join("secret.pdf");
            std::fs::write(&input, content).unwrap();

            let mut calls = Vec::new();
            let mut backends: Vec<Box<dyn DecryptBackend>> = Vec::new();
            for (id, outcome) in BackendId::DEFAULT_ORDER.into_iter().zip(outcomes) {
                let counter = Arc::new(AtomicUsize::new(0));
                calls.push(Arc::clone(&counter));
                backends.push(Box::new(Fake {
                    id,
                    outcome,
                    calls: counter,
                }));
            }

            Self {
                _dir: dir,
                input,
                calls,
                orchestrator: Orchestrator::new(backends),
            }
        }

        fn request(&self, password: Option<&str>) -> DecryptionRequest {
            request_for(&self.input, password)
        }

        fn call_counts(&self) -> Vec<usize> {
            self.calls.iter().map(|c| c.load(Ordering::SeqCst)).collect()
        }
    }

    fn request_for(input: &Path, password: Option<&str>) -> DecryptionRequest {
        DecryptionRequest::new(
            input.to_path_buf(),
            None,
            password.map(String::from),
            BackendId::DEFAULT_ORDER.to_vec(),
            Duration::from_secs(30),
            false,
        )
        .unwrap()
    }

    fn outcomes_of(outcome: &DecryptionOutcome) -> Vec<Outcome> {
        outcome.attempts().iter().map(|r| r.outcome).collect()
    }

    #[test]
    fn first_success_stops_the_cascade() {
        let setup = Setup::new(
            LOCKED_PDF,
            [Outcome::Success, Outcome::Success, Outcome::Success],
        );
        let outcome = setup.orchestrator.decrypt(&setup.request(Some("abc"))).unwrap();

        match &outcome {
            DecryptionOutcome::Decrypted {
                backend, output, ..
            } => {
                assert_eq!(*backend, BackendId::Qpdf);
                assert!(output.ends_with("secret-decrypted.pdf"));
                assert!(output.exists());
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(setup.call_counts(), vec![1, 0, 0]);
    }

    #[test]
    fn recoverable_failures_fall_through_to_next_backend() {
        let setup = Setup::new(
            LOCKED_PDF,
            [
                Outcome::ToolMissing,
                Outcome::UnsupportedEncryption,
                Outcome::Success,
            ],
        );
        let outcome = setup.orchestrator.decrypt(&setup.request(None)).unwrap();

        assert!(matches!(
            outcome,
            DecryptionOutcome::Decrypted {
                backend: BackendId::Ghostscript,
                ..
            }
        ));
        assert_eq!(
            outcomes_of(&outcome),
            vec![
                Outcome::ToolMissing,
                Outcome::UnsupportedEncryption,
                Outcome::Success
            ]
        );
        assert_eq!(setup.call_counts(), vec![1, 1, 1]);
    }

    #[test]
    fn wrong_password_short_circuits_when_password_given() {
        let setup = Setup::new(
            LOCKED_PDF,
            [Outcome::WrongPassword, Outcome::Success, Outcome::Success],
        );
        let request = setup.request(Some("wrong"));
        let outcome = setup.orchestrator.decrypt(&request).unwrap();

        assert!(matches!(
            outcome,
            DecryptionOutcome::Failed {
                kind: FailureKind::WrongPassword,
                ..
            }
        ));
        assert_eq!(outcome.exit_code(), 2);
        assert_eq!(setup.call_counts(), vec![1, 0, 0]);
        assert!(!request.output().exists());
    }

    #[test]
    fn wrong_password_without_password_keeps_trying() {
        let setup = Setup::new(
            LOCKED_PDF,
            [Outcome::WrongPassword, Outcome::Success, Outcome::ToolError],
        );
        let outcome = setup.orchestrator.decrypt(&setup.request(None)).unwrap();

        assert!(matches!(
            outcome,
            DecryptionOutcome::Decrypted {
                backend: BackendId::Mutool,
                ..
            }
        ));
        assert_eq!(setup.call_counts(), vec![1, 1, 0]);
    }

    #[test]
    fn all_tools_missing_is_no_backend_available() {
        let setup = Setup::new(
            LOCKED_PDF,
            [
                Outcome::ToolMissing,
                Outcome::ToolMissing,
                Outcome::ToolMissing,
            ],
        );
        let outcome = setup.orchestrator.decrypt(&setup.request(None)).unwrap();

        assert!(matches!(
            outcome,
            DecryptionOutcome::Failed {
                kind: FailureKind::NoBackendAvailable,
                ..
            }
        ));
        assert_eq!(outcomes_of(&outcome).len(), 3);
        assert_eq!(outcome.exit_code(), 4);
    }

    #[test]
    fn exhausted_failure_keeps_attempt_order() {
        let setup = Setup::new(
            LOCKED_PDF,
            [
                Outcome::ToolError,
                Outcome::ToolMissing,
                Outcome::UnsupportedEncryption,
            ],
        );
        let outcome = setup.orchestrator.decrypt(&setup.request(None)).unwrap();

        let order: Vec<BackendId> = outcome.attempts().iter().map(|r| r.backend).collect();
        assert_eq!(order, BackendId::DEFAULT_ORDER.to_vec());
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn unencrypted_input_passes_through_without_backends() {
        let setup = Setup::new(
            PLAIN_PDF,
            [Outcome::Success, Outcome::Success, Outcome::Success],
        );
        let request = setup.request(None);
        let outcome = setup.orchestrator.decrypt(&request).unwrap();

        assert!(matches!(outcome, DecryptionOutcome::PassThrough { .. }));
        assert_eq!(setup.call_counts(), vec![0, 0, 0]);
        assert_eq!(std::fs::read(request.output()).unwrap(), PLAIN_PDF);
    }

    #[test]
    fn decrypting_a_decrypted_output_is_a_no_op_success() {
        let setup = Setup::new(
            LOCKED_PDF,
            [Outcome::Success, Outcome::Success, Outcome::Success],
        );
        let first = setup.orchestrator.decrypt(&setup.request(Some("abc"))).unwrap();
        let DecryptionOutcome::Decrypted { output, .. } = first else {
            panic!("expected first run to decrypt");
        };

        let second = setup
            .orchestrator
            .decrypt(&request_for(&output, Some("abc")))
            .unwrap();
        assert!(matches!(second, DecryptionOutcome::PassThrough { .. }));
        assert_eq!(setup.call_counts(), vec![1, 0, 0]);
    }

    #[test]
    fn in_place_pass_through_leaves_file_untouched() {
        let setup = Setup::new(
            PLAIN_PDF,
            [Outcome::Success, Outcome::Success, Outcome::Success],
        );
        let request = DecryptionRequest::new(
            setup.input.clone(),
            Some(setup.input.clone()),
            None,
            BackendId::DEFAULT_ORDER.to_vec(),
            Duration::from_secs(30),
            false,
        )
        .unwrap();
        let outcome = setup.orchestrator.decrypt(&request).unwrap();

        assert!(matches!(outcome, DecryptionOutcome::PassThrough { .. }));
        assert_eq!(std::fs::read(&setup.input).unwrap(), PLAIN_PDF);
    }

    #[test]
    fn non_pdf_input_is_rejected_before_backends() {
        let setup = Setup::new(
            b"PK\x03\x04 not a pdf",
            [Outcome::Success, Outcome::Success, Outcome::Success],
        );
        let err = setup
            .orchestrator
            .decrypt(&setup.request(None))
            .unwrap_err();

        assert!(matches!(err, DecryptPdfError::NotAPdf { .. }));
        assert_eq!(setup.call_counts(), vec![0, 0, 0]);
    }

    #[test]
    fn unregistered_backend_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("secret.pdf");
        std::fs::write(&input, LOCKED_PDF).unwrap();

        let outcome = Orchestrator::new(Vec::new())
            .decrypt(&request_for(&input, None))
            .unwrap();
        assert_eq!(outcomes_of(&outcome), vec![Outcome::ToolMissing; 3]);
    }

    /// Interrupt source the tests can trip by hand.
    #[derive(Default)]
    struct Flag(std::sync::atomic::AtomicBool);

    impl Flag {
        fn trip(&self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    impl Interrupt for Flag {
        fn is_interrupted(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Backend that fails and trips `flag`, like Ctrl-C arriving as a tool exits.
    struct FailsThenInterrupts {
        flag: Arc<Flag>,
    }

    impl DecryptBackend for FailsThenInterrupts {
        fn id(&self) -> BackendId {
            BackendId::Qpdf
        }

        fn attempt(&self, _request: &DecryptionRequest) -> Result<BackendResult> {
            self.flag.trip();
            Ok(BackendResult::new(
                BackendId::Qpdf,
                Outcome::ToolError,
                None,
                Duration::ZERO,
            ))
        }

        fn status(&self) -> Result<ToolStatus> {
            Err(DecryptPdfError::Cancelled)
        }
    }

    #[test]
    fn interrupt_before_pass_through_writes_nothing() {
        let setup = Setup::new(
            PLAIN_PDF,
            [Outcome::Success, Outcome::Success, Outcome::Success],
        );
        let flag = Arc::new(Flag::default());
        flag.trip();
        let orchestrator = setup.orchestrator.with_interrupt(flag);
        let request = request_for(&setup.input, None);

        let err = orchestrator.decrypt(&request).unwrap_err();

        assert!(matches!(err, DecryptPdfError::Cancelled));
        assert!(!request.output().exists());
    }

    #[test]
    fn interrupt_between_attempts_stops_the_cascade() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("secret.pdf");
        std::fs::write(&input, LOCKED_PDF).unwrap();

        let flag = Arc::new(Flag::default());
        let mutool_calls = Arc::new(AtomicUsize::new(0));
        let backends: Vec<Box<dyn DecryptBackend>> = vec![
            Box::new(FailsThenInterrupts {
                flag: Arc::clone(&flag),
            }),
            Box::new(Fake {
                id: BackendId::Mutool,
                outcome: Outcome::Success,
                calls: Arc::clone(&mutool_calls),
            }),
        ];
        let orchestrator = Orchestrator::new(backends).with_interrupt(flag);
        let request = request_for(&input, Some("abc"));

        let err = orchestrator.decrypt(&request).unwrap_err();

        assert!(matches!(err, DecryptPdfError::Cancelled));
        assert_eq!(mutool_calls.load(Ordering::SeqCst), 0);
        assert!(!request.output().exists());
    }

    #[test]
    fn cancellation_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("secret.pdf");
        std::fs::write(&input, LOCKED_PDF).unwrap();

        let err = Orchestrator::new(vec![Box::new(Interrupted)])
            .decrypt(&request_for(&input, None))
            .unwrap_err();
        assert!(matches!(err, DecryptPdfError::Cancelled));
    }
}
