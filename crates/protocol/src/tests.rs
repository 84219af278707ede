//! Session tests for the protocol crate
//!
//! Scripted peers drive the engine through `tokio_test::io::Builder` mocks
//! (exact byte expectations) or an in-memory duplex (when the reply is
//! random, as with a real solver).

#[cfg(test)]
mod helpers {
    use crate::application::config::ProtocolConfig;
    use crate::application::engine::ProtocolEngine;
    use crate::domain::identity::Identity;
    use chrono::NaiveDate;
    use pow::{PowError, PowResult, PowSolution, PowTask, Solver, Strategy};
    use std::sync::Arc;

    /// Returns a fixed suffix without searching
    pub struct FixedSolver;

    impl Solver for FixedSolver {
        async fn solve(&self, _task: &PowTask) -> PowResult<PowSolution> {
            Ok(PowSolution {
                suffix: "fixed".to_string(),
                attempts: 1,
                strategy: Strategy::Sequential,
            })
        }
    }

    /// Always runs out of budget
    pub struct FailingSolver;

    impl Solver for FailingSolver {
        async fn solve(&self, _task: &PowTask) -> PowResult<PowSolution> {
            Err(PowError::Exhausted { attempts: 42 })
        }
    }

    pub fn identity() -> Identity {
        Identity {
            name: "Jane Example".to_string(),
            emails: vec!["jane@example.com".to_string()],
            skype: None,
            birthdate: NaiveDate::from_ymd_opt(1991, 3, 7).unwrap(),
            country: "Freedonia".to_string(),
            address_lines: vec!["1 Main Street".to_string(), "Springfield".to_string()],
        }
    }

    pub fn engine_with<S: Solver + Sync>(solver: S) -> ProtocolEngine<S> {
        ProtocolEngine::new(
            Arc::new(solver),
            Arc::new(identity()),
            Arc::new(ProtocolConfig::default()),
        )
    }

    pub fn hashed(challenge: &str, nonce: &str, value: &str) -> String {
        let digest = platform::crypto::sha1_hex(format!("{challenge}{nonce}").as_bytes());
        format!("{digest} {value}\n")
    }
}

#[cfg(test)]
mod engine_tests {
    use super::helpers::*;
    use crate::domain::session::SessionOutcome;
    use crate::error::{ProtocolViolation, SessionError, SessionErrorKind};
    use crate::infra::transport::LineStream;
    use tokio_test::io::Builder;

    fn failure(outcome: SessionOutcome) -> SessionError {
        match outcome {
            SessionOutcome::Failure(e) => e,
            SessionOutcome::Success => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_helo_then_end() {
        let mock = Builder::new()
            .read(b"HELO\n")
            .write(b"TOAKUEI\n")
            .read(b"END\n")
            .write(b"OK\n")
            .build();
        let mut transport = LineStream::from_stream(mock);

        let outcome = engine_with(FixedSolver).run(&mut transport).await;
        assert!(outcome.is_success());
        assert!(outcome.error().is_none());
    }

    #[tokio::test]
    async fn test_full_identity_exchange() {
        let mock = Builder::new()
            .read(b"HELO\n")
            .write(b"TOAKUEI\n")
            .read(b"POW abc123 0\n")
            .write(b"fixed\n")
            .read(b"NAME n1\n")
            .write(hashed("abc123", "n1", "Jane Example").as_bytes())
            .read(b"MAILNUM n2\n")
            .write(hashed("abc123", "n2", "1").as_bytes())
            .read(b"MAIL1 n3\n")
            .write(hashed("abc123", "n3", "jane@example.com").as_bytes())
            .read(b"SKYPE n4\n")
            .write(hashed("abc123", "n4", "N/A").as_bytes())
            .read(b"BIRTHDATE n5\n")
            .write(hashed("abc123", "n5", "07.03.1991").as_bytes())
            .read(b"COUNTRY n6\n")
            .write(hashed("abc123", "n6", "Freedonia").as_bytes())
            .read(b"ADDRNUM n7\n")
            .write(hashed("abc123", "n7", "2").as_bytes())
            .read(b"ADDRLINE2 n8\n")
            .write(hashed("abc123", "n8", "Springfield").as_bytes())
            .read(b"END\n")
            .write(b"OK\n")
            .build();
        let mut transport = LineStream::from_stream(mock);

        let outcome = engine_with(FixedSolver).run(&mut transport).await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_name_reply_then_peer_hangs_up() {
        let expected = format!(
            "{} Jane Example\n",
            platform::crypto::sha1_hex(b"abc123n1")
        );
        let mock = Builder::new()
            .read(b"POW abc123 0\n")
            .write(b"fixed\n")
            .read(b"NAME n1\n")
            .write(expected.as_bytes())
            .build();
        let mut transport = LineStream::from_stream(mock);

        let err = failure(engine_with(FixedSolver).run(&mut transport).await);
        assert!(matches!(err, SessionError::PeerClosed));
    }

    #[tokio::test]
    async fn test_mail_index_out_of_range_terminates_without_reply() {
        let mock = Builder::new()
            .read(b"POW abc123 0\n")
            .write(b"fixed\n")
            .read(b"MAIL3 n1\n")
            .build();
        let mut transport = LineStream::from_stream(mock);

        let err = failure(engine_with(FixedSolver).run(&mut transport).await);
        assert_eq!(err.kind(), SessionErrorKind::Protocol);
        assert!(matches!(
            err,
            SessionError::Protocol(ProtocolViolation::IndexOutOfRange {
                index: 3,
                available: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_query_before_pow_is_violation() {
        let mock = Builder::new().read(b"HELO\n").write(b"TOAKUEI\n").read(b"NAME n1\n").build();
        let mut transport = LineStream::from_stream(mock);

        let err = failure(engine_with(FixedSolver).run(&mut transport).await);
        assert!(matches!(
            err,
            SessionError::Protocol(ProtocolViolation::ChallengeNotSet(_))
        ));
    }

    #[tokio::test]
    async fn test_second_pow_is_violation() {
        let mock = Builder::new()
            .read(b"POW abc123 0\n")
            .write(b"fixed\n")
            .read(b"POW def456 0\n")
            .build();
        let mut transport = LineStream::from_stream(mock);

        let err = failure(engine_with(FixedSolver).run(&mut transport).await);
        assert!(matches!(
            err,
            SessionError::Protocol(ProtocolViolation::ChallengeAlreadySet)
        ));
    }

    #[tokio::test]
    async fn test_peer_error_terminates_without_reply() {
        let mock = Builder::new().read(b"ERROR invalid client cert\n").build();
        let mut transport = LineStream::from_stream(mock);

        let outcome = engine_with(FixedSolver).run(&mut transport).await;
        assert_eq!(outcome.error().map(|e| e.kind()), Some(SessionErrorKind::PeerRejected));
        let err = failure(outcome);
        assert!(matches!(err, SessionError::PeerError(ref r) if r == "invalid client cert"));
    }

    #[tokio::test]
    async fn test_unknown_command_terminates() {
        let mock = Builder::new().read(b"HELO\n").write(b"TOAKUEI\n").read(b"PING\n").build();
        let mut transport = LineStream::from_stream(mock);

        let err = failure(engine_with(FixedSolver).run(&mut transport).await);
        assert!(matches!(
            err,
            SessionError::Protocol(ProtocolViolation::UnknownCommand(ref c)) if c == "PING"
        ));
    }

    #[tokio::test]
    async fn test_empty_line_is_closure() {
        let mock = Builder::new().read(b"HELO\n").write(b"TOAKUEI\n").read(b"\n").build();
        let mut transport = LineStream::from_stream(mock);

        let err = failure(engine_with(FixedSolver).run(&mut transport).await);
        assert_eq!(err.kind(), SessionErrorKind::StreamClosed);
    }

    #[tokio::test]
    async fn test_end_of_stream_is_closure() {
        let mock = Builder::new().build();
        let mut transport = LineStream::from_stream(mock);

        let err = failure(engine_with(FixedSolver).run(&mut transport).await);
        assert!(matches!(err, SessionError::PeerClosed));
    }

    #[tokio::test]
    async fn test_solver_failure_terminates_without_reply() {
        let mock = Builder::new().read(b"POW abc123 9\n").build();
        let mut transport = LineStream::from_stream(mock);

        let err = failure(engine_with(FailingSolver).run(&mut transport).await);
        assert_eq!(err.kind(), SessionErrorKind::PowFailed);
    }

    #[tokio::test]
    async fn test_invalid_difficulty_terminates() {
        let mock = Builder::new().read(b"POW abc123 -1\n").build();
        let mut transport = LineStream::from_stream(mock);

        let err = failure(engine_with(FixedSolver).run(&mut transport).await);
        assert!(matches!(
            err,
            SessionError::Protocol(ProtocolViolation::InvalidDifficulty(_))
        ));
    }
}

#[cfg(test)]
mod solver_session_tests {
    use super::helpers::*;
    use crate::domain::transport::LineTransport;
    use crate::infra::transport::LineStream;
    use pow::application::config::SolverConfig;
    use pow::{Difficulty, SequentialSolver, verify_pow};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_pow_reply_verifies() {
        let (client, server) = tokio::io::duplex(1024);
        let engine = engine_with(SequentialSolver::new(Arc::new(SolverConfig::default())));

        let session = tokio::spawn(async move {
            let mut transport = LineStream::from_stream(client);
            engine.run(&mut transport).await
        });

        let mut peer = LineStream::from_stream(server);
        peer.write_line("POW abc123 0").await.unwrap();
        let suffix = peer.read_line().await.unwrap().unwrap();
        assert!(!suffix.is_empty());
        assert!(!suffix.contains([' ', '\t', '\r', '\n']));
        assert!(verify_pow("abc123", &suffix, Difficulty::ZERO));

        peer.write_line("NAME n1").await.unwrap();
        let reply = peer.read_line().await.unwrap().unwrap();
        assert_eq!(format!("{reply}\n"), hashed("abc123", "n1", "Jane Example"));

        peer.write_line("END").await.unwrap();
        assert_eq!(peer.read_line().await.unwrap().as_deref(), Some("OK"));

        assert!(session.await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_pow_difficulty_two_over_duplex() {
        let (client, server) = tokio::io::duplex(1024);
        let engine = engine_with(SequentialSolver::new(Arc::new(SolverConfig::default())));

        let session = tokio::spawn(async move {
            let mut transport = LineStream::from_stream(client);
            engine.run(&mut transport).await
        });

        let mut peer = LineStream::from_stream(server);
        peer.write_line("POW xyz 2").await.unwrap();
        let suffix = peer.read_line().await.unwrap().unwrap();
        assert!(verify_pow("xyz", &suffix, Difficulty::new(2).unwrap()));

        // Peer hangs up
        drop(peer);
        let outcome = session.await.unwrap();
        assert!(!outcome.is_success());
    }
}
