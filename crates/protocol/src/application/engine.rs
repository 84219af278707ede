//! Protocol Engine
//!
//! Drives one session: read a line, classify it, dispatch, reply. Each
//! dispatch either writes exactly one reply and continues or terminates the
//! session. Identity answers are bound to the session challenge as
//! `sha1hex(challenge ++ nonce) + " " + value`.

use crate::application::config::ProtocolConfig;
use crate::domain::command::{IdentityField, Request};
use crate::domain::identity::Identity;
use crate::domain::session::{Session, SessionOutcome};
use crate::domain::transport::LineTransport;
use crate::error::{SessionError, SessionResult};
use platform::crypto::{sha1_concat, to_hex};
use pow::{PowTask, Solver};
use std::sync::Arc;
use std::time::Instant;

/// Result of one dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Finished,
}

/// Protocol engine, generic over the proof-of-work solver
pub struct ProtocolEngine<S>
where
    S: Solver,
{
    solver: Arc<S>,
    identity: Arc<Identity>,
    config: Arc<ProtocolConfig>,
}

impl<S> ProtocolEngine<S>
where
    S: Solver + Sync,
{
    pub fn new(solver: Arc<S>, identity: Arc<Identity>, config: Arc<ProtocolConfig>) -> Self {
        Self {
            solver,
            identity,
            config,
        }
    }

    /// Run a session to termination over an established transport
    pub async fn run<T: LineTransport>(&self, transport: &mut T) -> SessionOutcome {
        let mut session = Session::new();
        session.begin();
        tracing::info!(state = %session.state(), "Session started");

        let mut outcome = SessionOutcome::Success;
        while !session.is_terminated() {
            match self.step(&mut session, transport).await {
                Ok(Step::Continue) => {}
                Ok(Step::Finished) => session.terminate(true),
                Err(e) => {
                    session.terminate(false);
                    outcome = SessionOutcome::Failure(e);
                }
            }
        }

        match &outcome {
            SessionOutcome::Success => {
                tracing::info!(state = %session.state(), "Protocol completed successfully");
            }
            SessionOutcome::Failure(e) => e.log(),
        }
        outcome
    }

    async fn step<T: LineTransport>(
        &self,
        session: &mut Session,
        transport: &mut T,
    ) -> SessionResult<Step> {
        let line = match transport.read_line().await? {
            Some(line) if !line.is_empty() => line,
            _ => return Err(SessionError::PeerClosed),
        };
        let request = Request::parse(&line)?;
        tracing::debug!(command = %request.name(), "Received command");

        self.dispatch(session, request, transport).await
    }

    async fn dispatch<T: LineTransport>(
        &self,
        session: &mut Session,
        request: Request,
        transport: &mut T,
    ) -> SessionResult<Step> {
        match request {
            Request::Helo => {
                transport.write_line(&self.config.helo_ack).await?;
                Ok(Step::Continue)
            }
            Request::Error { reason } => Err(SessionError::PeerError(reason)),
            Request::Pow {
                challenge,
                difficulty,
            } => {
                session.set_challenge(&challenge)?;
                let task = PowTask::new(challenge, difficulty, self.config.pow_timeout);

                let started = Instant::now();
                let solution = self.solver.solve(&task).await?;
                tracing::info!(
                    difficulty = %difficulty,
                    strategy = %solution.strategy,
                    attempts = solution.attempts,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Sending proof-of-work suffix"
                );

                transport.write_line(&solution.suffix).await?;
                Ok(Step::Continue)
            }
            Request::End => {
                transport.write_line(&self.config.end_ack).await?;
                Ok(Step::Finished)
            }
            Request::Query { field, nonce } => {
                let reply = self.answer(session, field, &nonce)?;
                transport.write_line(&reply).await?;
                tracing::debug!(field = %field, "Answered identity query");
                Ok(Step::Continue)
            }
        }
    }

    /// Authenticated answer; the challenge check comes before the field lookup
    fn answer(
        &self,
        session: &Session,
        field: IdentityField,
        nonce: &str,
    ) -> SessionResult<String> {
        let challenge = session.challenge_for(&field.to_string())?;
        let value = self.identity.answer(field)?;
        let digest = to_hex(&sha1_concat(&[challenge.as_bytes(), nonce.as_bytes()]));
        Ok(format!("{digest} {value}"))
    }
}
