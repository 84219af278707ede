//! Subcommand handlers

use crate::cli::{BenchmarkArgs, ConnectArgs, ExtractPemArgs, WorkerCliArgs};
use anyhow::Context;
use platform::pem;
use platform::tls::build_client_config;
use pow::application::config::logical_cpus;
use pow::{AdaptiveSolver, Difficulty, PowTask, Solver};
use protocol::{Identity, LineStream, ProtocolEngine, SessionOutcome, connect_tls};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

/// Connect, run one session, exit 0 only on `END`
pub async fn connect(args: ConnectArgs) -> anyhow::Result<ExitCode> {
    let identity = Identity::load(&args.identity)
        .with_context(|| format!("loading identity from {}", args.identity.display()))?;
    let solver = AdaptiveSolver::new(args.solver.to_config())?;
    let tls = build_client_config(&args.tls_settings())?;
    let target = args.target();

    tracing::info!(
        addr = %target.addr(),
        cpus = logical_cpus(),
        threads = solver.config().threaded_workers(),
        processes = solver.config().process_workers(),
        "Connecting"
    );

    let outcome = match connect_tls(&target, tls).await {
        Ok(stream) => {
            let mut transport = LineStream::from_stream(stream).with_io_timeout(args.io_timeout());
            let engine = ProtocolEngine::new(
                Arc::new(solver),
                Arc::new(identity),
                Arc::new(args.protocol_config()),
            );
            let outcome = engine.run(&mut transport).await;
            if let Err(e) = transport.shutdown().await {
                tracing::debug!(error = %e, "Connection did not close cleanly");
            }
            outcome
        }
        Err(e) => {
            e.log();
            SessionOutcome::Failure(e)
        }
    };

    match outcome.error() {
        None => {
            tracing::info!("Client completed successfully");
            Ok(ExitCode::SUCCESS)
        }
        Some(e) => {
            tracing::error!(kind = %e.kind(), "Client failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Time the adaptive solver for difficulties 1..=max
pub async fn benchmark(args: BenchmarkArgs) -> anyhow::Result<ExitCode> {
    let solver = AdaptiveSolver::new(args.solver.to_config())?;
    let max = Difficulty::new(args.max_difficulty)
        .with_context(|| format!("difficulty {} is out of range", args.max_difficulty))?;

    println!("Benchmarking challenge {:?} on {} CPUs", args.challenge, logical_cpus());
    for zeros in 1..=max.zeros() {
        let difficulty = Difficulty::new(zeros).context("difficulty out of range")?;
        let task = PowTask::new(args.challenge.clone(), difficulty, args.solver.timeout());
        let strategy = solver.strategy_for(difficulty).to_string();

        let started = Instant::now();
        match solver.solve(&task).await {
            Ok(solution) => println!(
                "difficulty {zeros:>2}  {strategy:<13}  {:>9.2}s  {:>12} attempts (expected {:.0})  suffix {:?}",
                started.elapsed().as_secs_f64(),
                solution.attempts,
                difficulty.expected_attempts(),
                solution.suffix
            ),
            Err(e) => println!(
                "difficulty {zeros:>2}  {strategy:<13}  {:>9.2}s  FAILED: {e}",
                started.elapsed().as_secs_f64()
            ),
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// List or split a PEM bundle
pub fn extract_pem(args: ExtractPemArgs) -> anyhow::Result<ExitCode> {
    if args.analyze {
        let content = pem::read_bundle(&args.pem_file)?;
        let summary = pem::analyze(&content);
        println!("{}:", args.pem_file.display());
        if summary.is_empty() {
            println!("  no PEM blocks found");
            return Ok(ExitCode::FAILURE);
        }
        for (kind, count) in &summary.entries {
            println!("  {count} x {}", kind.describe());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let report = pem::extract_bundle(&args.pem_file, &args.output)?;
    if let Some(path) = &report.certificate {
        println!("certificate: {}", path.display());
    }
    if let Some(path) = &report.private_key {
        println!("private key: {}", path.display());
    }
    if report.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("bundle is missing a certificate or a private key");
        Ok(ExitCode::FAILURE)
    }
}

/// Child process of the multi-process solver
pub async fn pow_worker(args: WorkerCliArgs) -> anyhow::Result<ExitCode> {
    let args = args.to_worker_args()?;
    let code = tokio::task::spawn_blocking(move || pow::application::worker::serve_stdio(&args))
        .await
        .context("worker thread panicked")?;
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
