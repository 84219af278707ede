//! Command Line Interface
//!
//! Flags fall back to `POWLINE_*` environment variables, which may come
//! from a `.env` file.

use clap::{Args, Parser, Subcommand};
use platform::tls::{ServerVerification, TlsSettings};
use pow::application::config::SolverConfig;
use pow::{Difficulty, SuffixLength, WorkerArgs};
use protocol::{ConnectTarget, ProtocolConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "client",
    version,
    about = "Proof-of-work challenge/response client",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Used when no subcommand is given
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to the peer and run the protocol (default)
    Connect(ConnectArgs),
    /// Time the solver for increasing difficulties
    Benchmark(BenchmarkArgs),
    /// Split a combined PEM bundle into certificate and key files
    ExtractPem(ExtractPemArgs),
    /// Internal: one worker process of the multi-process solver
    #[command(name = "pow-worker", hide = true)]
    PowWorker(WorkerCliArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Peer hostname or IP address
    #[arg(long, env = "POWLINE_HOST", default_value = "localhost")]
    pub host: String,

    #[arg(long, env = "POWLINE_PORT", default_value_t = 3336)]
    pub port: u16,

    /// Client certificate PEM (may also hold the key)
    #[arg(long, env = "POWLINE_CERT", value_name = "FILE")]
    pub cert: Option<PathBuf>,

    /// Client private key PEM
    #[arg(long, env = "POWLINE_KEY", value_name = "FILE")]
    pub key: Option<PathBuf>,

    /// Verify the peer against these CA certificates instead of accepting any
    #[arg(long, env = "POWLINE_CA_FILE", value_name = "FILE")]
    pub ca_file: Option<PathBuf>,

    /// Identity profile JSON
    #[arg(long, env = "POWLINE_IDENTITY", value_name = "FILE", default_value = "identity.json")]
    pub identity: PathBuf,

    /// Bound on TCP connect plus TLS handshake
    #[arg(long, env = "POWLINE_CONNECT_TIMEOUT_SECS", default_value_t = 30)]
    pub connect_timeout_secs: u64,

    /// Bound on each line read or write, 0 disables
    #[arg(long, env = "POWLINE_IO_TIMEOUT_SECS", default_value_t = 30)]
    pub io_timeout_secs: u64,

    /// Reply to HELO
    #[arg(long, env = "POWLINE_HELO_ACK", default_value = "TOAKUEI")]
    pub helo_ack: String,

    #[command(flatten)]
    pub solver: SolverArgs,
}

impl ConnectArgs {
    pub fn target(&self) -> ConnectTarget {
        ConnectTarget {
            host: self.host.clone(),
            port: self.port,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    pub fn tls_settings(&self) -> TlsSettings {
        TlsSettings {
            client_cert: self.cert.clone(),
            client_key: self.key.clone(),
            verification: self
                .ca_file
                .clone()
                .map_or(ServerVerification::Insecure, ServerVerification::CaFile),
        }
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        (self.io_timeout_secs > 0).then(|| Duration::from_secs(self.io_timeout_secs))
    }

    pub fn protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig::default()
            .with_helo_ack(self.helo_ack.clone())
            .with_pow_timeout(self.solver.timeout())
    }
}

/// Solver tuning shared by `connect` and `benchmark`
#[derive(Args, Debug, Clone)]
pub struct SolverArgs {
    /// Deadline for one proof-of-work solve
    #[arg(long, env = "POWLINE_POW_TIMEOUT_SECS", default_value_t = 14_400)]
    pub pow_timeout_secs: u64,

    /// Threads for the threaded tier [default: min(2 x CPUs, 32)]
    #[arg(long, env = "POWLINE_THREADS")]
    pub threads: Option<usize>,

    /// Processes for the multi-process tier [default: CPUs]
    #[arg(long, env = "POWLINE_PROCESSES")]
    pub processes: Option<usize>,

    /// Attempts per worker process per round
    #[arg(long, env = "POWLINE_PROCESS_BUDGET", default_value_t = 1_000_000)]
    pub process_budget: u64,

    /// Worker process rounds before the solve fails (0: until the deadline)
    #[arg(long, env = "POWLINE_PROCESS_ROUNDS", default_value_t = 1)]
    pub process_rounds: u64,
}

impl SolverArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.pow_timeout_secs)
    }

    pub fn to_config(&self) -> SolverConfig {
        SolverConfig {
            thread_count: self.threads,
            process_count: self.processes,
            process_attempt_budget: self.process_budget,
            process_rounds: (self.process_rounds > 0).then_some(self.process_rounds),
            timeout: self.timeout(),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct BenchmarkArgs {
    /// Highest difficulty to time, starting from 1
    #[arg(long, default_value_t = 6)]
    pub max_difficulty: u8,

    #[arg(long, default_value = "benchmark")]
    pub challenge: String,

    #[command(flatten)]
    pub solver: SolverArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractPemArgs {
    /// Combined PEM bundle
    #[arg(value_name = "PEM_FILE")]
    pub pem_file: PathBuf,

    /// Output prefix; writes <PREFIX>.crt and <PREFIX>.key
    #[arg(long, short, value_name = "PREFIX", default_value = "client")]
    pub output: PathBuf,

    /// Only list the blocks in the bundle
    #[arg(long)]
    pub analyze: bool,
}

#[derive(Args, Debug, Clone)]
pub struct WorkerCliArgs {
    #[arg(long)]
    pub challenge: String,

    #[arg(long)]
    pub difficulty: Difficulty,

    #[arg(long)]
    pub budget: u64,

    #[arg(long, default_value_t = 4)]
    pub min_len: usize,

    #[arg(long, default_value_t = 16)]
    pub max_len: usize,

    #[arg(long, default_value_t = 1000)]
    pub check_interval: u64,
}

impl WorkerCliArgs {
    pub fn to_worker_args(&self) -> anyhow::Result<WorkerArgs> {
        let suffix_length = SuffixLength::new(self.min_len, self.max_len).ok_or_else(|| {
            anyhow::anyhow!("invalid suffix length range {}..={}", self.min_len, self.max_len)
        })?;
        Ok(WorkerArgs {
            challenge: self.challenge.clone(),
            difficulty: self.difficulty,
            budget: self.budget,
            suffix_length,
            check_interval: self.check_interval,
        })
    }
}
